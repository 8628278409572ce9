//! Artifact export: JSON manifest plus CSV equity curve and trade tape.
//!
//! All persisted manifests include a `schema_version` field. Unknown versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use algosim_core::domain::{EquityPoint, Trade};

use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Trade tape. Columns: index, date, side, asset, quantity, price, notional,
/// fee, slippage, reason.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "index", "date", "side", "asset", "quantity", "price", "notional", "fee", "slippage",
        "reason",
    ])?;
    for t in trades {
        wtr.write_record([
            t.index.to_string(),
            t.date.to_string(),
            t.side.to_string(),
            t.asset.to_string(),
            format!("{:.6}", t.quantity),
            format!("{:.6}", t.price),
            format!("{:.2}", t.notional),
            format!("{:.4}", t.fee),
            format!("{:.4}", t.slippage),
            t.reason.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Equity curve with the buy-and-hold benchmark alongside. The benchmark
/// column is left empty where no benchmark value exists.
pub fn export_equity_csv(equity: &[EquityPoint], benchmark: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "index",
        "date",
        "cash",
        "position_value",
        "equity",
        "state",
        "benchmark",
    ])?;
    for p in equity {
        wtr.write_record([
            p.index.to_string(),
            p.date.to_string(),
            format!("{:.2}", p.cash),
            format!("{:.2}", p.position_value),
            format!("{:.2}", p.equity),
            p.state.to_string(),
            benchmark
                .get(p.index)
                .map(|b| format!("{b:.2}"))
                .unwrap_or_default(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates `{symbol}_{timestamp}/` under `output_dir` containing
/// `manifest.json`, `equity.csv` and `trades.csv`. Returns the directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        result.symbol,
        chrono::Local::now().format("%Y%m%d_%H%M%S%.3f")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("manifest.json"), &export_json(result)?)?;
    write(
        &run_dir.join("equity.csv"),
        &export_equity_csv(&result.run.equity, &result.benchmark_equity)?,
    )?;
    write(&run_dir.join("trades.csv"), &export_trades_csv(&result.run.trades)?)?;

    Ok(run_dir)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}
