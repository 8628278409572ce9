//! Backtest runner: wires together data loading, indicators, the signal
//! machine, the simulation and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads data for one symbol, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded bars. Used by sweeps, which
//!   reuse one dataset across many parameter sets.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use algosim_core::domain::Bar;
use algosim_core::engine::{run_simulation, RunResult};
use algosim_core::indicators::{build_indicator_points, RealizedVolatility};
use algosim_core::signal::generate_intents;
use algosim_core::SimError;

use crate::benchmark::buy_and_hold_equity;
use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_bars, LoadError, LoadOptions, LoadedData};
use crate::metrics::PerformanceMetrics;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimError),
    #[error("cancelled")]
    Cancelled,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub metrics: PerformanceMetrics,
    #[serde(flatten)]
    pub run: RunResult,
    /// Buy-and-hold equity aligned with `run.equity`.
    pub benchmark_equity: Vec<f64>,
    pub start_date: String,
    pub end_date: String,
    pub bar_count: usize,
    pub dataset_hash: String,
    pub synthetic: bool,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn initial_cash(&self) -> f64 {
        self.config.backtest.initial_cash
    }
}

pub fn load_options(config: &BacktestConfig) -> LoadOptions {
    LoadOptions {
        data_dir: config.data.data_dir.clone(),
        start: config.backtest.start,
        end: config.backtest.end,
        synthetic: config.data.synthetic,
    }
}

/// Load bars for `symbol` and run the backtest described by `config`.
pub fn run_single_backtest(
    config: &BacktestConfig,
    symbol: &str,
) -> Result<BacktestResult, RunError> {
    let loaded = load_bars(symbol, &load_options(config))?;
    run_backtest_from_data(config, &loaded)
}

/// Run a backtest on pre-loaded data without I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    data: &LoadedData,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let bars = &data.bars;
    let config = config.for_symbol(&data.symbol);
    let run = simulate(&config, bars)?;

    let ppy = config.options.settings.periods_per_year;
    let benchmark_equity = buy_and_hold_equity(bars, config.backtest.initial_cash);
    let metrics = PerformanceMetrics::compute(&run, Some(benchmark_equity.as_slice()), ppy);

    info!(
        symbol = %data.symbol,
        instrument = ?config.backtest.instrument,
        fast = config.signal.fast,
        slow = config.signal.slow,
        bars = bars.len(),
        trades = metrics.trade_count,
        final_equity = metrics.final_equity,
        sharpe = metrics.sharpe,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        symbol: data.symbol.clone(),
        run_id: config.run_id(),
        metrics,
        run,
        benchmark_equity,
        start_date: bars.first().map(|b| b.date.to_string()).unwrap_or_default(),
        end_date: bars.last().map(|b| b.date.to_string()).unwrap_or_default(),
        bar_count: bars.len(),
        dataset_hash: data.dataset_hash.clone(),
        synthetic: data.synthetic,
        config,
    })
}

/// Indicators → intents → realized volatility → simulation fold.
pub fn simulate(config: &BacktestConfig, bars: &[Bar]) -> Result<RunResult, RunError> {
    let signal = &config.signal;
    let points = build_indicator_points(bars, signal.fast, signal.slow, signal.ma_type)?;
    let intents = generate_intents(&points, config.effective_position_mode());

    let engine = config.to_engine_config();
    let volatility = if engine.instrument.uses_options() {
        let rv = RealizedVolatility::new(
            config.options.volatility_window,
            config.options.settings.periods_per_year,
        )?;
        Some(rv.series(bars))
    } else {
        None
    };

    Ok(run_simulation(bars, &intents, volatility.as_deref(), &engine)?)
}
