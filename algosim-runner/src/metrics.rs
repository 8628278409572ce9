//! Performance metrics: pure functions that compute run statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar
//! out. Nothing here feeds back into the simulation.

use serde::{Deserialize, Serialize};

use algosim_core::engine::RunResult;

/// Headline numbers for a buy-and-hold comparison series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub final_equity: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
}

impl BenchmarkMetrics {
    pub fn compute(equity_curve: &[f64], periods_per_year: f64) -> Option<Self> {
        if equity_curve.len() < 2 {
            return None;
        }
        Some(Self {
            final_equity: final_equity(equity_curve),
            cagr: cagr(equity_curve, periods_per_year),
            max_drawdown: max_drawdown(equity_curve),
        })
    }
}

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub final_equity: f64,
    pub total_return: f64,
    pub cagr: f64,
    /// Largest peak-to-trough decline, as a positive fraction.
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub trade_count: usize,
    /// Fees plus slippage.
    pub total_costs: f64,
    pub benchmark: Option<BenchmarkMetrics>,
}

impl PerformanceMetrics {
    pub fn compute(result: &RunResult, benchmark: Option<&[f64]>, periods_per_year: f64) -> Self {
        let equity = result.equity_values();
        Self {
            final_equity: result.final_equity,
            total_return: total_return(&equity),
            cagr: cagr(&equity, periods_per_year),
            max_drawdown: max_drawdown(&equity),
            sharpe: sharpe_ratio(&equity, periods_per_year),
            trade_count: result.trade_count(),
            total_costs: result.total_costs(),
            benchmark: benchmark.and_then(|b| BenchmarkMetrics::compute(b, periods_per_year)),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn final_equity(equity_curve: &[f64]) -> f64 {
    equity_curve.last().copied().unwrap_or(0.0)
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&initial), Some(&last)) if equity_curve.len() >= 2 && initial > 0.0 => {
            (last - initial) / initial
        }
        _ => 0.0,
    }
}

/// Compound annual growth rate: (final / initial)^(ppy / (N - 1)) - 1.
///
/// Returns 0.0 for fewer than two points or a non-positive endpoint.
pub fn cagr(equity_curve: &[f64], periods_per_year: f64) -> f64 {
    let n = equity_curve.len();
    if n < 2 || periods_per_year <= 0.0 {
        return 0.0;
    }
    let initial = equity_curve[0];
    let last = equity_curve[n - 1];
    if initial <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = (n - 1) as f64 / periods_per_year;
    (last / initial).powf(1.0 / years) - 1.0
}

/// Maximum drawdown as a positive fraction of the running peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            worst = worst.max((peak - eq) / peak);
        }
    }
    worst
}

/// Per-period simple returns. A step from a non-positive value yields 0.
pub fn period_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Annualized Sharpe ratio with a zero risk-free rate.
///
/// mean(returns) / population std(returns) × √ppy; 0.0 when the deviation
/// is zero or there are no returns.
pub fn sharpe_ratio(equity_curve: &[f64], periods_per_year: f64) -> f64 {
    let returns = period_returns(equity_curve);
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std < 1e-15 || !std.is_finite() {
        return 0.0;
    }
    mean / std * periods_per_year.sqrt()
}
