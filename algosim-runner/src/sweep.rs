//! Parameter sweep over moving-average windows.
//!
//! One dataset is loaded once and every (fast, slow) pair with fast < slow
//! runs against it in parallel. Results are ranked by Sharpe ratio.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::BacktestConfig;
use crate::data_loader::LoadedData;
use crate::runner::{run_backtest_from_data, BacktestResult, RunError};

/// Window grid to sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub fast_periods: Vec<usize>,
    pub slow_periods: Vec<usize>,
}

impl ParamGrid {
    pub fn new(fast_periods: Vec<usize>, slow_periods: Vec<usize>) -> Self {
        Self {
            fast_periods,
            slow_periods,
        }
    }

    /// Fast 5..=30 step 5 against slow 20..=200 step 20.
    pub fn ma_crossover_default() -> Self {
        Self::new(
            (5..=30).step_by(5).collect(),
            (20..=200).step_by(20).collect(),
        )
    }

    /// Valid (fast, slow) pairs, in grid order. Pairs with fast >= slow are skipped.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for &fast in &self.fast_periods {
            for &slow in &self.slow_periods {
                if fast > 0 && fast < slow {
                    out.push((fast, slow));
                }
            }
        }
        out
    }

    pub fn size(&self) -> usize {
        self.pairs().len()
    }

    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        self.pairs()
            .into_iter()
            .map(|(fast, slow)| {
                let mut config = base.clone();
                config.signal.fast = fast;
                config.signal.slow = slow;
                config
            })
            .collect()
    }
}

/// Parse `"5,10,20"` or an inclusive range with step `"10..50:10"`.
pub fn parse_periods(raw: &str) -> Option<Vec<usize>> {
    let raw = raw.trim();
    if let Some((range, step)) = raw.split_once(':') {
        let (lo, hi) = range.split_once("..")?;
        let (lo, hi, step) = (
            lo.trim().parse::<usize>().ok()?,
            hi.trim().parse::<usize>().ok()?,
            step.trim().parse::<usize>().ok()?,
        );
        if step == 0 || lo > hi {
            return None;
        }
        return Some((lo..=hi).step_by(step).collect());
    }
    raw.split(',')
        .map(|p| p.trim().parse::<usize>().ok())
        .collect::<Option<Vec<_>>>()
        .filter(|v| !v.is_empty())
}

/// Results from a sweep, best Sharpe first.
#[derive(Debug, Default)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
    /// Pairs that failed, e.g. a slow window longer than the data.
    pub skipped: Vec<((usize, usize), RunError)>,
}

impl SweepResults {
    fn new(mut results: Vec<BacktestResult>, skipped: Vec<((usize, usize), RunError)>) -> Self {
        results.sort_by(|a, b| {
            b.metrics
                .sharpe
                .partial_cmp(&a.metrics.sharpe)
                .unwrap_or(CmpOrdering::Equal)
                .then(a.config.signal.fast.cmp(&b.config.signal.fast))
                .then(a.config.signal.slow.cmp(&b.config.signal.slow))
        });
        Self { results, skipped }
    }

    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn best(&self) -> Option<&BacktestResult> {
        self.results.first()
    }

    pub fn top(&self, n: usize) -> &[BacktestResult] {
        &self.results[..n.min(self.results.len())]
    }
}

/// Run every grid pair against `data`.
pub fn run_sweep(
    grid: &ParamGrid,
    base: &BacktestConfig,
    data: &LoadedData,
    cancel: Option<&AtomicBool>,
) -> SweepResults {
    let configs = grid.generate_configs(base);
    let total = configs.len();

    let outcomes: Vec<((usize, usize), Result<BacktestResult, RunError>)> = configs
        .par_iter()
        .map(|config| {
            let key = (config.signal.fast, config.signal.slow);
            if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                return (key, Err(RunError::Cancelled));
            }
            (key, run_backtest_from_data(config, data))
        })
        .collect();

    let mut results = Vec::with_capacity(total);
    let mut skipped = Vec::new();
    for (key, outcome) in outcomes {
        match outcome {
            Ok(r) => results.push(r),
            Err(e) => {
                warn!(fast = key.0, slow = key.1, error = %e, "sweep point skipped");
                skipped.push((key, e));
            }
        }
    }

    info!(
        symbol = %data.symbol,
        total,
        completed = results.len(),
        "sweep complete"
    );
    SweepResults::new(results, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_skip_invalid_combinations() {
        let grid = ParamGrid::new(vec![10, 20, 50], vec![20, 50]);
        assert_eq!(grid.pairs(), vec![(10, 20), (10, 50), (20, 50)]);
        assert_eq!(grid.size(), 3);
    }

    #[test]
    fn default_grid_is_non_empty() {
        let grid = ParamGrid::ma_crossover_default();
        assert!(grid.pairs().iter().all(|(f, s)| f < s));
        // slow = 20 only admits fast 5, 10, 15
        assert_eq!(grid.size(), 3 + 6 * 9);
    }

    #[test]
    fn generate_configs_sets_windows() {
        let grid = ParamGrid::new(vec![5], vec![15, 30]);
        let configs = grid.generate_configs(&BacktestConfig::default());
        assert_eq!(configs.len(), 2);
        assert_eq!((configs[1].signal.fast, configs[1].signal.slow), (5, 30));
    }

    #[test]
    fn parse_periods_forms() {
        assert_eq!(parse_periods("5, 10,20"), Some(vec![5, 10, 20]));
        assert_eq!(parse_periods("10..50:20"), Some(vec![10, 30, 50]));
        assert_eq!(parse_periods("10..50:0"), None);
        assert_eq!(parse_periods("a,b"), None);
        assert_eq!(parse_periods(""), None);
    }
}
