//! Multi-symbol batch execution.
//!
//! Symbols run independently and in parallel with rayon. A failing symbol is
//! reported and skipped; the rest of the batch still completes. An optional
//! atomic flag stops the batch cooperatively between runs.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::BacktestConfig;
use crate::runner::{run_single_backtest, BacktestResult, RunError};

/// A symbol that did not produce a result.
#[derive(Debug)]
pub struct BatchFailure {
    pub symbol: String,
    pub error: RunError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successful runs, in the order the symbols were given.
    pub results: Vec<BacktestResult>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn was_cancelled(&self) -> bool {
        self.failures
            .iter()
            .any(|f| matches!(f.error, RunError::Cancelled))
    }
}

/// Normalize a comma-separated ticker list: trimmed, uppercased, no blanks,
/// first occurrence wins.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for s in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if !s.is_empty() && !out.contains(&s) {
            out.push(s);
        }
    }
    out
}

/// Run every symbol in `config.backtest.symbols`.
pub fn run_batch(config: &BacktestConfig, cancel: Option<&AtomicBool>) -> BatchOutcome {
    let symbols = &config.backtest.symbols;

    let outcomes: Vec<(String, Result<BacktestResult, RunError>)> = symbols
        .par_iter()
        .map(|symbol| {
            if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
                return (symbol.clone(), Err(RunError::Cancelled));
            }
            (symbol.clone(), run_single_backtest(config, symbol))
        })
        .collect();

    let mut batch = BatchOutcome::default();
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(result) => batch.results.push(result),
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "skipping symbol");
                batch.failures.push(BatchFailure { symbol, error });
            }
        }
    }

    info!(
        total = symbols.len(),
        succeeded = batch.succeeded(),
        failed = batch.failed(),
        "batch complete"
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_symbols_cleans_the_list() {
        assert_eq!(
            parse_symbols(" qqq, SPY,,aapl ,spy"),
            vec!["QQQ".to_string(), "SPY".to_string(), "AAPL".to_string()]
        );
        assert!(parse_symbols(" , ").is_empty());
    }

    #[test]
    fn cancelled_batch_runs_nothing() {
        let mut config = BacktestConfig::default();
        config.backtest.symbols = vec!["AAA".into(), "BBB".into()];
        config.data.synthetic = true;
        let cancel = AtomicBool::new(true);

        let outcome = run_batch(&config, Some(&cancel));
        assert_eq!(outcome.succeeded(), 0);
        assert_eq!(outcome.failed(), 2);
        assert!(outcome.was_cancelled());
    }
}
