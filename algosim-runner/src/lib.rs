//! AlgoSim Runner: backtest orchestration on top of `algosim-core`.
//!
//! This crate provides:
//! - TOML configuration with defaults and validation
//! - CSV data loading with a deterministic synthetic fallback
//! - Single-backtest runner (indicators → intents → simulation → metrics)
//! - Buy-and-hold benchmark and performance metrics
//! - Parallel multi-symbol batches and parameter sweeps
//! - JSON/CSV artifact export

pub mod batch;
pub mod benchmark;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use batch::{parse_symbols, run_batch, BatchFailure, BatchOutcome};
pub use benchmark::buy_and_hold_equity;
pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{load_bars, DataSource, LoadError, LoadOptions, LoadedData};
pub use export::{load_artifacts, save_artifacts};
pub use metrics::{BenchmarkMetrics, PerformanceMetrics};
pub use runner::{
    run_backtest_from_data, run_single_backtest, BacktestResult, RunError, SCHEMA_VERSION,
};
pub use sweep::{run_sweep, ParamGrid, SweepResults};
