//! Simulation engine: a synchronous fold over the bar series.
//!
//! The engine consumes aligned bars and intents (plus an optional realized
//! volatility series for option instruments) and produces the trade ledger
//! and a dense equity curve.

pub mod config;
pub mod cost_model;
pub mod equity;
pub mod overlay;
pub mod simulation;
pub mod sizing;

pub use config::{
    EngineConfig, ExecutionTiming, Instrument, OptionSettings, DEFAULT_CALL_CONTRACTS,
};
pub use cost_model::{CostModel, FeeModel};
pub use equity::EquitySeriesBuilder;
pub use overlay::OptionOverlay;
pub use simulation::{run_simulation, RunResult};
pub use sizing::AllocationPolicy;
