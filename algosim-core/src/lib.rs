//! AlgoSim Core: the event-driven backtest simulation.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (bars, intents, positions, option contracts, trades, equity points)
//! - Indicators (SMA, EMA, realized volatility) and the indicator-point builder
//! - The sticky crossover signal state machine
//! - Closed-form European option pricing
//! - The simulation fold with its option overlay and equity series builder

pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod pricing;
pub mod signal;

pub use error::SimError;
