//! Domain types for the simulation.

pub mod bar;
pub mod equity;
pub mod intent;
pub mod option;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use equity::EquityPoint;
pub use intent::{Direction, IndicatorPoint, Intent};
pub use option::{OptionContract, OptionKind, OptionLeg};
pub use position::{HoldingState, Position};
pub use trade::{Trade, TradeAsset, TradeReason, TradeSide};
