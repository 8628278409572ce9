use serde::{Deserialize, Serialize};
use std::fmt;

use super::option::{OptionKind, OptionLeg};

/// What the run currently holds.
///
/// Stock mode moves between `Flat`, `Long` and `Short`; options mode between
/// `Flat`, `LongCall` and `ProtectivePut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HoldingState {
    #[default]
    Flat,
    Long,
    Short,
    LongCall,
    ProtectivePut,
}

impl fmt::Display for HoldingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HoldingState::Flat => "FLAT",
            HoldingState::Long => "LONG",
            HoldingState::Short => "SHORT",
            HoldingState::LongCall => "LONG_CALL",
            HoldingState::ProtectivePut => "PROTECTIVE_PUT",
        };
        f.write_str(s)
    }
}

/// The single mutable position of a run.
///
/// `quantity` is signed shares of the underlying. `option` is present only
/// while an overlay contract is active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: f64,
    pub avg_entry_price: f64,
    pub option: Option<OptionLeg>,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0 && self.option.is_none()
    }

    pub fn state(&self) -> HoldingState {
        match (&self.option, self.quantity) {
            (Some(leg), _) if leg.contract.kind == OptionKind::Put => HoldingState::ProtectivePut,
            (Some(_), _) => HoldingState::LongCall,
            (None, q) if q > 0.0 => HoldingState::Long,
            (None, q) if q < 0.0 => HoldingState::Short,
            _ => HoldingState::Flat,
        }
    }

    /// Stock leg value at `price`. Negative for a short.
    pub fn stock_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn clear(&mut self) {
        *self = Position::default();
    }
}
