//! Option contracts held by the overlay.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Call,
    Put,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Call => write!(f, "CALL"),
            OptionKind::Put => write!(f, "PUT"),
        }
    }
}

/// European option contract. Immutable once created.
///
/// Expiry is expressed as a bar index: the contract settles on the first bar
/// whose index is at or past `expiry_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub kind: OptionKind,
    pub strike: f64,
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub expiry_index: usize,
    pub multiplier: f64,
}

impl OptionContract {
    /// Remaining life in periods at bar `index` (zero once expired).
    pub fn periods_remaining(&self, index: usize) -> usize {
        self.expiry_index.saturating_sub(index)
    }

    pub fn is_expired_at(&self, index: usize) -> bool {
        index >= self.expiry_index
    }
}

/// A held quantity of one contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub contract: OptionContract,
    /// Number of contracts (fractional sizing is allowed).
    pub contracts: f64,
    /// Per-share premium paid at entry, post-slippage.
    pub entry_premium: f64,
}

impl OptionLeg {
    /// Mark-to-market value given a per-share theoretical price.
    pub fn market_value(&self, per_share_price: f64) -> f64 {
        self.contracts * self.contract.multiplier * per_share_price
    }
}
