use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::HoldingState;

/// One period of the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub index: usize,
    pub date: NaiveDate,
    pub cash: f64,
    pub position_value: f64,
    /// Always `cash + position_value`.
    pub equity: f64,
    pub state: HoldingState,
}

impl EquityPoint {
    pub fn new(
        index: usize,
        date: NaiveDate,
        cash: f64,
        position_value: f64,
        state: HoldingState,
    ) -> Self {
        Self {
            index,
            date,
            cash,
            position_value,
            equity: cash + position_value,
            state,
        }
    }
}
