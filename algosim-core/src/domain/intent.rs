//! Signal-side inputs and outputs: indicator points and position intents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Desired position direction for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
    #[default]
    Flat,
}

impl Direction {
    pub fn is_flat(self) -> bool {
        matches!(self, Direction::Flat)
    }

    /// Sign of the exposure: +1 long, -1 short, 0 flat.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
            Direction::Flat => 0.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
            Direction::Flat => write!(f, "FLAT"),
        }
    }
}

/// Intent for one timestamp, aligned 1:1 with the bar series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub date: NaiveDate,
    pub direction: Direction,
}

impl Intent {
    pub fn new(date: NaiveDate, direction: Direction) -> Self {
        Self { date, direction }
    }

    pub fn flat(date: NaiveDate) -> Self {
        Self::new(date, Direction::Flat)
    }
}

/// Fast/slow indicator pair for one timestamp. `None` until warm-up completes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub fast: Option<f64>,
    pub slow: Option<f64>,
}

impl IndicatorPoint {
    pub fn new(date: NaiveDate, fast: Option<f64>, slow: Option<f64>) -> Self {
        Self { date, fast, slow }
    }

    /// Both values, if both are defined and finite.
    pub fn pair(&self) -> Option<(f64, f64)> {
        match (self.fast, self.slow) {
            (Some(f), Some(s)) if f.is_finite() && s.is_finite() => Some((f, s)),
            _ => None,
        }
    }
}
