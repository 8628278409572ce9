//! Simulation error kinds.
//!
//! Every fatal condition is raised synchronously where it is detected and
//! propagates to the caller of the run. A failed run returns no partial
//! equity series.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// An input is outside the domain the receiving function accepts
    /// (pricing inputs, config values).
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Two series that must be aligned 1:1 have different lengths.
    #[error("length mismatch: {series} has {actual} entries, expected {expected}")]
    LengthMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Two series have equal length but disagree on the timestamp at `index`.
    #[error("{series} misaligned with bars at index {index}")]
    Misaligned { series: &'static str, index: usize },

    /// Not enough history to run (fewer than 2 bars, or warm-up longer than the data).
    #[error("insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    /// A position had to be opened while cash was already zero or negative.
    #[error("insufficient cash at bar {index}: cash = {cash:.2}")]
    InsufficientCash { index: usize, cash: f64 },

    /// Bar timestamps are not strictly increasing.
    #[error("bar dates not strictly increasing at index {index}")]
    NonMonotonic { index: usize },

    /// A bar carries a non-finite or non-positive price.
    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
