//! Indicators and the indicator-point builder.
//!
//! Indicators are pure functions: bar history in, numeric series out. They
//! are precomputed once before the simulation fold. The first `lookback()`
//! values of every series are `f64::NAN` (warm-up).
//!
//! # Look-ahead contamination guard
//! No indicator value at bar t may depend on price data from bar t+1 or
//! later. Every indicator must pass the truncated-vs-full series test.

pub mod ema;
pub mod realized_vol;
pub mod sma;

pub use ema::Ema;
pub use realized_vol::RealizedVolatility;
pub use sma::Sma;

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, IndicatorPoint};
use crate::error::SimError;

pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rv_20").
    fn name(&self) -> &str;

    /// Number of leading bars with no valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Moving-average family used for the fast/slow pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaType {
    #[default]
    Sma,
    Ema,
}

impl MaType {
    pub fn build(self, period: usize) -> Result<Box<dyn Indicator>, SimError> {
        Ok(match self {
            MaType::Sma => Box::new(Sma::new(period)?),
            MaType::Ema => Box::new(Ema::new(period)?),
        })
    }
}

/// Build the fast/slow `IndicatorPoint` series for `bars`.
///
/// Warm-up values are `None`. Fails with `InsufficientData` when the longer
/// window exceeds the number of bars.
pub fn build_indicator_points(
    bars: &[Bar],
    fast: usize,
    slow: usize,
    ma_type: MaType,
) -> Result<Vec<IndicatorPoint>, SimError> {
    let fast_ind = ma_type.build(fast)?;
    let slow_ind = ma_type.build(slow)?;

    let required = fast.max(slow);
    if bars.len() < required {
        return Err(SimError::InsufficientData {
            required,
            available: bars.len(),
        });
    }

    let fast_vals = fast_ind.compute(bars);
    let slow_vals = slow_ind.compute(bars);

    Ok(bars
        .iter()
        .zip(fast_vals.into_iter().zip(slow_vals))
        .map(|(bar, (f, s))| IndicatorPoint::new(bar.date, defined(f), defined(s)))
        .collect())
}

/// Convert a NaN warm-up value to `None`.
pub fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
