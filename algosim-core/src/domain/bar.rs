//! Bar: the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for one period.
///
/// Bars are immutable and supplied in strictly increasing date order. The
/// engine treats the sequence positionally: one simulated period per bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A bar with every price equal to `close`.
    pub fn flat(date: NaiveDate, close: f64) -> Self {
        Self::new(date, close, close, close, close, 0)
    }

    /// Prices the engine executes or marks at must be finite and positive.
    pub fn has_tradeable_prices(&self) -> bool {
        self.open.is_finite() && self.close.is_finite() && self.open > 0.0 && self.close > 0.0
    }

    /// Basic OHLC sanity: high >= low, open/close inside the range, positive
    /// prices. Any NaN fails.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            100.0,
            105.0,
            98.0,
            103.0,
            50_000,
        )
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
        assert!(sample_bar().has_tradeable_prices());
    }

    #[test]
    fn nan_bar_is_not_sane() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(!bar.is_sane());
        assert!(!bar.has_tradeable_prices());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn flat_bar_has_equal_prices() {
        let bar = Bar::flat(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 50.0);
        assert_eq!(bar.open, 50.0);
        assert_eq!(bar.close, 50.0);
        assert!(bar.is_sane());
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
