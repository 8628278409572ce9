//! Realized volatility: annualized sample standard deviation of log
//! close-to-close returns over a rolling window.
//!
//! The return at index i uses closes i-1 and i, so the first value is defined
//! at index `window`. Lookback: window.

use super::Indicator;
use crate::domain::Bar;
use crate::error::SimError;

#[derive(Debug, Clone)]
pub struct RealizedVolatility {
    window: usize,
    periods_per_year: f64,
    name: String,
}

impl RealizedVolatility {
    /// `window` counts returns and must be at least 2 for a sample deviation.
    pub fn new(window: usize, periods_per_year: f64) -> Result<Self, SimError> {
        if window < 2 {
            return Err(SimError::invalid(
                "volatility_window",
                format!("must be >= 2, got {window}"),
            ));
        }
        if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
            return Err(SimError::invalid(
                "periods_per_year",
                format!("must be > 0, got {periods_per_year}"),
            ));
        }
        Ok(Self {
            window,
            periods_per_year,
            name: format!("rv_{window}"),
        })
    }

    /// Compute and convert to the optional per-bar form the engine consumes.
    pub fn series(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        self.compute(bars).into_iter().map(super::defined).collect()
    }
}

impl Indicator for RealizedVolatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.window {
            return result;
        }

        let returns: Vec<f64> = bars
            .windows(2)
            .map(|w| (w[1].close / w[0].close).ln())
            .collect();

        let scale = self.periods_per_year.sqrt();
        let w = self.window as f64;
        for i in self.window..n {
            // returns[k] is the return into bar k+1
            let slice = &returns[(i - self.window)..i];
            let mean = slice.iter().sum::<f64>() / w;
            let var = slice.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (w - 1.0);
            result[i] = var.sqrt() * scale;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn constant_growth_has_zero_vol() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let bars = make_bars(&closes);
        let rv = RealizedVolatility::new(3, 252.0).unwrap();
        let result = rv.compute(&bars);
        for v in &result[..3] {
            assert!(v.is_nan());
        }
        for v in &result[3..] {
            assert_approx(*v, 0.0, 1e-9);
        }
    }

    #[test]
    fn matches_hand_computed_sample_stdev() {
        // log returns: ln(2), ln(0.5), ln(2)
        let bars = make_bars(&[1.0, 2.0, 1.0, 2.0]);
        let rv = RealizedVolatility::new(3, 1.0).unwrap();
        let result = rv.compute(&bars);
        let l = 2f64.ln();
        let mean = l / 3.0;
        let var = ((l - mean).powi(2) * 2.0 + (-l - mean).powi(2)) / 2.0;
        assert_approx(result[3], var.sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn series_maps_warmup_to_none() {
        let bars = make_bars(&[1.0, 1.1, 1.0, 1.2, 1.1]);
        let rv = RealizedVolatility::new(2, 252.0).unwrap();
        let s = rv.series(&bars);
        assert_eq!(s.len(), 5);
        assert!(s[0].is_none() && s[1].is_none());
        assert!(s[2].is_some());
        assert_eq!(rv.lookback(), 2);
    }

    #[test]
    fn rejects_bad_window() {
        assert!(RealizedVolatility::new(1, 252.0).is_err());
        assert!(RealizedVolatility::new(20, 0.0).is_err());
    }
}
