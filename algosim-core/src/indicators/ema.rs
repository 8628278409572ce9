//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1]
//! Seed: EMA[period-1] = SMA of first `period` close values.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;
use crate::error::SimError;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, SimError> {
        if period == 0 {
            return Err(SimError::invalid("ema period", "must be >= 1"));
        }
        Ok(Self {
            period,
            name: format!("ema_{period}"),
        })
    }

    fn alpha(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        let seed = bars[..self.period].iter().map(|b| b.close).sum::<f64>() / self.period as f64;
        if seed.is_nan() {
            return result;
        }
        result[self.period - 1] = seed;

        let alpha = self.alpha();
        let mut prev = seed;
        for i in self.period..n {
            let close = bars[i].close;
            if close.is_nan() {
                // tainted from here on
                return result;
            }
            prev = alpha * close + (1.0 - alpha) * prev;
            result[i] = prev;
        }

        result
    }
}
