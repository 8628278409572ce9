//! Equity series builder: one point per processed bar, in order.

use crate::domain::{Bar, EquityPoint, Intent};
use crate::error::SimError;

#[derive(Debug, Clone)]
pub struct EquitySeriesBuilder {
    expected: usize,
    points: Vec<EquityPoint>,
}

impl EquitySeriesBuilder {
    /// Builder for a run over `bars` driven by `intents`.
    pub fn for_run(bars: &[Bar], intents: &[Intent]) -> Result<Self, SimError> {
        if bars.len() != intents.len() {
            return Err(SimError::LengthMismatch {
                series: "intents",
                expected: bars.len(),
                actual: intents.len(),
            });
        }
        Ok(Self::with_capacity(bars.len()))
    }

    pub fn with_capacity(expected: usize) -> Self {
        Self {
            expected,
            points: Vec::with_capacity(expected),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&EquityPoint> {
        self.points.last()
    }

    /// Append the next point. Its index must be the next position and its
    /// date must be later than the previous point's.
    pub fn push(&mut self, point: EquityPoint) -> Result<(), SimError> {
        let next = self.points.len();
        if point.index != next {
            return Err(SimError::NonMonotonic { index: point.index });
        }
        if let Some(last) = self.points.last() {
            if point.date <= last.date {
                return Err(SimError::NonMonotonic { index: point.index });
            }
        }
        debug_assert!(
            (point.equity - (point.cash + point.position_value)).abs() < 1e-9,
            "equity identity violated at {}: {} != {} + {}",
            point.index,
            point.equity,
            point.cash,
            point.position_value
        );
        self.points.push(point);
        Ok(())
    }

    /// The dense series. Fails if any bar was skipped.
    pub fn finish(self) -> Result<Vec<EquityPoint>, SimError> {
        if self.points.len() != self.expected {
            return Err(SimError::LengthMismatch {
                series: "equity",
                expected: self.expected,
                actual: self.points.len(),
            });
        }
        Ok(self.points)
    }
}
