//! Signal state machine: fast/slow crossovers to sticky position intents.
//!
//! A cross up is fast(t) > slow(t) with fast(t-1) <= slow(t-1); a cross down
//! is the mirror. Between cross events the previous intent persists. The
//! state is never re-derived from the plain fast/slow inequality.

mod machine;

pub use machine::{generate_intents, transition, SignalMachine};

use serde::{Deserialize, Serialize};

/// Which exposures the strategy may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PositionMode {
    #[default]
    LongOnly,
    ShortOnly,
    LongShort,
}

/// Crossover event between two consecutive defined indicator points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossEvent {
    Up,
    Down,
    None,
}

impl CrossEvent {
    /// Classify the move from `(fast_prev, slow_prev)` to `(fast, slow)`.
    pub fn detect(prev: (f64, f64), cur: (f64, f64)) -> Self {
        let (fast_prev, slow_prev) = prev;
        let (fast, slow) = cur;
        if fast > slow && fast_prev <= slow_prev {
            CrossEvent::Up
        } else if fast < slow && fast_prev >= slow_prev {
            CrossEvent::Down
        } else {
            CrossEvent::None
        }
    }
}
