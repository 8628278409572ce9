use super::{CrossEvent, PositionMode};
use crate::domain::{Direction, IndicatorPoint, Intent};

/// Transition table for the sticky intent state.
///
/// | event | LongOnly | ShortOnly | LongShort |
/// |-------|----------|-----------|-----------|
/// | Up    | Long     | Flat      | Long      |
/// | Down  | Flat     | Short     | Short     |
/// | None  | state    | state     | state     |
pub fn transition(mode: PositionMode, state: Direction, event: CrossEvent) -> Direction {
    use CrossEvent as E;
    use Direction as D;
    use PositionMode as M;

    match (mode, event) {
        (_, E::None) => state,
        (M::LongOnly, E::Up) | (M::LongShort, E::Up) => D::Long,
        (M::ShortOnly, E::Up) | (M::LongOnly, E::Down) => D::Flat,
        (M::ShortOnly, E::Down) | (M::LongShort, E::Down) => D::Short,
    }
}

/// Streaming intent generator. Feed points in timestamp order.
#[derive(Debug, Clone)]
pub struct SignalMachine {
    mode: PositionMode,
    state: Direction,
    prev: Option<(f64, f64)>,
}

impl SignalMachine {
    pub fn new(mode: PositionMode) -> Self {
        Self {
            mode,
            state: Direction::Flat,
            prev: None,
        }
    }

    pub fn state(&self) -> Direction {
        self.state
    }

    /// Advance by one point and return the intent for it.
    ///
    /// An undefined point forces FLAT and forgets the previous pair, so no
    /// cross can be detected across a gap. The first defined point after a
    /// gap only primes the machine.
    pub fn step(&mut self, point: &IndicatorPoint) -> Direction {
        let Some(cur) = point.pair() else {
            self.state = Direction::Flat;
            self.prev = None;
            return self.state;
        };

        if let Some(prev) = self.prev {
            self.state = transition(self.mode, self.state, CrossEvent::detect(prev, cur));
        }
        self.prev = Some(cur);
        self.state
    }
}

/// Intent series for an indicator series, one per point.
pub fn generate_intents(points: &[IndicatorPoint], mode: PositionMode) -> Vec<Intent> {
    let mut machine = SignalMachine::new(mode);
    points
        .iter()
        .map(|p| Intent::new(p.date, machine.step(p)))
        .collect()
}
