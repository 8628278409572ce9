//! Engine configuration.

use serde::{Deserialize, Serialize};

use super::cost_model::CostModel;
use super::sizing::AllocationPolicy;
use crate::domain::{Bar, Direction, HoldingState};
use crate::error::SimError;

/// What the run trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    #[default]
    Stock,
    LongCall,
    ProtectivePut,
}

/// Contracts bought per long-call entry unless sizing is configured.
pub const DEFAULT_CALL_CONTRACTS: f64 = 1.0;

impl Instrument {
    pub fn uses_options(self) -> bool {
        !matches!(self, Instrument::Stock)
    }

    /// Sizing used when none is configured. A long call buys a fixed number
    /// of contracts; spending all cash on premium would leave nothing after
    /// a worthless expiry.
    pub fn default_allocation(self) -> AllocationPolicy {
        match self {
            Instrument::LongCall => AllocationPolicy::FixedQuantity {
                quantity: DEFAULT_CALL_CONTRACTS,
            },
            Instrument::Stock | Instrument::ProtectivePut => AllocationPolicy::FullCash,
        }
    }

    /// Holding state an intent asks for. Option instruments only act on
    /// LONG intents; SHORT and FLAT both mean no overlay.
    pub fn target_state(self, direction: Direction) -> HoldingState {
        match (self, direction) {
            (_, Direction::Flat) => HoldingState::Flat,
            (Instrument::Stock, Direction::Long) => HoldingState::Long,
            (Instrument::Stock, Direction::Short) => HoldingState::Short,
            (Instrument::LongCall, Direction::Long) => HoldingState::LongCall,
            (Instrument::ProtectivePut, Direction::Long) => HoldingState::ProtectivePut,
            (_, Direction::Short) => HoldingState::Flat,
        }
    }
}

/// When an intent is acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTiming {
    /// Intent at t executes at close(t).
    #[default]
    SignalClose,
    /// Intent at t-1 executes at open(t).
    NextOpen,
    /// Intent at t-1 executes at close(t).
    NextClose,
}

impl ExecutionTiming {
    pub fn is_delayed(self) -> bool {
        !matches!(self, ExecutionTiming::SignalClose)
    }

    pub fn reference_price(self, bar: &Bar) -> f64 {
        match self {
            ExecutionTiming::NextOpen => bar.open,
            ExecutionTiming::SignalClose | ExecutionTiming::NextClose => bar.close,
        }
    }
}

/// Option overlay parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionSettings {
    /// Contract life in periods.
    pub horizon: usize,
    /// OTM offset as a fraction of spot: calls at S(1+o), puts at S(1-o).
    pub moneyness_offset: f64,
    pub multiplier: f64,
    pub risk_free_rate: f64,
    /// Used when the realized-volatility series is undefined at a bar.
    pub fallback_volatility: f64,
    /// Strike rounding step; 0 disables rounding.
    pub strike_step: f64,
    pub periods_per_year: f64,
}

impl Default for OptionSettings {
    fn default() -> Self {
        Self {
            horizon: 30,
            moneyness_offset: 0.0,
            multiplier: 100.0,
            risk_free_rate: 0.0,
            fallback_volatility: 0.20,
            strike_step: 1.0,
            periods_per_year: 252.0,
        }
    }
}

impl OptionSettings {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.horizon == 0 {
            return Err(SimError::invalid("options.horizon", "must be >= 1"));
        }
        if !(self.moneyness_offset.is_finite() && (0.0..1.0).contains(&self.moneyness_offset)) {
            return Err(SimError::invalid(
                "options.moneyness_offset",
                format!("must be in [0, 1), got {}", self.moneyness_offset),
            ));
        }
        positive("options.multiplier", self.multiplier)?;
        positive("options.periods_per_year", self.periods_per_year)?;
        if !self.risk_free_rate.is_finite() {
            return Err(SimError::invalid("options.risk_free_rate", "must be finite"));
        }
        if !(self.fallback_volatility.is_finite() && self.fallback_volatility >= 0.0) {
            return Err(SimError::invalid(
                "options.fallback_volatility",
                format!("must be >= 0, got {}", self.fallback_volatility),
            ));
        }
        if !(self.strike_step.is_finite() && self.strike_step >= 0.0) {
            return Err(SimError::invalid(
                "options.strike_step",
                format!("must be >= 0, got {}", self.strike_step),
            ));
        }
        Ok(())
    }
}

/// Configuration for a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_cash: f64,
    pub instrument: Instrument,
    pub costs: CostModel,
    pub allocation: AllocationPolicy,
    pub timing: ExecutionTiming,
    pub options: OptionSettings,
    /// Close any open position on the last bar.
    pub liquidate_at_end: bool,
}

impl EngineConfig {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            instrument: Instrument::Stock,
            costs: CostModel::frictionless(),
            allocation: AllocationPolicy::FullCash,
            timing: ExecutionTiming::SignalClose,
            options: OptionSettings::default(),
            liquidate_at_end: false,
        }
    }

    /// Also resets `allocation` to the instrument's default.
    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instrument = instrument;
        self.allocation = instrument.default_allocation();
        self
    }

    pub fn with_costs(mut self, costs: CostModel) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_timing(mut self, timing: ExecutionTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        positive("initial_cash", self.initial_cash)?;
        self.costs.validate()?;
        self.allocation.validate()?;
        if self.instrument.uses_options() {
            self.options.validate()?;
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(10_000.0)
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(name, format!("must be > 0, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn option_instruments_ignore_short_intents() {
        assert_eq!(
            Instrument::LongCall.target_state(Direction::Short),
            HoldingState::Flat
        );
        assert_eq!(
            Instrument::ProtectivePut.target_state(Direction::Long),
            HoldingState::ProtectivePut
        );
        assert_eq!(
            Instrument::Stock.target_state(Direction::Short),
            HoldingState::Short
        );
    }

    #[test]
    fn reference_price_follows_timing() {
        let bar = Bar::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 10.0, 12.0, 9.0, 11.0, 0);
        assert_eq!(ExecutionTiming::NextOpen.reference_price(&bar), 10.0);
        assert_eq!(ExecutionTiming::SignalClose.reference_price(&bar), 11.0);
        assert_eq!(ExecutionTiming::NextClose.reference_price(&bar), 11.0);
        assert!(!ExecutionTiming::SignalClose.is_delayed());
    }

    #[test]
    fn validate_rejects_non_positive_cash() {
        assert!(EngineConfig::new(0.0).validate().is_err());
        assert!(EngineConfig::new(-5.0).validate().is_err());
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn option_settings_only_checked_for_option_runs() {
        let mut cfg = EngineConfig::default();
        cfg.options.horizon = 0;
        assert!(cfg.validate().is_ok());
        let cfg = cfg.with_instrument(Instrument::LongCall);
        assert!(matches!(
            cfg.validate(),
            Err(SimError::InvalidParameter { name: "options.horizon", .. })
        ));
    }

    #[test]
    fn long_call_defaults_to_fixed_contracts() {
        let cfg = EngineConfig::new(10_000.0).with_instrument(Instrument::LongCall);
        assert_eq!(
            cfg.allocation,
            AllocationPolicy::FixedQuantity {
                quantity: DEFAULT_CALL_CONTRACTS
            }
        );
        let cfg = cfg.with_instrument(Instrument::ProtectivePut);
        assert_eq!(cfg.allocation, AllocationPolicy::FullCash);
    }
}
