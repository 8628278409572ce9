//! Option overlay: turns stock intents into option contracts and values them.

use chrono::NaiveDate;

use super::config::OptionSettings;
use crate::domain::{OptionContract, OptionKind};
use crate::error::SimError;
use crate::pricing;

/// Adapter between the engine fold and the pricing model.
#[derive(Debug, Clone, Copy)]
pub struct OptionOverlay<'a> {
    settings: &'a OptionSettings,
}

impl<'a> OptionOverlay<'a> {
    pub fn new(settings: &'a OptionSettings) -> Self {
        Self { settings }
    }

    /// Strike for a new contract written at `spot`.
    pub fn strike(&self, kind: OptionKind, spot: f64) -> Result<f64, SimError> {
        let offset = self.settings.moneyness_offset;
        let raw = match kind {
            OptionKind::Call => spot * (1.0 + offset),
            OptionKind::Put => spot * (1.0 - offset),
        };
        let strike = pricing::round_strike(raw, self.settings.strike_step);
        if strike > 0.0 {
            Ok(strike)
        } else {
            Err(SimError::invalid(
                "strike",
                format!("rounds to {strike} for spot {spot}"),
            ))
        }
    }

    /// New contract entered at bar `index`, expiring `horizon` periods later.
    pub fn open_contract(
        &self,
        kind: OptionKind,
        spot: f64,
        index: usize,
        date: NaiveDate,
    ) -> Result<OptionContract, SimError> {
        Ok(OptionContract {
            kind,
            strike: self.strike(kind, spot)?,
            entry_index: index,
            entry_date: date,
            expiry_index: index + self.settings.horizon,
            multiplier: self.settings.multiplier,
        })
    }

    /// Years left on `contract` at bar `index`.
    pub fn time_to_expiry(&self, contract: &OptionContract, index: usize) -> f64 {
        contract.periods_remaining(index) as f64 / self.settings.periods_per_year
    }

    /// Volatility at a bar, falling back to the configured constant.
    /// The flag is true when the fallback was used.
    pub fn volatility(&self, estimate: Option<f64>) -> (f64, bool) {
        match estimate {
            Some(v) if v.is_finite() => (v, false),
            _ => (self.settings.fallback_volatility, true),
        }
    }

    /// Theoretical per-share price of `contract` at bar `index`.
    pub fn mark(
        &self,
        contract: &OptionContract,
        spot: f64,
        volatility: f64,
        index: usize,
    ) -> Result<f64, SimError> {
        pricing::price(
            spot,
            contract.strike,
            self.settings.risk_free_rate,
            volatility,
            self.time_to_expiry(contract, index),
            contract.kind,
        )
    }

    /// Per-share payoff at expiry.
    pub fn settle(&self, contract: &OptionContract, spot: f64) -> f64 {
        pricing::intrinsic(spot, contract.strike, contract.kind)
    }
}
