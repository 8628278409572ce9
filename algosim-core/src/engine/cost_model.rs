//! Cost model: slippage and fee calculation.
//!
//! Slippage is directional: buyers pay more (higher price), sellers receive
//! less (lower price). Fees are charged per trade, either as a fixed amount or
//! in basis points of notional.

use serde::{Deserialize, Serialize};

use crate::domain::TradeSide;
use crate::error::SimError;

const BPS: f64 = 10_000.0;

/// Per-trade fee.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeeModel {
    Fixed { amount: f64 },
    Proportional { bps: f64 },
}

impl Default for FeeModel {
    fn default() -> Self {
        FeeModel::Proportional { bps: 0.0 }
    }
}

impl FeeModel {
    pub fn fee(&self, notional: f64) -> f64 {
        match *self {
            FeeModel::Fixed { amount } => amount,
            FeeModel::Proportional { bps } => notional.abs() * bps / BPS,
        }
    }

    /// Multiplier on notional that covers the proportional part of the fee.
    pub fn factor(&self) -> f64 {
        match *self {
            FeeModel::Fixed { .. } => 1.0,
            FeeModel::Proportional { bps } => 1.0 + bps / BPS,
        }
    }

    /// Cash that must be set aside up front for `legs` trades.
    pub fn fixed_reserve(&self, legs: usize) -> f64 {
        match *self {
            FeeModel::Fixed { amount } => amount * legs as f64,
            FeeModel::Proportional { .. } => 0.0,
        }
    }

    fn validate(&self) -> Result<(), SimError> {
        let (name, value) = match *self {
            FeeModel::Fixed { amount } => ("fee.amount", amount),
            FeeModel::Proportional { bps } => ("fee.bps", bps),
        };
        if !(value.is_finite() && value >= 0.0) {
            return Err(SimError::invalid(name, format!("must be >= 0, got {value}")));
        }
        Ok(())
    }
}

/// Execution friction applied to every trade.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostModel {
    pub fee: FeeModel,
    /// Slippage in basis points, applied against the trader.
    pub slippage_bps: f64,
}

impl CostModel {
    pub fn new(fee: FeeModel, slippage_bps: f64) -> Self {
        Self { fee, slippage_bps }
    }

    pub fn proportional(fee_bps: f64, slippage_bps: f64) -> Self {
        Self::new(FeeModel::Proportional { bps: fee_bps }, slippage_bps)
    }

    pub fn frictionless() -> Self {
        Self::proportional(0.0, 0.0)
    }

    /// Apply slippage to a reference price.
    ///
    /// `units` is the number of underlying units the price applies to
    /// (shares, or contracts times multiplier).
    /// Returns `(slipped_price, slippage_cost)`.
    pub fn apply_slippage(&self, raw_price: f64, side: TradeSide, units: f64) -> (f64, f64) {
        if self.slippage_bps == 0.0 {
            return (raw_price, 0.0);
        }
        let slip = self.slippage_bps / BPS;
        let slipped = match side {
            TradeSide::Buy => raw_price * (1.0 + slip),
            TradeSide::Sell => raw_price * (1.0 - slip),
        };
        (slipped, (slipped - raw_price).abs() * units)
    }

    /// Price one unit would cost (buy) or fetch (sell) after slippage.
    pub fn slipped_price(&self, raw_price: f64, side: TradeSide) -> f64 {
        self.apply_slippage(raw_price, side, 0.0).0
    }

    pub fn compute_fee(&self, notional: f64) -> f64 {
        self.fee.fee(notional)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.fee.validate()?;
        if !(self.slippage_bps.is_finite() && (0.0..BPS).contains(&self.slippage_bps)) {
            return Err(SimError::invalid(
                "slippage_bps",
                format!("must be in [0, 10000), got {}", self.slippage_bps),
            ));
        }
        Ok(())
    }
}
