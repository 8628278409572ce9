//! Capital allocation: how much quantity an entry buys.

use serde::{Deserialize, Serialize};

use super::cost_model::FeeModel;
use crate::error::SimError;

/// Relative haircut on every sized quantity. Fill arithmetic multiplies in a
/// different order than sizing divides, and the last few ulps must never
/// take cash below zero.
const ROUNDING_HAIRCUT: f64 = 1e-12;

/// Position sizing policy. Every policy is capped so that notional plus fees
/// never exceeds available cash.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// Spend all available cash.
    #[default]
    FullCash,
    /// Spend a fraction of available cash.
    FractionOfCash { fraction: f64 },
    /// Fixed quantity: shares for stock, contracts for a long call, hedged
    /// shares for a protective put.
    FixedQuantity { quantity: f64 },
}

impl AllocationPolicy {
    /// Quantity to open given the cash on hand.
    ///
    /// `unit_cost` is the slipped cost of one unit before fees. `legs` is
    /// the number of trades the entry needs, for reserving fixed fees.
    pub fn quantity(&self, cash: f64, unit_cost: f64, fee: &FeeModel, legs: usize) -> f64 {
        if cash <= 0.0 || unit_cost <= 0.0 || !unit_cost.is_finite() {
            return 0.0;
        }
        let affordable = |budget: f64| {
            let units = (budget - fee.fixed_reserve(legs)) / (unit_cost * fee.factor());
            (units * (1.0 - ROUNDING_HAIRCUT)).max(0.0)
        };

        match *self {
            AllocationPolicy::FullCash => affordable(cash),
            AllocationPolicy::FractionOfCash { fraction } => affordable(cash * fraction),
            AllocationPolicy::FixedQuantity { quantity } => quantity.min(affordable(cash)),
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        match *self {
            AllocationPolicy::FullCash => Ok(()),
            AllocationPolicy::FractionOfCash { fraction } => {
                if fraction.is_finite() && fraction > 0.0 && fraction <= 1.0 {
                    Ok(())
                } else {
                    Err(SimError::invalid(
                        "sizing.fraction",
                        format!("must be in (0, 1], got {fraction}"),
                    ))
                }
            }
            AllocationPolicy::FixedQuantity { quantity } => {
                if quantity.is_finite() && quantity > 0.0 {
                    Ok(())
                } else {
                    Err(SimError::invalid(
                        "sizing.quantity",
                        format!("must be > 0, got {quantity}"),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_FEE: FeeModel = FeeModel::Proportional { bps: 0.0 };

    #[test]
    fn full_cash_buys_everything() {
        let q = AllocationPolicy::FullCash.quantity(10_000.0, 100.0, &NO_FEE, 1);
        assert!((q - 100.0).abs() < 1e-9);
        assert!(q * 100.0 <= 10_000.0);
    }

    #[test]
    fn proportional_fee_is_covered() {
        let fee = FeeModel::Proportional { bps: 100.0 };
        let q = AllocationPolicy::FullCash.quantity(10_100.0, 100.0, &fee, 1);
        let spend = q * 100.0 + fee.fee(q * 100.0);
        assert!((spend - 10_100.0).abs() < 1e-6);
        assert!(spend <= 10_100.0);
    }

    #[test]
    fn fixed_fee_reserved_per_leg() {
        let fee = FeeModel::Fixed { amount: 5.0 };
        let q = AllocationPolicy::FullCash.quantity(110.0, 10.0, &fee, 2);
        assert!((q - 10.0).abs() < 1e-9);
    }

    #[test]
    fn fraction_of_cash() {
        let policy = AllocationPolicy::FractionOfCash { fraction: 0.5 };
        let q = policy.quantity(1_000.0, 10.0, &NO_FEE, 1);
        assert!((q - 50.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_quantity_is_capped_by_cash() {
        let policy = AllocationPolicy::FixedQuantity { quantity: 3.0 };
        assert_eq!(policy.quantity(1_000.0, 100.0, &NO_FEE, 1), 3.0);
        let capped = policy.quantity(250.0, 100.0, &NO_FEE, 1);
        assert!((capped - 2.5).abs() < 1e-9);
    }

    #[test]
    fn no_cash_no_quantity() {
        assert_eq!(AllocationPolicy::FullCash.quantity(0.0, 10.0, &NO_FEE, 1), 0.0);
        let fee = FeeModel::Fixed { amount: 50.0 };
        assert_eq!(AllocationPolicy::FullCash.quantity(40.0, 10.0, &fee, 1), 0.0);
    }

    #[test]
    fn full_cash_spend_never_exceeds_cash() {
        let fee = FeeModel::Proportional { bps: 2.0 };
        for i in 0..2_000 {
            let cash = 1_000.0 + i as f64 * 37.13;
            let unit = 10.0 + (i % 97) as f64 * 1.37 * (1.0 + 3.0 / 10_000.0);
            let q = AllocationPolicy::FullCash.quantity(cash, unit, &fee, 1);
            let notional = q * unit;
            assert!(
                cash - (notional + fee.fee(notional)) >= 0.0,
                "cash {cash} unit {unit} overspent"
            );
        }
    }

    #[test]
    fn validate_ranges() {
        assert!(AllocationPolicy::FractionOfCash { fraction: 0.0 }.validate().is_err());
        assert!(AllocationPolicy::FractionOfCash { fraction: 1.5 }.validate().is_err());
        assert!(AllocationPolicy::FixedQuantity { quantity: -1.0 }.validate().is_err());
        assert!(AllocationPolicy::FullCash.validate().is_ok());
    }
}
