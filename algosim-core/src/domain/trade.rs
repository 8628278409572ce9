//! Trade: one append-only ledger entry per position change.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn is_buy(self) -> bool {
        matches!(self, TradeSide::Buy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAsset {
    Stock,
    Call,
    Put,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeReason {
    Entry,
    Exit,
    Expiry,
    Roll,
    Liquidation,
}

macro_rules! display_upper {
    ($($ty:ty => { $($variant:ident => $text:literal),+ $(,)? }),+ $(,)?) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($text),)+
                }
            }
        })+
    };
}

display_upper! {
    TradeSide => { Buy => "BUY", Sell => "SELL" },
    TradeAsset => { Stock => "STOCK", Call => "CALL", Put => "PUT" },
    TradeReason => {
        Entry => "ENTRY",
        Exit => "EXIT",
        Expiry => "EXPIRY",
        Roll => "ROLL",
        Liquidation => "LIQUIDATION",
    },
}

/// An executed trade.
///
/// `quantity` is always positive (shares for stock, contracts for options).
/// `price` is per share after slippage; for options it is the per-share
/// premium, so `notional = quantity * multiplier * price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub index: usize,
    pub date: NaiveDate,
    pub side: TradeSide,
    pub asset: TradeAsset,
    pub quantity: f64,
    pub price: f64,
    pub notional: f64,
    pub fee: f64,
    /// Cost of slippage versus the unadjusted reference price.
    pub slippage: f64,
    pub reason: TradeReason,
}

impl Trade {
    /// Signed cash effect of the trade, fee included.
    pub fn cash_delta(&self) -> f64 {
        match self.side {
            TradeSide::Buy => -self.notional - self.fee,
            TradeSide::Sell => self.notional - self.fee,
        }
    }

    /// Fee plus slippage.
    pub fn total_cost(&self) -> f64 {
        self.fee + self.slippage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(side: TradeSide) -> Trade {
        Trade {
            index: 3,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            side,
            asset: TradeAsset::Stock,
            quantity: 10.0,
            price: 100.5,
            notional: 1005.0,
            fee: 1.0,
            slippage: 5.0,
            reason: TradeReason::Entry,
        }
    }

    #[test]
    fn cash_delta_signs() {
        assert!((trade(TradeSide::Buy).cash_delta() + 1006.0).abs() < 1e-12);
        assert!((trade(TradeSide::Sell).cash_delta() - 1004.0).abs() < 1e-12);
    }

    #[test]
    fn total_cost_sums_fee_and_slippage() {
        assert!((trade(TradeSide::Buy).total_cost() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn display_is_upper_case() {
        assert_eq!(TradeReason::Roll.to_string(), "ROLL");
        assert_eq!(TradeAsset::Put.to_string(), "PUT");
        assert_eq!(TradeSide::Sell.to_string(), "SELL");
    }
}
