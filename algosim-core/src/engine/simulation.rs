//! The simulation fold.
//!
//! Per bar, strictly in order:
//! 1. settle an option contract that has reached expiry (intrinsic value, no
//!    fee or slippage; a protective put's stock leg closes with it)
//! 2. compare the effective intent with the holding state and trade
//! 3. on the last bar, liquidate if configured
//! 4. mark to market at the close and record the equity point

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::{EngineConfig, ExecutionTiming};
use super::equity::EquitySeriesBuilder;
use super::overlay::OptionOverlay;
use crate::domain::{
    Bar, Direction, EquityPoint, HoldingState, Intent, OptionKind, OptionLeg, Position, Trade,
    TradeAsset, TradeReason, TradeSide,
};
use crate::error::SimError;

/// Quantities below this are treated as zero; no trade is emitted.
const MIN_QUANTITY: f64 = 1e-9;

/// Calls priced below this per share are not bought; the entry is skipped.
const MIN_PREMIUM: f64 = 0.01;

/// Output of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub trades: Vec<Trade>,
    pub equity: Vec<EquityPoint>,
    pub final_equity: f64,
    pub total_fees: f64,
    pub total_slippage: f64,
    pub final_state: HoldingState,
}

impl RunResult {
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity.iter().map(|p| p.equity).collect()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn total_costs(&self) -> f64 {
        self.total_fees + self.total_slippage
    }
}

/// Run one simulation.
///
/// `volatility` is the realized-volatility estimate per bar, aligned with
/// `bars`; it is only consulted by option instruments. Any error aborts the
/// run and no partial series is returned.
pub fn run_simulation(
    bars: &[Bar],
    intents: &[Intent],
    volatility: Option<&[Option<f64>]>,
    config: &EngineConfig,
) -> Result<RunResult, SimError> {
    config.validate()?;
    validate_inputs(bars, intents, volatility)?;

    let mut builder = EquitySeriesBuilder::for_run(bars, intents)?;
    let mut sim = Simulation::new(config, volatility);
    let last = bars.len() - 1;

    for (t, bar) in bars.iter().enumerate() {
        let exec_price = config.timing.reference_price(bar);
        // An open execution only knows volatility up to the previous close.
        let vol_index = if config.timing == ExecutionTiming::NextOpen {
            t.saturating_sub(1)
        } else {
            t
        };

        let expired = sim.settle_expiry(t, bar.date, exec_price);

        let direction = effective_direction(config, intents, t);
        let target = config.instrument.target_state(direction);
        if target != sim.position.state() {
            if !sim.position.is_flat() {
                sim.close_all(t, bar.date, exec_price, vol_index, TradeReason::Exit)?;
            }
            let reason = if expired {
                TradeReason::Roll
            } else {
                TradeReason::Entry
            };
            sim.open(t, bar.date, target, exec_price, vol_index, reason)?;
        }

        if t == last && config.liquidate_at_end && !sim.position.is_flat() {
            sim.close_all(t, bar.date, bar.close, t, TradeReason::Liquidation)?;
        }

        builder.push(sim.mark(t, bar)?)?;
    }

    let equity = builder.finish()?;
    let final_equity = equity.last().map_or(config.initial_cash, |p| p.equity);
    Ok(RunResult {
        trades: sim.trades,
        equity,
        final_equity,
        total_fees: sim.total_fees,
        total_slippage: sim.total_slippage,
        final_state: sim.position.state(),
    })
}

/// Intent acted on at bar `t`. Nothing can be held before the first bar.
fn effective_direction(config: &EngineConfig, intents: &[Intent], t: usize) -> Direction {
    if t == 0 {
        Direction::Flat
    } else if config.timing.is_delayed() {
        intents[t - 1].direction
    } else {
        intents[t].direction
    }
}

fn validate_inputs(
    bars: &[Bar],
    intents: &[Intent],
    volatility: Option<&[Option<f64>]>,
) -> Result<(), SimError> {
    if bars.len() < 2 {
        return Err(SimError::InsufficientData {
            required: 2,
            available: bars.len(),
        });
    }
    for (i, bar) in bars.iter().enumerate() {
        if !bar.has_tradeable_prices() {
            return Err(SimError::InvalidBar {
                index: i,
                reason: format!("open={} close={}", bar.open, bar.close),
            });
        }
        if i > 0 && bar.date <= bars[i - 1].date {
            return Err(SimError::NonMonotonic { index: i });
        }
    }
    if intents.len() != bars.len() {
        return Err(SimError::LengthMismatch {
            series: "intents",
            expected: bars.len(),
            actual: intents.len(),
        });
    }
    if let Some(i) = bars.iter().zip(intents).position(|(b, it)| b.date != it.date) {
        return Err(SimError::Misaligned {
            series: "intents",
            index: i,
        });
    }
    if let Some(vol) = volatility {
        if vol.len() != bars.len() {
            return Err(SimError::LengthMismatch {
                series: "volatility",
                expected: bars.len(),
                actual: vol.len(),
            });
        }
    }
    Ok(())
}

/// Mutable run state. Owned by the fold and never shared.
struct Simulation<'a> {
    config: &'a EngineConfig,
    overlay: OptionOverlay<'a>,
    volatility: Option<&'a [Option<f64>]>,
    cash: f64,
    position: Position,
    trades: Vec<Trade>,
    total_fees: f64,
    total_slippage: f64,
    fallback_warned: bool,
}

struct Fill {
    side: TradeSide,
    asset: TradeAsset,
    quantity: f64,
    raw_price: f64,
    multiplier: f64,
    reason: TradeReason,
}

impl<'a> Simulation<'a> {
    fn new(config: &'a EngineConfig, volatility: Option<&'a [Option<f64>]>) -> Self {
        Self {
            config,
            overlay: OptionOverlay::new(&config.options),
            volatility,
            cash: config.initial_cash,
            position: Position::default(),
            trades: Vec::new(),
            total_fees: 0.0,
            total_slippage: 0.0,
            fallback_warned: false,
        }
    }

    /// Volatility known at the close of bar `t`.
    fn volatility_at(&mut self, t: usize) -> f64 {
        let estimate = self.volatility.and_then(|v| v[t]);
        let (vol, fallback) = self.overlay.volatility(estimate);
        if fallback && !self.fallback_warned {
            warn!(
                index = t,
                fallback = vol,
                "realized volatility undefined, using fallback"
            );
            self.fallback_warned = true;
        }
        vol
    }

    fn execute(&mut self, index: usize, date: NaiveDate, fill: Fill, with_costs: bool) -> Trade {
        let units = fill.quantity * fill.multiplier;
        let (price, slippage) = if with_costs {
            self.config
                .costs
                .apply_slippage(fill.raw_price, fill.side, units)
        } else {
            (fill.raw_price, 0.0)
        };
        let notional = units * price;
        let fee = if with_costs {
            self.config.costs.compute_fee(notional)
        } else {
            0.0
        };

        let trade = Trade {
            index,
            date,
            side: fill.side,
            asset: fill.asset,
            quantity: fill.quantity,
            price,
            notional,
            fee,
            slippage,
            reason: fill.reason,
        };
        self.cash += trade.cash_delta();
        self.total_fees += fee;
        self.total_slippage += slippage;
        debug!(
            index,
            side = %trade.side,
            asset = %trade.asset,
            quantity = trade.quantity,
            price = trade.price,
            fee = trade.fee,
            reason = %trade.reason,
            cash = self.cash,
            "trade"
        );
        self.trades.push(trade.clone());
        trade
    }

    /// Settle a contract at or past expiry. Returns true if one settled.
    fn settle_expiry(&mut self, t: usize, date: NaiveDate, spot: f64) -> bool {
        let expired = matches!(&self.position.option, Some(leg) if leg.contract.is_expired_at(t));
        if !expired {
            return false;
        }
        let Some(leg) = self.position.option.take() else {
            return false;
        };

        let payoff = self.overlay.settle(&leg.contract, spot);
        debug!(
            index = t,
            kind = %leg.contract.kind,
            strike = leg.contract.strike,
            payoff,
            "option expired"
        );
        self.execute(
            t,
            date,
            Fill {
                side: TradeSide::Sell,
                asset: option_asset(leg.contract.kind),
                quantity: leg.contracts,
                raw_price: payoff,
                multiplier: leg.contract.multiplier,
                reason: TradeReason::Expiry,
            },
            false,
        );
        self.close_stock(t, date, spot, TradeReason::Expiry);
        self.position.clear();
        true
    }

    fn close_stock(&mut self, t: usize, date: NaiveDate, price: f64, reason: TradeReason) {
        let qty = self.position.quantity;
        if qty.abs() < MIN_QUANTITY {
            return;
        }
        let side = if qty > 0.0 {
            TradeSide::Sell
        } else {
            TradeSide::Buy
        };
        self.execute(
            t,
            date,
            Fill {
                side,
                asset: TradeAsset::Stock,
                quantity: qty.abs(),
                raw_price: price,
                multiplier: 1.0,
                reason,
            },
            true,
        );
        self.position.quantity = 0.0;
    }

    fn close_all(
        &mut self,
        t: usize,
        date: NaiveDate,
        price: f64,
        vol_index: usize,
        reason: TradeReason,
    ) -> Result<(), SimError> {
        if let Some(leg) = self.position.option.take() {
            let volatility = self.volatility_at(vol_index);
            let premium = self.overlay.mark(&leg.contract, price, volatility, t)?;
            self.execute(
                t,
                date,
                Fill {
                    side: TradeSide::Sell,
                    asset: option_asset(leg.contract.kind),
                    quantity: leg.contracts,
                    raw_price: premium,
                    multiplier: leg.contract.multiplier,
                    reason,
                },
                true,
            );
        }
        self.close_stock(t, date, price, reason);
        self.position.clear();
        Ok(())
    }

    fn open(
        &mut self,
        t: usize,
        date: NaiveDate,
        target: HoldingState,
        price: f64,
        vol_index: usize,
        reason: TradeReason,
    ) -> Result<(), SimError> {
        if target == HoldingState::Flat {
            return Ok(());
        }
        if self.cash <= 0.0 {
            return Err(SimError::InsufficientCash {
                index: t,
                cash: self.cash,
            });
        }

        let costs = self.config.costs;
        let allocation = self.config.allocation;
        match target {
            HoldingState::Long | HoldingState::Short => {
                let side = if target == HoldingState::Long {
                    TradeSide::Buy
                } else {
                    TradeSide::Sell
                };
                let unit = costs.slipped_price(price, side);
                let qty = allocation.quantity(self.cash, unit, &costs.fee, 1);
                if qty < MIN_QUANTITY {
                    warn!(index = t, cash = self.cash, "position size capped to zero");
                    return Ok(());
                }
                let trade = self.execute(
                    t,
                    date,
                    Fill {
                        side,
                        asset: TradeAsset::Stock,
                        quantity: qty,
                        raw_price: price,
                        multiplier: 1.0,
                        reason,
                    },
                    true,
                );
                self.position.quantity = if side.is_buy() { qty } else { -qty };
                self.position.avg_entry_price = trade.price;
            }
            HoldingState::LongCall => {
                let contract = self.overlay.open_contract(OptionKind::Call, price, t, date)?;
                let volatility = self.volatility_at(vol_index);
                let premium = self.overlay.mark(&contract, price, volatility, t)?;
                if premium < MIN_PREMIUM {
                    warn!(index = t, premium, strike = contract.strike, "call premium too small to size");
                    return Ok(());
                }
                let unit = costs.slipped_price(premium, TradeSide::Buy) * contract.multiplier;
                let contracts = allocation.quantity(self.cash, unit, &costs.fee, 1);
                if contracts < MIN_QUANTITY {
                    warn!(index = t, premium, cash = self.cash, "call size capped to zero");
                    return Ok(());
                }
                let trade = self.execute(
                    t,
                    date,
                    Fill {
                        side: TradeSide::Buy,
                        asset: TradeAsset::Call,
                        quantity: contracts,
                        raw_price: premium,
                        multiplier: contract.multiplier,
                        reason,
                    },
                    true,
                );
                self.position.option = Some(OptionLeg {
                    contract,
                    contracts,
                    entry_premium: trade.price,
                });
            }
            HoldingState::ProtectivePut => {
                let contract = self.overlay.open_contract(OptionKind::Put, price, t, date)?;
                let volatility = self.volatility_at(vol_index);
                let premium = self.overlay.mark(&contract, price, volatility, t)?;
                let unit = costs.slipped_price(price, TradeSide::Buy)
                    + costs.slipped_price(premium, TradeSide::Buy);
                let shares = allocation.quantity(self.cash, unit, &costs.fee, 2);
                if shares < MIN_QUANTITY {
                    warn!(index = t, cash = self.cash, "protective put size capped to zero");
                    return Ok(());
                }
                let contracts = shares / contract.multiplier;
                let stock = self.execute(
                    t,
                    date,
                    Fill {
                        side: TradeSide::Buy,
                        asset: TradeAsset::Stock,
                        quantity: shares,
                        raw_price: price,
                        multiplier: 1.0,
                        reason,
                    },
                    true,
                );
                let put = self.execute(
                    t,
                    date,
                    Fill {
                        side: TradeSide::Buy,
                        asset: TradeAsset::Put,
                        quantity: contracts,
                        raw_price: premium,
                        multiplier: contract.multiplier,
                        reason,
                    },
                    true,
                );
                self.position.quantity = shares;
                self.position.avg_entry_price = stock.price;
                self.position.option = Some(OptionLeg {
                    contract,
                    contracts,
                    entry_premium: put.price,
                });
            }
            HoldingState::Flat => {}
        }
        Ok(())
    }

    /// Mark at the close of bar `t`.
    fn mark(&mut self, t: usize, bar: &Bar) -> Result<EquityPoint, SimError> {
        let mut value = self.position.stock_value(bar.close);
        if self.position.option.is_some() {
            let vol = self.volatility_at(t);
            if let Some(leg) = &self.position.option {
                let per_share = self.overlay.mark(&leg.contract, bar.close, vol, t)?;
                value += leg.market_value(per_share);
            }
        }
        Ok(EquityPoint::new(
            t,
            bar.date,
            self.cash,
            value,
            self.position.state(),
        ))
    }
}

fn option_asset(kind: OptionKind) -> TradeAsset {
    match kind {
        OptionKind::Call => TradeAsset::Call,
        OptionKind::Put => TradeAsset::Put,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AllocationPolicy, CostModel, FeeModel, Instrument};
    use crate::indicators::make_bars;

    fn intents_from(bars: &[Bar], dirs: &[Direction]) -> Vec<Intent> {
        bars.iter()
            .zip(dirs)
            .map(|(b, d)| Intent::new(b.date, *d))
            .collect()
    }

    use Direction::{Flat, Long, Short};

    #[test]
    fn first_bar_is_always_flat() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let intents = intents_from(&bars, &[Long, Long, Long]);
        let result = run_simulation(&bars, &intents, None, &EngineConfig::new(1_000.0)).unwrap();
        assert_eq!(result.equity[0].state, HoldingState::Flat);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].index, 1);
    }

    #[test]
    fn flat_intent_with_no_holdings_emits_nothing() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let intents = intents_from(&bars, &[Flat, Flat, Flat]);
        let result = run_simulation(&bars, &intents, None, &EngineConfig::new(1_000.0)).unwrap();
        assert!(result.trades.is_empty());
        assert!(result.equity.iter().all(|p| p.equity == 1_000.0));
    }

    #[test]
    fn slippage_and_fee_applied_on_entry_and_exit() {
        let bars = make_bars(&[100.0, 100.0, 110.0, 110.0]);
        let intents = intents_from(&bars, &[Flat, Long, Flat, Flat]);
        let config =
            EngineConfig::new(10_000.0).with_costs(CostModel::proportional(10.0, 100.0));
        let result = run_simulation(&bars, &intents, None, &config).unwrap();

        assert_eq!(result.trades.len(), 2);
        let entry = &result.trades[0];
        assert_eq!(entry.side, TradeSide::Buy);
        assert!((entry.price - 101.0).abs() < 1e-9);
        assert!(entry.notional + entry.fee <= 10_000.0 + 1e-9);

        let exit = &result.trades[1];
        assert_eq!(exit.side, TradeSide::Sell);
        assert_eq!(exit.reason, TradeReason::Exit);
        assert!((exit.price - 108.9).abs() < 1e-9);
        assert!((exit.quantity - entry.quantity).abs() < 1e-12);

        let expected_cash = 10_000.0 + entry.cash_delta() + exit.cash_delta();
        assert!((result.final_equity - expected_cash).abs() < 1e-9);
        assert!(result.total_fees > 0.0 && result.total_slippage > 0.0);
    }

    #[test]
    fn long_short_flip_closes_then_opens() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0]);
        let intents = intents_from(&bars, &[Flat, Long, Short, Short]);
        let result = run_simulation(&bars, &intents, None, &EngineConfig::new(1_000.0)).unwrap();
        let reasons: Vec<_> = result.trades.iter().map(|t| (t.side, t.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                (TradeSide::Buy, TradeReason::Entry),
                (TradeSide::Sell, TradeReason::Exit),
                (TradeSide::Sell, TradeReason::Entry),
            ]
        );
        assert_eq!(result.final_state, HoldingState::Short);
        // short of 10 shares at 100: cash 2000, position -1000
        let last = result.equity.last().unwrap();
        assert!((last.cash - 2_000.0).abs() < 1e-6);
        assert!((last.position_value + 1_000.0).abs() < 1e-6);
        assert!((last.equity - 1_000.0).abs() < 1e-6);
    }

    #[test]
    fn next_open_uses_previous_intent_and_open_price() {
        let mut bars = make_bars(&[100.0, 100.0, 120.0, 120.0]);
        bars[2].open = 110.0;
        let intents = intents_from(&bars, &[Flat, Long, Long, Long]);
        let config = EngineConfig::new(1_100.0).with_timing(ExecutionTiming::NextOpen);
        let result = run_simulation(&bars, &intents, None, &config).unwrap();
        assert_eq!(result.trades[0].index, 2);
        assert!((result.trades[0].price - 110.0).abs() < 1e-12);
        assert!((result.trades[0].quantity - 10.0).abs() < 1e-9);
        assert!((result.final_equity - 1_200.0).abs() < 1e-6);
    }

    #[test]
    fn liquidation_closes_on_last_bar() {
        let bars = make_bars(&[100.0, 100.0, 105.0]);
        let intents = intents_from(&bars, &[Flat, Long, Long]);
        let mut config = EngineConfig::new(1_000.0);
        config.liquidate_at_end = true;
        let result = run_simulation(&bars, &intents, None, &config).unwrap();
        let last = result.trades.last().unwrap();
        assert_eq!(last.reason, TradeReason::Liquidation);
        assert_eq!(result.final_state, HoldingState::Flat);
        assert!((result.equity[2].cash - 1_050.0).abs() < 1e-6);
    }

    #[test]
    fn long_call_expires_and_rolls() {
        let closes: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let mut dirs = vec![Long; 12];
        dirs[0] = Flat;
        let intents = intents_from(&bars, &dirs);
        let mut config = EngineConfig::new(10_000.0).with_instrument(Instrument::LongCall);
        config.options.horizon = 5;
        config.allocation = AllocationPolicy::FractionOfCash { fraction: 0.1 };

        let result = run_simulation(&bars, &intents, None, &config).unwrap();
        let expiries: Vec<_> = result
            .trades
            .iter()
            .filter(|t| t.reason == TradeReason::Expiry)
            .collect();
        assert_eq!(expiries.len(), 2);
        assert_eq!(expiries[0].index, 6);
        assert_eq!(expiries[0].fee, 0.0);
        // ATM strike 101, settled at close 106
        assert!((expiries[0].price - 5.0).abs() < 1e-9);
        let rolls = result
            .trades
            .iter()
            .filter(|t| t.reason == TradeReason::Roll)
            .count();
        assert_eq!(rolls, 2);
        assert_eq!(result.final_state, HoldingState::LongCall);
    }

    #[test]
    fn worthless_call_is_not_bought() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0]);
        let intents = intents_from(&bars, &[Flat, Long, Long, Long]);
        let mut config = EngineConfig::new(10_000.0).with_instrument(Instrument::LongCall);
        config.options.moneyness_offset = 0.5;
        config.options.strike_step = 0.0;
        config.options.fallback_volatility = 0.0;

        let result = run_simulation(&bars, &intents, None, &config).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.final_state, HoldingState::Flat);
        assert!(result.equity.iter().all(|p| p.equity == 10_000.0));
    }

    #[test]
    fn protective_put_holds_both_legs_and_closes_together() {
        let bars = make_bars(&[100.0, 100.0, 95.0, 90.0, 90.0]);
        let intents = intents_from(&bars, &[Flat, Long, Long, Flat, Flat]);
        let config = EngineConfig::new(10_000.0).with_instrument(Instrument::ProtectivePut);
        let result = run_simulation(&bars, &intents, None, &config).unwrap();

        assert_eq!(result.equity[1].state, HoldingState::ProtectivePut);
        let at_entry: Vec<_> = result.trades.iter().filter(|t| t.index == 1).collect();
        assert_eq!(at_entry.len(), 2);
        let shares = at_entry[0].quantity;
        let contracts = at_entry[1].quantity;
        assert!((contracts * 100.0 - shares).abs() < 1e-9);

        let at_exit: Vec<_> = result.trades.iter().filter(|t| t.index == 3).collect();
        assert_eq!(at_exit.len(), 2);
        assert!(at_exit.iter().all(|t| t.side == TradeSide::Sell));
        assert_eq!(result.equity[3].state, HoldingState::Flat);
    }

    #[test]
    fn fixed_fee_is_charged_per_trade() {
        let bars = make_bars(&[50.0, 50.0, 50.0]);
        let intents = intents_from(&bars, &[Flat, Long, Flat]);
        let config = EngineConfig::new(1_000.0)
            .with_costs(CostModel::new(FeeModel::Fixed { amount: 10.0 }, 0.0));
        let result = run_simulation(&bars, &intents, None, &config).unwrap();
        assert_eq!(result.trades.len(), 2);
        assert!((result.total_fees - 20.0).abs() < 1e-12);
        assert!((result.final_equity - 980.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_bad_inputs() {
        let bars = make_bars(&[100.0]);
        let intents = intents_from(&bars, &[Flat]);
        assert!(matches!(
            run_simulation(&bars, &intents, None, &EngineConfig::default()),
            Err(SimError::InsufficientData { .. })
        ));

        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let intents = intents_from(&bars, &[Flat, Flat]);
        assert!(matches!(
            run_simulation(&bars, &intents, None, &EngineConfig::default()),
            Err(SimError::LengthMismatch { series: "intents", .. })
        ));

        let mut shifted = intents_from(&bars, &[Flat, Flat, Flat]);
        shifted[1].date = shifted[2].date;
        assert!(matches!(
            run_simulation(&bars, &shifted, None, &EngineConfig::default()),
            Err(SimError::Misaligned { index: 1, .. })
        ));

        let mut dup = bars.clone();
        dup[2].date = dup[1].date;
        let intents = intents_from(&dup, &[Flat, Flat, Flat]);
        assert!(matches!(
            run_simulation(&dup, &intents, None, &EngineConfig::default()),
            Err(SimError::NonMonotonic { index: 2 })
        ));

        let mut bad = bars.clone();
        bad[1].close = 0.0;
        let intents = intents_from(&bad, &[Flat, Flat, Flat]);
        assert!(matches!(
            run_simulation(&bad, &intents, None, &EngineConfig::default()),
            Err(SimError::InvalidBar { index: 1, .. })
        ));

        let intents = intents_from(&bars, &[Flat, Flat, Flat]);
        let vol = vec![None; 2];
        assert!(matches!(
            run_simulation(&bars, &intents, Some(&vol), &EngineConfig::default()),
            Err(SimError::LengthMismatch { series: "volatility", .. })
        ));

        assert!(matches!(
            run_simulation(&bars, &intents, None, &EngineConfig::new(0.0)),
            Err(SimError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn entry_with_no_cash_is_fatal() {
        // Short at 100, price quadruples, cover leaves cash negative, re-entry fails.
        let bars = make_bars(&[100.0, 100.0, 400.0, 400.0]);
        let intents = intents_from(&bars, &[Flat, Short, Flat, Short]);
        let err = run_simulation(&bars, &intents, None, &EngineConfig::new(1_000.0)).unwrap_err();
        assert!(matches!(err, SimError::InsufficientCash { index: 3, .. }));
    }
}
