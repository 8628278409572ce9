//! Property tests for simulation invariants.
//!
//! Uses proptest to verify:
//! 1. One equity point per bar, in order
//! 2. Equity identity: equity == cash + position value at every bar
//! 3. Determinism: identical inputs give identical output
//! 4. Full-cash entries never take cash below zero
//! 5. Pricing limits: intrinsic at expiry, discounted intrinsic at zero volatility

use algosim_core::domain::{Bar, Direction, Intent, OptionKind};
use algosim_core::engine::{
    run_simulation, AllocationPolicy, CostModel, EngineConfig, ExecutionTiming, Instrument,
};
use algosim_core::indicators::RealizedVolatility;
use algosim_core::pricing;
use chrono::NaiveDate;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Price path with at most a 1% move per bar.
fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    (
        20.0..500.0_f64,
        prop::collection::vec(-0.01..0.01_f64, 2..80),
    )
        .prop_map(|(start, moves)| {
            let base = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
            let mut close = start;
            let mut bars = Vec::with_capacity(moves.len());
            for (i, m) in moves.iter().enumerate() {
                let open = close;
                close *= 1.0 + m;
                bars.push(Bar::new(
                    base + chrono::Duration::days(i as i64),
                    open,
                    open.max(close),
                    open.min(close),
                    close,
                    1_000,
                ));
            }
            bars
        })
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Long),
        Just(Direction::Short),
        Just(Direction::Flat),
    ]
}

fn arb_config() -> impl Strategy<Value = EngineConfig> {
    (
        prop_oneof![
            Just(Instrument::Stock),
            Just(Instrument::LongCall),
            Just(Instrument::ProtectivePut),
        ],
        prop_oneof![
            Just(ExecutionTiming::SignalClose),
            Just(ExecutionTiming::NextOpen),
            Just(ExecutionTiming::NextClose),
        ],
        0.0..20.0_f64,
        0.0..20.0_f64,
        1usize..40,
        0.0..0.1_f64,
    )
        .prop_map(|(instrument, timing, fee_bps, slip_bps, horizon, offset)| {
            let mut config = EngineConfig::new(10_000.0)
                .with_instrument(instrument)
                .with_timing(timing)
                .with_costs(CostModel::proportional(fee_bps, slip_bps));
            config.allocation = AllocationPolicy::FractionOfCash { fraction: 0.5 };
            config.options.horizon = horizon;
            config.options.moneyness_offset = offset;
            config.options.strike_step = 0.0;
            config
        })
}

fn arb_run() -> impl Strategy<Value = (Vec<Bar>, Vec<Intent>, EngineConfig)> {
    (arb_bars(), arb_config()).prop_flat_map(|(bars, config)| {
        let n = bars.len();
        (
            Just(bars),
            prop::collection::vec(arb_direction(), n),
            Just(config),
        )
            .prop_map(|(bars, dirs, config)| {
                let intents = bars
                    .iter()
                    .zip(dirs)
                    .map(|(b, d)| Intent::new(b.date, d))
                    .collect();
                (bars, intents, config)
            })
    })
}

// ── Engine invariants ────────────────────────────────────────────────

proptest! {
    #[test]
    fn one_point_per_bar((bars, intents, config) in arb_run()) {
        let vol = RealizedVolatility::new(5, 252.0).unwrap().series(&bars);
        let result = run_simulation(&bars, &intents, Some(&vol), &config).unwrap();
        prop_assert_eq!(result.equity.len(), bars.len());
        for (i, (p, b)) in result.equity.iter().zip(&bars).enumerate() {
            prop_assert_eq!(p.index, i);
            prop_assert_eq!(p.date, b.date);
        }
    }

    #[test]
    fn equity_identity_holds((bars, intents, config) in arb_run()) {
        let result = run_simulation(&bars, &intents, None, &config).unwrap();
        for p in &result.equity {
            prop_assert!((p.equity - (p.cash + p.position_value)).abs() < 1e-9);
        }
        prop_assert_eq!(result.final_equity, result.equity.last().unwrap().equity);
    }

    #[test]
    fn no_zero_quantity_trades((bars, intents, config) in arb_run()) {
        let result = run_simulation(&bars, &intents, None, &config).unwrap();
        for t in &result.trades {
            prop_assert!(t.quantity > 0.0);
            prop_assert!(t.fee >= 0.0 && t.slippage >= 0.0);
        }
    }

    #[test]
    fn runs_are_deterministic((bars, intents, config) in arb_run()) {
        let vol = RealizedVolatility::new(5, 252.0).unwrap().series(&bars);
        let a = run_simulation(&bars, &intents, Some(&vol), &config).unwrap();
        let b = run_simulation(&bars, &intents, Some(&vol), &config).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn first_bar_never_holds((bars, intents, config) in arb_run()) {
        let result = run_simulation(&bars, &intents, None, &config).unwrap();
        prop_assert!(result.trades.iter().all(|t| t.index > 0));
        prop_assert_eq!(result.equity[0].equity, config.initial_cash);
    }
}

proptest! {
    #[test]
    fn full_cash_entries_never_overdraw(
        bars in arb_bars(),
        cash in 100.0..1_000_000.0_f64,
        fee_bps in 0.0..50.0_f64,
        slip_bps in 0.0..50.0_f64,
        instrument in prop_oneof![Just(Instrument::Stock), Just(Instrument::ProtectivePut)],
    ) {
        let intents: Vec<Intent> = bars
            .iter()
            .map(|b| Intent::new(b.date, Direction::Long))
            .collect();
        let config = EngineConfig::new(cash)
            .with_instrument(instrument)
            .with_costs(CostModel::proportional(fee_bps, slip_bps));
        prop_assert_eq!(config.allocation, AllocationPolicy::FullCash);

        let result = run_simulation(&bars, &intents, None, &config).unwrap();
        for p in &result.equity {
            prop_assert!(p.cash >= 0.0, "cash {} at bar {}", p.cash, p.index);
        }
    }
}

// ── Pricing ──────────────────────────────────────────────────────────

fn arb_kind() -> impl Strategy<Value = OptionKind> {
    prop_oneof![Just(OptionKind::Call), Just(OptionKind::Put)]
}

proptest! {
    #[test]
    fn price_is_non_negative(
        spot in 1.0..1000.0_f64,
        strike in 1.0..1000.0_f64,
        rate in -0.02..0.1_f64,
        vol in 0.0..2.0_f64,
        tte in 0.0..3.0_f64,
        kind in arb_kind(),
    ) {
        let p = pricing::price(spot, strike, rate, vol, tte, kind).unwrap();
        prop_assert!(p >= 0.0 && p.is_finite());
    }

    #[test]
    fn converges_to_intrinsic_at_expiry(
        spot in 1.0..1000.0_f64,
        strike in 1.0..1000.0_f64,
        vol in 0.01..1.0_f64,
        kind in arb_kind(),
    ) {
        let intrinsic = pricing::intrinsic(spot, strike, kind);
        let at_zero = pricing::price(spot, strike, 0.05, vol, 0.0, kind).unwrap();
        prop_assert_eq!(at_zero, intrinsic);
        let near = pricing::price(spot, strike, 0.05, vol, 1e-18, kind).unwrap();
        prop_assert!((near - intrinsic).abs() < 1e-6, "near={} intrinsic={}", near, intrinsic);
    }

    #[test]
    fn zero_vol_is_discounted_intrinsic(
        spot in 1.0..1000.0_f64,
        strike in 1.0..1000.0_f64,
        rate in 0.0..0.1_f64,
        tte in 0.01..3.0_f64,
        kind in arb_kind(),
    ) {
        let df_strike = strike * (-rate * tte).exp();
        let expected = pricing::intrinsic(spot, df_strike, kind);
        let p = pricing::price(spot, strike, rate, 0.0, tte, kind).unwrap();
        prop_assert!((p - expected).abs() < 1e-6);
    }

    #[test]
    fn put_call_parity(
        spot in 10.0..500.0_f64,
        strike in 10.0..500.0_f64,
        rate in 0.0..0.1_f64,
        vol in 0.05..1.0_f64,
        tte in 0.05..2.0_f64,
    ) {
        let c = pricing::price(spot, strike, rate, vol, tte, OptionKind::Call).unwrap();
        let p = pricing::price(spot, strike, rate, vol, tte, OptionKind::Put).unwrap();
        let forward = spot - strike * (-rate * tte).exp();
        prop_assert!((c - p - forward).abs() < 1e-7 * spot.max(strike));
    }

    #[test]
    fn negative_inputs_rejected(vol in -1.0..-1e-9_f64, tte in -1.0..-1e-9_f64) {
        prop_assert!(pricing::price(100.0, 100.0, 0.0, vol, 0.5, OptionKind::Call).is_err());
        prop_assert!(pricing::price(100.0, 100.0, 0.0, 0.2, tte, OptionKind::Put).is_err());
    }
}
