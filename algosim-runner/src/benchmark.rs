//! Buy-and-hold comparison series.

use algosim_core::domain::Bar;

/// Equity of putting all of `initial_cash` into the first close and holding:
/// initial_cash / close(0) × close(t). Empty when there are no bars.
pub fn buy_and_hold_equity(bars: &[Bar], initial_cash: f64) -> Vec<f64> {
    let Some(first) = bars.first() else {
        return Vec::new();
    };
    if first.close <= 0.0 {
        return vec![initial_cash; bars.len()];
    }
    let shares = initial_cash / first.close;
    bars.iter().map(|b| shares * b.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn scales_closes_from_initial_cash() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = vec![
            Bar::flat(d, 50.0),
            Bar::flat(d.succ_opt().unwrap(), 55.0),
            Bar::flat(d + chrono::Duration::days(2), 40.0),
        ];
        let eq = buy_and_hold_equity(&bars, 1_000.0);
        assert_eq!(eq, vec![1_000.0, 1_100.0, 800.0]);
    }

    #[test]
    fn empty_bars_give_empty_series() {
        assert!(buy_and_hold_equity(&[], 1_000.0).is_empty());
    }
}
