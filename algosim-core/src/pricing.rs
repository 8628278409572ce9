//! European option valuation (Black-Scholes, no dividends).
//!
//! Stateless: every function is a pure mapping from inputs to a price.
//! Volatility is a scalar supplied by the caller; no estimation happens here.

use statrs::function::erf::erfc;

use crate::domain::OptionKind;
use crate::error::SimError;

/// Below this total deviation the lognormal spread is treated as zero.
const MIN_STD_DEV: f64 = 1e-12;

/// Standard normal CDF.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Payoff at expiry.
pub fn intrinsic(spot: f64, strike: f64, kind: OptionKind) -> f64 {
    match kind {
        OptionKind::Call => (spot - strike).max(0.0),
        OptionKind::Put => (strike - spot).max(0.0),
    }
}

/// Theoretical price per share.
///
/// `time_to_expiry` is in years. At zero the intrinsic payoff is returned;
/// as volatility goes to zero the price converges to the discounted
/// intrinsic value `max(S - K e^{-rT}, 0)` (calls) or `max(K e^{-rT} - S, 0)`
/// (puts). The result is never negative.
pub fn price(
    spot: f64,
    strike: f64,
    rate: f64,
    volatility: f64,
    time_to_expiry: f64,
    kind: OptionKind,
) -> Result<f64, SimError> {
    validate(spot, strike, rate, volatility, time_to_expiry)?;

    if time_to_expiry == 0.0 {
        return Ok(intrinsic(spot, strike, kind));
    }

    let discounted_strike = strike * (-rate * time_to_expiry).exp();
    let std_dev = volatility * time_to_expiry.sqrt();
    if std_dev < MIN_STD_DEV {
        return Ok(intrinsic(spot, discounted_strike, kind));
    }

    let d1 = ((spot / strike).ln() + (rate + 0.5 * volatility * volatility) * time_to_expiry)
        / std_dev;
    let d2 = d1 - std_dev;

    let value = match kind {
        OptionKind::Call => spot * norm_cdf(d1) - discounted_strike * norm_cdf(d2),
        OptionKind::Put => discounted_strike * norm_cdf(-d2) - spot * norm_cdf(-d1),
    };
    Ok(value.max(0.0))
}

fn validate(
    spot: f64,
    strike: f64,
    rate: f64,
    volatility: f64,
    time_to_expiry: f64,
) -> Result<(), SimError> {
    if !(spot.is_finite() && spot > 0.0) {
        return Err(SimError::invalid("spot", format!("must be > 0, got {spot}")));
    }
    if !(strike.is_finite() && strike > 0.0) {
        return Err(SimError::invalid("strike", format!("must be > 0, got {strike}")));
    }
    if !rate.is_finite() {
        return Err(SimError::invalid("rate", format!("must be finite, got {rate}")));
    }
    if !(volatility.is_finite() && volatility >= 0.0) {
        return Err(SimError::invalid(
            "volatility",
            format!("must be >= 0, got {volatility}"),
        ));
    }
    if !(time_to_expiry.is_finite() && time_to_expiry >= 0.0) {
        return Err(SimError::invalid(
            "time_to_expiry",
            format!("must be >= 0, got {time_to_expiry}"),
        ));
    }
    Ok(())
}

/// Round a strike to the nearest multiple of `step`. A non-positive step
/// leaves the value unchanged.
pub fn round_strike(value: f64, step: f64) -> f64 {
    if step <= 0.0 || !step.is_finite() {
        return value;
    }
    (value / step).round() * step
}
