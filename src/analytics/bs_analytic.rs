// src/analytics/bs_analytic.rs
//! Analytical Black-Scholes formulas for European options
//!
//! # Mathematical Foundation
//!
//! Under the Black-Scholes model, the underlying asset follows:
//! ```text
//! dS_t = r S_t dt + σ S_t dW_t
//! ```
//!
//! The risk-neutral pricing formula gives:
//! ```text
//! V(S,t) = e^(-r(T-t)) * E^Q[payoff(S_T) | S_t = S]
//! ```
//!
//! These prices are the building blocks of the Merton series in
//! [`crate::analytics::merton_series`] and the no-jump reference for the
//! Monte Carlo engine.

use crate::math_utils::norm_cdf;
use crate::mc::payoffs::OptionKind;

/// d₁ and d₂, or `None` when σ√T = 0 (deterministic terminal price)
fn d1_d2(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> Option<(f64, f64)> {
    let vol_sqrt_t = sigma * t.sqrt();
    if vol_sqrt_t > 0.0 {
        let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / vol_sqrt_t;
        Some((d1, d1 - vol_sqrt_t))
    } else {
        None
    }
}

/// Black-Scholes European call option price
///
/// # Formula
/// ```text
/// C(S,K,r,σ,T) = S*Φ(d₁) - K*e^(-rT)*Φ(d₂)
/// ```
///
/// Where:
/// ```text
/// d₁ = [ln(S/K) + (r + σ²/2)T] / (σ√T)
/// d₂ = d₁ - σ√T
/// ```
///
/// With σ = 0 the terminal price is the forward S·e^(rT) and the price is the
/// discounted intrinsic value max(S − K·e^(-rT), 0).
pub fn bs_call_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    match d1_d2(s, k, r, sigma, t) {
        Some((d1, d2)) => s * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2),
        None => (s - k * (-r * t).exp()).max(0.0),
    }
}

/// Black-Scholes European put option price
///
/// # Formula
/// ```text
/// P(S,K,r,σ,T) = K*e^(-rT)*Φ(-d₂) - S*Φ(-d₁)
/// ```
pub fn bs_put_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    match d1_d2(s, k, r, sigma, t) {
        Some((d1, d2)) => k * (-r * t).exp() * norm_cdf(-d2) - s * norm_cdf(-d1),
        None => (k * (-r * t).exp() - s).max(0.0),
    }
}

pub fn bs_price(kind: OptionKind, s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    match kind {
        OptionKind::Call => bs_call_price(s, k, r, sigma, t),
        OptionKind::Put => bs_put_price(s, k, r, sigma, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        // Hull, Options Futures and Other Derivatives: S=42, K=40, r=10%, σ=20%, T=0.5
        let call = bs_call_price(42.0, 40.0, 0.1, 0.2, 0.5);
        let put = bs_put_price(42.0, 40.0, 0.1, 0.2, 0.5);
        assert!((call - 4.76).abs() < 0.01, "call = {}", call);
        assert!((put - 0.81).abs() < 0.01, "put = {}", put);
    }

    #[test]
    fn test_put_call_parity() {
        for &(s, k) in &[(100.0, 100.0), (80.0, 100.0), (130.0, 95.0)] {
            let c = bs_call_price(s, k, 0.05, 0.25, 1.5);
            let p = bs_put_price(s, k, 0.05, 0.25, 1.5);
            let parity = s - k * (-0.05f64 * 1.5).exp();
            assert!((c - p - parity).abs() < 1e-10);
        }
    }

    #[test]
    fn test_zero_volatility_limit() {
        let r: f64 = 0.05;
        let call = bs_call_price(100.0, 100.0, r, 0.0, 1.0);
        assert!((call - (100.0 - 100.0 * (-r).exp())).abs() < 1e-12);
        assert_eq!(bs_put_price(100.0, 100.0, r, 0.0, 1.0), 0.0);

        // Continuity with a tiny volatility
        let near = bs_call_price(100.0, 100.0, r, 1e-8, 1.0);
        assert!((near - call).abs() < 1e-6);
    }

    #[test]
    fn test_bs_price_dispatch() {
        let c = bs_price(OptionKind::Call, 100.0, 105.0, 0.03, 0.3, 2.0);
        let p = bs_price(OptionKind::Put, 100.0, 105.0, 0.03, 0.3, 2.0);
        assert_eq!(c, bs_call_price(100.0, 105.0, 0.03, 0.3, 2.0));
        assert_eq!(p, bs_put_price(100.0, 105.0, 0.03, 0.3, 2.0));
    }
}
