//! Merton (1976) Series-Expansion Price
//!
//! # Mathematical Framework
//!
//! Conditional on n jumps in [0, T], the log terminal price is normal, so the
//! option price is a Poisson mixture of Black-Scholes prices:
//! ```text
//! V = Σ_{n=0}^{∞} e^{−λ'T} (λ'T)^n / n! · BS(S0, K, r_n, σ_n, T)
//!
//! λ'    = λ(1 + k)
//! r_n   = r − λk + n·ln(1 + k)/T
//! σ_n²  = σ² + n·σ_J²/T
//! ```
//! with ln(1 + k) = μ_J + σ_J²/2. The weights are evaluated in log space so a
//! large λ'T does not underflow e^{−λ'T}.
//!
//! # Truncation
//!
//! After term n has been added the series stops when n has passed the Poisson
//! mode (n ≥ λ'T) and the next weight is below the tolerance, or when n reaches
//! the index cap. Hitting the cap first attaches a [`ConvergenceWarning`] with
//! a bound on the neglected tail:
//! - call: each BS call is at most S0, so the tail is at most S0·(1 − Σ w_n)
//! - put: each BS put is at most K·e^{−r_n T} and Σ_n w_n e^{−r_n T} = e^{−rT},
//!   so the tail is at most K·(e^{−rT} − Σ w_n e^{−r_n T})
//!
//! This module is a validation oracle: it shares no state with the Monte Carlo
//! engine.

use crate::analytics::bs_analytic::bs_price;
use crate::error::{validation::*, JdError, JdResult};
use crate::mc::payoffs::{ContractParameters, OptionKind};
use crate::models::merton::MertonModel;
use serde::{Deserialize, Serialize};
use statrs::function::factorial::ln_factorial;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub tolerance: f64,   // Stop once the next Poisson weight falls below this
    pub max_index: usize, // Highest jump count n included
}

impl Default for SeriesConfig {
    fn default() -> Self {
        SeriesConfig {
            tolerance: 1e-10,
            max_index: 100,
        }
    }
}

impl SeriesConfig {
    pub fn validate(&self) -> JdResult<()> {
        validate_positive("tolerance", self.tolerance)
    }
}

/// Series truncated by the index cap before the tolerance was met
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceWarning {
    pub terms: usize,
    pub next_weight: f64,
    pub residual_bound: f64,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Merton series truncated after {} terms: next weight {:.3e} above tolerance, residual bound {:.3e}",
            self.terms, self.next_weight, self.residual_bound
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesPrice {
    pub price: f64,
    pub terms: usize,
    pub weight_mass: f64, // Σ of the Poisson weights used
    pub warning: Option<ConvergenceWarning>,
}

/// Poisson weights e^{−μ} μ^n / n!
struct PoissonWeights {
    mean: f64,
    ln_mean: f64,
}

impl PoissonWeights {
    fn new(mean: f64) -> Self {
        PoissonWeights {
            mean,
            ln_mean: mean.ln(),
        }
    }

    fn weight(&self, n: usize) -> f64 {
        if self.mean == 0.0 {
            return if n == 0 { 1.0 } else { 0.0 };
        }
        (-self.mean + n as f64 * self.ln_mean - ln_factorial(n as u64)).exp()
    }
}

/// Merton semi-closed-form price of a European option
pub fn merton_price(
    model: &MertonModel,
    contract: &ContractParameters,
    cfg: &SeriesConfig,
) -> JdResult<SeriesPrice> {
    cfg.validate()?;
    contract.validate()?;

    let p = model.params();
    let k = model.compensator();
    let base_rate = model.risk_neutral_drift();
    let jump_log_drift = model.jump_log_drift();
    let weights = PoissonWeights::new(p.lambda * (1.0 + k) * p.t);

    let mut price = 0.0;
    let mut weight_mass = 0.0;
    let mut discount_mass = 0.0; // Σ w_n e^{−r_n T}
    let mut n = 0usize;

    let warning = loop {
        let w = weights.weight(n);
        let r_n = base_rate + n as f64 * jump_log_drift / p.t;
        let sigma_n = (p.sigma * p.sigma + n as f64 * p.sigma_j * p.sigma_j / p.t).sqrt();

        if w > 0.0 {
            price += w * bs_price(contract.kind, p.s0, contract.k, r_n, sigma_n, p.t);
            discount_mass += w * (-r_n * p.t).exp();
        }
        weight_mass += w;

        let next_weight = weights.weight(n + 1);
        if n as f64 >= weights.mean && next_weight < cfg.tolerance {
            break None;
        }
        if n >= cfg.max_index {
            let residual_bound = match contract.kind {
                OptionKind::Call => p.s0 * (1.0 - weight_mass),
                OptionKind::Put => contract.k * (model.discount_factor() - discount_mass),
            }
            .max(0.0);
            break Some(ConvergenceWarning {
                terms: n + 1,
                next_weight,
                residual_bound,
            });
        }
        n += 1;
    };

    if !price.is_finite() {
        return Err(JdError::numerical(
            "Merton series",
            format!("price is not finite after {} terms: {}", n + 1, price),
        ));
    }

    match &warning {
        Some(w) => tracing::warn!(
            terms = w.terms,
            next_weight = w.next_weight,
            residual_bound = w.residual_bound,
            "merton series hit the index cap before reaching tolerance"
        ),
        None => tracing::debug!(terms = n + 1, price, "merton series converged"),
    }

    Ok(SeriesPrice {
        price,
        terms: n + 1,
        weight_mass,
        warning,
    })
}
