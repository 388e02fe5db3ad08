//! Merton (1976) Jump-Diffusion Model
//!
//! # Mathematical Framework
//!
//! The underlying follows geometric Brownian motion with compound-Poisson jumps:
//! ```text
//! dS_t / S_t- = a dt + σ dW_t + (e^Y − 1) dN_t
//! ```
//!
//! Where:
//! - a: [`MertonModel::drift_rate`] for the chosen [`Measure`]
//! - N_t: Poisson process with intensity λ (jumps per year)
//! - Y ~ N(μ_J, σ_J²): log jump size
//! - k = E[e^Y] − 1 = exp(μ_J + σ_J²/2) − 1: jump compensator
//!
//! Under the risk-neutral measure `a = r − λk`, so the discounted price is a
//! martingale. Under the real-world measure `a = μ` as given, with the jumps
//! left uncompensated. Either way `E[S_T] = S0·exp(aT + λkT)`. The compensator
//! is always derived from the jump parameters, never supplied.

use crate::error::{validation::*, JdResult};
use serde::{Deserialize, Serialize};
use std::f64;

/// Raw model inputs
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub s0: f64,      // Spot price
    pub r: f64,       // Risk-free rate (continuously compounded)
    pub sigma: f64,   // Diffusion volatility
    pub lambda: f64,  // Jump intensity (jumps per year)
    pub mu_j: f64,    // Mean of log-jump size
    pub sigma_j: f64, // Std dev of log-jump size
    pub t: f64,       // Horizon in years
}

impl ModelParameters {
    /// Validate the model parameters
    pub fn validate(&self) -> JdResult<()> {
        validate_positive("s0", self.s0)?;
        validate_finite("r", self.r)?;
        validate_non_negative("sigma", self.sigma)?;
        validate_non_negative("lambda", self.lambda)?;
        validate_finite("mu_j", self.mu_j)?;
        validate_non_negative("sigma_j", self.sigma_j)?;
        validate_positive("t", self.t)?;
        Ok(())
    }
}

/// Drift specification for path generation
///
/// Pricing always uses [`Measure::RiskNeutral`]. [`Measure::RealWorld`] applies
/// an uncompensated drift `μ`, for scenario generation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Measure {
    RiskNeutral,
    RealWorld { mu: f64 },
}

/// Validated Merton model with derived quantities
#[derive(Clone, Copy, Debug)]
pub struct MertonModel {
    params: ModelParameters,
    compensator: f64,
}

impl MertonModel {
    pub fn new(params: ModelParameters) -> JdResult<Self> {
        params.validate()?;

        let compensator = (params.mu_j + 0.5 * params.sigma_j * params.sigma_j).exp() - 1.0;
        validate_finite("jump compensator", compensator)?;

        tracing::debug!(
            s0 = params.s0,
            r = params.r,
            sigma = params.sigma,
            lambda = params.lambda,
            compensator,
            drift = params.r - params.lambda * compensator,
            "merton model configured"
        );

        Ok(MertonModel {
            params,
            compensator,
        })
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    /// k = exp(μ_J + σ_J²/2) − 1
    pub fn compensator(&self) -> f64 {
        self.compensator
    }

    /// r − λk
    pub fn risk_neutral_drift(&self) -> f64 {
        self.params.r - self.params.lambda * self.compensator
    }

    /// ln(1 + k) = μ_J + σ_J²/2, the expected log contribution of one jump
    /// including the lognormal convexity term
    pub fn jump_log_drift(&self) -> f64 {
        self.params.mu_j + 0.5 * self.params.sigma_j * self.params.sigma_j
    }

    /// e^{−rT}
    pub fn discount_factor(&self) -> f64 {
        (-self.params.r * self.params.t).exp()
    }

    /// Drift rate of dS/S (excluding jumps) under the given measure
    pub fn drift_rate(&self, measure: Measure) -> f64 {
        match measure {
            Measure::RiskNeutral => self.risk_neutral_drift(),
            Measure::RealWorld { mu } => mu,
        }
    }

    /// E[S_T] = S0 · exp(aT + λkT)
    ///
    /// Equals S0 · e^{rT} under the risk-neutral measure.
    pub fn terminal_mean(&self, measure: Measure) -> f64 {
        let p = &self.params;
        let a = self.drift_rate(measure);
        p.s0 * (a * p.t + p.lambda * p.t * self.compensator).exp()
    }

    /// Var[S_T] = S0² · (exp((2a + σ²)T + λT(E[e^{2Y}] − 1)) − exp(2aT + 2λkT))
    pub fn terminal_variance(&self, measure: Measure) -> f64 {
        let p = &self.params;
        let a = self.drift_rate(measure);
        let second_jump_moment = (2.0 * p.mu_j + 2.0 * p.sigma_j * p.sigma_j).exp();
        let lambda_t = p.lambda * p.t;

        p.s0 * p.s0
            * (((2.0 * a + p.sigma * p.sigma) * p.t + lambda_t * (second_jump_moment - 1.0))
                .exp()
                - (2.0 * a * p.t + 2.0 * lambda_t * self.compensator).exp())
    }
}
