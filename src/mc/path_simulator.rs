//! Exact Path Simulation for Merton Jump-Diffusion
//!
//! # Mathematical Framework
//!
//! Over an interval of length Δt the log-price increment is known in closed form:
//! ```text
//! Δ log S = (a − σ²/2 − λk)Δt + σ√Δt · Z + Σ_{i=1..J} Y_i
//! ```
//! with Z ~ N(0,1), J ~ Poisson(λΔt) and Y_i ~ N(μ_J, σ_J²) i.i.d.
//!
//! Conditional on J, the jump sum is itself normal:
//! ```text
//! Σ_{i=1..J} Y_i ~ N(J·μ_J, J·σ_J²)  =  J·μ_J + σ_J·√J · W,   W ~ N(0,1)
//! ```
//! so each interval needs at most three draws (Z, J, W) regardless of how many
//! jumps occur. Sampling is exact: there is no discretization bias and a
//! single step (M = 1) produces the terminal distribution directly. With
//! M > 1 steps the increments over T/M are drawn independently and compounded
//! multiplicatively (summed in log space).
//!
//! # Antithetic Variates
//!
//! The conjugate of a draw (Z, J, W) is (−Z, J, −W): same jump count, jump
//! magnitudes mirrored around their conditional mean. Both paths of a pair
//! share the draws and have the same marginal distribution.

use crate::error::{validation::*, JdError, JdResult};
use crate::models::merton::{Measure, MertonModel};
use crate::rng::{self, RngFactory};
use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use rayon::prelude::*;
use std::f64;

/// One simulated path: a terminal price, or the M+1 prices S0, …, S_T
#[derive(Clone, Debug, PartialEq)]
pub enum PathSample {
    Terminal(f64),
    Path(Vec<f64>),
}

impl PathSample {
    pub fn terminal(&self) -> f64 {
        match self {
            PathSample::Terminal(s_t) => *s_t,
            PathSample::Path(prices) => prices.last().copied().unwrap_or(f64::NAN),
        }
    }

    pub fn prices(&self) -> Option<&[f64]> {
        match self {
            PathSample::Terminal(_) => None,
            PathSample::Path(prices) => Some(prices),
        }
    }
}

/// Random inputs of one time step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepDraw {
    pub z: f64,     // Diffusion shock
    pub jumps: u64, // Number of jumps in the step
    pub w: f64,     // Standardized jump-sum shock (0 when there are no jumps)
}

impl StepDraw {
    /// Antithetic conjugate: (−Z, J, −W)
    pub fn mirrored(&self) -> Self {
        StepDraw {
            z: -self.z,
            jumps: self.jumps,
            w: -self.w,
        }
    }
}

/// Log-space path accumulator
struct LogPath {
    log_s: f64,
    prices: Option<Vec<f64>>,
}

impl LogPath {
    fn new(s0: f64, steps: usize, record: bool) -> Self {
        let prices = if record {
            let mut prices = Vec::with_capacity(steps + 1);
            prices.push(s0);
            Some(prices)
        } else {
            None
        };
        LogPath {
            log_s: s0.ln(),
            prices,
        }
    }

    fn advance(&mut self, increment: f64) {
        self.log_s += increment;
        if let Some(prices) = self.prices.as_mut() {
            prices.push(self.log_s.exp());
        }
    }

    fn finish(self) -> JdResult<PathSample> {
        let s_t = self.log_s.exp();
        if !self.log_s.is_finite() || !s_t.is_finite() {
            return Err(JdError::numerical(
                "path simulation",
                format!("terminal log-price {} is not representable", self.log_s),
            ));
        }

        match self.prices {
            None => Ok(PathSample::Terminal(s_t)),
            Some(prices) => {
                if let Some(bad) = prices.iter().find(|s| !s.is_finite()) {
                    return Err(JdError::numerical(
                        "path simulation",
                        format!("intermediate price {} is not finite", bad),
                    ));
                }
                Ok(PathSample::Path(prices))
            }
        }
    }
}

/// Exact sampler of Merton jump-diffusion paths
#[derive(Clone, Debug)]
pub struct PathSimulator {
    model: MertonModel,
    steps: usize,
    dt: f64,
    log_drift_dt: f64,    // (drift − σ²/2)·Δt
    diffusion_scale: f64, // σ·√Δt
    jump_counts: Option<Poisson<f64>>,
}

impl PathSimulator {
    /// Risk-neutral simulator with `steps` equal sub-intervals
    pub fn new(model: MertonModel, steps: usize) -> JdResult<Self> {
        Self::with_measure(model, steps, Measure::RiskNeutral)
    }

    pub fn with_measure(model: MertonModel, steps: usize, measure: Measure) -> JdResult<Self> {
        validate_steps(steps)?;
        if let Measure::RealWorld { mu } = measure {
            validate_finite("mu", mu)?;
        }

        let p = *model.params();
        let dt = p.t / steps as f64;

        // Real-world drift is applied uncompensated, risk-neutral drift already holds −λk
        let log_drift_dt = (model.drift_rate(measure) - 0.5 * p.sigma * p.sigma) * dt;
        let diffusion_scale = p.sigma * dt.sqrt();

        let lambda_dt = p.lambda * dt;
        let jump_counts = if lambda_dt > 0.0 {
            Some(
                Poisson::new(lambda_dt).map_err(|e| JdError::InvalidParameter {
                    parameter: "lambda".to_string(),
                    value: p.lambda,
                    constraint: format!("jump count distribution unavailable: {}", e),
                })?,
            )
        } else {
            None
        };

        Ok(PathSimulator {
            model,
            steps,
            dt,
            log_drift_dt,
            diffusion_scale,
            jump_counts,
        })
    }

    pub fn model(&self) -> &MertonModel {
        &self.model
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Draw Z, then J (only when λΔt > 0), then W (only when J > 0)
    pub fn draw_step<R: Rng + ?Sized>(&self, rng: &mut R) -> StepDraw {
        let z = rng::get_normal_draw(rng);
        let jumps = match &self.jump_counts {
            Some(poisson) => poisson.sample(rng) as u64,
            None => 0,
        };
        let w = if jumps > 0 {
            rng::get_normal_draw(rng)
        } else {
            0.0
        };
        StepDraw { z, jumps, w }
    }

    /// Log-price increment of one step for the given draw
    pub fn log_increment(&self, draw: &StepDraw) -> f64 {
        let p = self.model.params();
        let jump_sum = if draw.jumps > 0 {
            let j = draw.jumps as f64;
            j * p.mu_j + p.sigma_j * j.sqrt() * draw.w
        } else {
            0.0
        };
        self.log_drift_dt + self.diffusion_scale * draw.z + jump_sum
    }

    /// Simulate one path; `record_path` keeps all M+1 prices
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, record_path: bool) -> JdResult<PathSample> {
        let mut path = LogPath::new(self.model.params().s0, self.steps, record_path);
        for _ in 0..self.steps {
            let draw = self.draw_step(rng);
            path.advance(self.log_increment(&draw));
        }
        path.finish()
    }

    /// Simulate an antithetic pair from one set of draws
    pub fn sample_antithetic<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        record_path: bool,
    ) -> JdResult<(PathSample, PathSample)> {
        let s0 = self.model.params().s0;
        let mut path = LogPath::new(s0, self.steps, record_path);
        let mut conjugate = LogPath::new(s0, self.steps, record_path);

        for _ in 0..self.steps {
            let draw = self.draw_step(rng);
            path.advance(self.log_increment(&draw));
            conjugate.advance(self.log_increment(&draw.mirrored()));
        }

        Ok((path.finish()?, conjugate.finish()?))
    }

    /// Generate `n` full paths as an `n × (M+1)` matrix (rows are paths)
    ///
    /// Row `i` is drawn from sub-stream `i` of `factory`, so the matrix does not
    /// depend on the number of worker threads.
    pub fn simulate_paths(&self, factory: &RngFactory, n: usize) -> JdResult<Array2<f64>> {
        validate_paths(n)?;
        let columns = self.steps + 1;

        let rows = (0..n)
            .into_par_iter()
            .map(|i| {
                let i = i as u64;
                let mut rng = factory.stream(i);
                match self.sample(&mut rng, true) {
                    Ok(PathSample::Path(prices)) => Ok(prices),
                    Ok(PathSample::Terminal(_)) => Err(JdError::numerical(
                        "path simulation",
                        "recorded path was not produced",
                    )),
                    Err(e) => Err(e.with_sample(i)),
                }
            })
            .collect::<JdResult<Vec<Vec<f64>>>>()?;

        let mut flat = Vec::with_capacity(n * columns);
        for row in rows {
            flat.extend(row);
        }

        Array2::from_shape_vec((n, columns), flat)
            .map_err(|e| JdError::numerical("path matrix", e.to_string()))
    }

    /// Generate `n` terminal prices, one per sub-stream
    pub fn simulate_terminals(&self, factory: &RngFactory, n: usize) -> JdResult<Vec<f64>> {
        validate_paths(n)?;
        (0..n)
            .into_par_iter()
            .map(|i| {
                let i = i as u64;
                let mut rng = factory.stream(i);
                self.sample(&mut rng, false)
                    .map(|sample| sample.terminal())
                    .map_err(|e| e.with_sample(i))
            })
            .collect()
    }
}
