// src/math_utils.rs
use crate::error::{validation::validate_open_unit_interval, JdError, JdResult};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::function::erf;
use std::f64::consts::SQRT_2;

pub fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf::erf(x / SQRT_2))
}

/// Two-sided standard normal critical value z_{α/2} for a confidence level
/// `1 − α`, e.g. 1.959964 for 0.95.
pub fn two_sided_z(confidence_level: f64) -> JdResult<f64> {
    validate_open_unit_interval("confidence_level", confidence_level)?;
    let std_normal =
        Normal::new(0.0, 1.0).map_err(|e| JdError::numerical("normal quantile", e.to_string()))?;
    Ok(std_normal.inverse_cdf(0.5 + 0.5 * confidence_level))
}

pub struct Timer {
    start_time: std::time::Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            start_time: std::time::Instant::now(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = std::time::Instant::now();
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }
}
