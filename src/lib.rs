//! # fast-jd: Monte Carlo Pricing under Merton Jump-Diffusion
//!
//! Prices European options on an underlying that follows geometric Brownian
//! motion with compound-Poisson lognormal jumps, and cross-checks the estimate
//! against the Merton (1976) series expansion.
//!
//! ## Key Features
//!
//! - **Exact Sampling**: per-step Poisson jump counts with a conditionally
//!   normal jump sum; no discretization bias
//! - **Parallel and Reproducible**: Rayon workers over seed-derived sub-streams;
//!   the same seed gives the same price for any worker count
//! - **Streaming Statistics**: Welford accumulators merged across chunks,
//!   standard error and confidence interval, optional early stop
//! - **Variance Reduction**: antithetic pairs (−Z, J, −W)
//! - **Reference Price**: Merton series with tolerance-based truncation
//!
//! ## Quick Start
//!
//! ```rust
//! use fast_jd::mc::mc_engine::{price_european, SimulationConfig};
//! use fast_jd::mc::payoffs::ContractParameters;
//! use fast_jd::models::merton::ModelParameters;
//!
//! let params = ModelParameters {
//!     s0: 100.0,     // Spot price
//!     r: 0.05,       // Risk-free rate
//!     sigma: 0.2,    // Diffusion volatility
//!     lambda: 0.1,   // Jumps per year
//!     mu_j: -0.1,    // Mean log jump
//!     sigma_j: 0.15, // Log jump volatility
//!     t: 1.0,        // Time to expiration
//! };
//! let config = SimulationConfig {
//!     paths: 20_000,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let result = price_european(params, ContractParameters::call(100.0), config)
//!     .expect("Valid configuration");
//! let reference = result.reference.expect("Series price attached");
//! println!(
//!     "MC {:.4} ± {:.4}, series {:.4}",
//!     result.price, result.std_error, reference.price
//! );
//! ```
//!
//! Logging goes through `tracing`; the library never installs a subscriber.

pub mod analytics;
pub mod error;
pub mod math_utils;
pub mod mc;
pub mod models;
pub mod rng;

pub use error::{JdError, JdResult};
pub use mc::mc_engine::{price_european, Pricer, PricingResult, ResultFlags, SimulationConfig};
