//! Option Payoff Functions
//!
//! # Mathematical Definitions
//!
//! ## European Options
//! - **Call**: max(S_T - K, 0) - right to buy at strike K
//! - **Put**: max(K - S_T, 0) - right to sell at strike K
//!
//! Both are written as max(φ(S_T − K), 0) with φ = +1 for a call and −1 for
//! a put, and discounted with e^{−rT}.
//!
//! # Pluggable Payoffs
//!
//! The pricer consumes payoffs through the [`Payoff`] trait, so other shapes
//! (digital, barrier, ...) can be priced without touching the simulator. A
//! payoff that needs the whole path reports it through
//! [`Payoff::requires_path`] and then receives a [`PathSample::Path`].

use crate::error::{validation::*, JdResult};
use crate::mc::path_simulator::PathSample;
use serde::{Deserialize, Serialize};
use std::f64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    /// φ: +1 for calls, −1 for puts
    pub fn sign(&self) -> f64 {
        match self {
            OptionKind::Call => 1.0,
            OptionKind::Put => -1.0,
        }
    }
}

/// Contract terms of a European option
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractParameters {
    pub k: f64,
    pub kind: OptionKind,
}

impl ContractParameters {
    pub fn call(k: f64) -> Self {
        ContractParameters {
            k,
            kind: OptionKind::Call,
        }
    }

    pub fn put(k: f64) -> Self {
        ContractParameters {
            k,
            kind: OptionKind::Put,
        }
    }

    pub fn validate(&self) -> JdResult<()> {
        validate_positive("k", self.k)
    }

    pub fn payoff(&self) -> EuropeanPayoff {
        EuropeanPayoff { contract: *self }
    }
}

/// Discounted vanilla payoff: discount · max(φ(S_T − K), 0)
pub fn discounted_payoff(s_t: f64, contract: &ContractParameters, discount: f64) -> f64 {
    discount * (contract.kind.sign() * (s_t - contract.k)).max(0.0)
}

/// A payoff capability the pricer can evaluate on each simulated path
pub trait Payoff: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the payoff needs the full path rather than the terminal price
    fn requires_path(&self) -> bool {
        false
    }

    /// Undiscounted payoff of one simulated path
    fn intrinsic(&self, sample: &PathSample) -> f64;

    fn discounted(&self, sample: &PathSample, discount: f64) -> f64 {
        discount * self.intrinsic(sample)
    }
}

/// Vanilla European call or put
#[derive(Clone, Copy, Debug)]
pub struct EuropeanPayoff {
    contract: ContractParameters,
}

impl EuropeanPayoff {
    pub fn contract(&self) -> &ContractParameters {
        &self.contract
    }
}

impl Payoff for EuropeanPayoff {
    fn name(&self) -> &str {
        match self.contract.kind {
            OptionKind::Call => "European call",
            OptionKind::Put => "European put",
        }
    }

    fn intrinsic(&self, sample: &PathSample) -> f64 {
        discounted_payoff(sample.terminal(), &self.contract, 1.0)
    }

    fn discounted(&self, sample: &PathSample, discount: f64) -> f64 {
        discounted_payoff(sample.terminal(), &self.contract, discount)
    }
}
