// src/rng.rs
//! Random Number Generation for Monte Carlo Simulations
//!
//! # Design Philosophy
//!
//! Monte Carlo pricing needs random numbers with specific properties:
//! 1. **Reproducibility**: Same seed → same results
//! 2. **Parallel safety**: No generator is shared between threads
//! 3. **Partition independence**: Results do not depend on how samples are
//!    split across workers
//!
//! # Sub-Stream Derivation
//!
//! Each sample (a path, or an antithetic pair of paths) owns a private
//! generator derived from the run's master seed and the sample index:
//! ```text
//! seed_i = splitmix64(master_seed + i * 0x9E3779B97F4A7C15)
//! rng_i  = StdRng::seed_from_u64(seed_i)
//! ```
//! Since the mapping (master_seed, i) → stream is deterministic, the union of
//! all draws is the same for any number of workers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Weyl increment used to spread consecutive stream ids
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// splitmix64 finalizer
///
/// ```text
/// z = (z ⊕ (z >> 30)) * 0xbf58476d1ce4e5b9
/// z = (z ⊕ (z >> 27)) * 0x94d049bb133111eb
/// output = z ⊕ (z >> 31)
/// ```
pub fn splitmix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
    z ^ (z >> 31)
}

/// RNG factory for reproducible parallel simulations
#[derive(Debug, Clone, Copy)]
pub struct RngFactory {
    master_seed: u64,
}

impl RngFactory {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Factory seeded from OS entropy; the drawn seed is available through
    /// [`RngFactory::master_seed`] so the run can be replayed.
    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u64>())
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Seed of sub-stream `stream_id`
    pub fn stream_seed(&self, stream_id: u64) -> u64 {
        splitmix64(
            self.master_seed
                .wrapping_add(stream_id.wrapping_mul(GOLDEN_GAMMA)),
        )
    }

    /// Independent generator for a specific sample
    pub fn stream(&self, stream_id: u64) -> StdRng {
        StdRng::seed_from_u64(self.stream_seed(stream_id))
    }
}

pub fn get_normal_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}
