//! Streaming Monte Carlo Statistics
//!
//! # Welford Update
//!
//! Naive accumulation of Σx and Σx² loses precision when the mean is large
//! relative to the spread (catastrophic cancellation in Σx² − n·x̄²). The
//! accumulator instead keeps the running mean and the sum of squared deviations:
//! ```text
//! n    ← n + 1
//! δ    = x − x̄
//! x̄    ← x̄ + δ/n
//! M2   ← M2 + δ·(x − x̄)
//! ```
//!
//! # Parallel Combination
//!
//! Two accumulators over disjoint samples combine exactly (Chan et al.):
//! ```text
//! n  = n_a + n_b
//! δ  = x̄_b − x̄_a
//! x̄  = x̄_a + δ·n_b/n
//! M2 = M2_a + M2_b + δ²·n_a·n_b/n
//! ```
//! The rule is associative and commutative up to floating-point rounding, so
//! per-worker partial results can be reduced in any grouping.

use crate::error::JdResult;
use crate::math_utils::two_sided_z;
use serde::{Deserialize, Serialize};
use std::f64;

/// Running count, mean and sum of squared deviations of discounted payoffs
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PayoffAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
}

impl PayoffAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Fold an antithetic pair as one sample, its average
    ///
    /// The pair members are negatively correlated, so the pair average is the
    /// independent unit; treating them as two samples would misstate the
    /// standard error.
    pub fn push_pair(&mut self, a: f64, b: f64) {
        self.push(0.5 * (a + b));
    }

    pub fn merge(&mut self, other: &PayoffAccumulator) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }

        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let count = self.count + other.count;
        let n = count as f64;
        let delta = other.mean - self.mean;

        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.count = count;
    }

    /// By-value merge, convenient as a reduction operator
    pub fn merged(mut self, other: PayoffAccumulator) -> PayoffAccumulator {
        self.merge(&other);
        self
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sample mean; NaN when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.mean
        }
    }

    /// Unbiased sample variance (n − 1 denominator); NaN below two samples
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            f64::NAN
        } else {
            (self.m2 / (self.count - 1) as f64).max(0.0)
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// stdev / √n; NaN below two samples
    pub fn standard_error(&self) -> f64 {
        self.std_dev() / (self.count as f64).sqrt()
    }

    /// mean ± z·SE
    pub fn confidence_interval(&self, z: f64) -> (f64, f64) {
        let half_width = z * self.standard_error();
        (self.mean() - half_width, self.mean() + half_width)
    }

    pub fn summary(&self, confidence_level: f64) -> JdResult<Summary> {
        let z = two_sided_z(confidence_level)?;
        let (ci_lower, ci_upper) = self.confidence_interval(z);
        Ok(Summary {
            count: self.count,
            mean: self.mean(),
            std_dev: self.std_dev(),
            std_error: self.standard_error(),
            ci_lower,
            ci_upper,
            confidence_level,
        })
    }
}

impl Extend<f64> for PayoffAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.push(x);
        }
    }
}

impl FromIterator<f64> for PayoffAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = PayoffAccumulator::new();
        acc.extend(iter);
        acc
    }
}

/// Snapshot of accumulator statistics at a confidence level
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: u64,
    #[serde(deserialize_with = "nan_as_null::deserialize")]
    pub mean: f64,
    #[serde(deserialize_with = "nan_as_null::deserialize")]
    pub std_dev: f64,
    #[serde(deserialize_with = "nan_as_null::deserialize")]
    pub std_error: f64,
    #[serde(deserialize_with = "nan_as_null::deserialize")]
    pub ci_lower: f64,
    #[serde(deserialize_with = "nan_as_null::deserialize")]
    pub ci_upper: f64,
    pub confidence_level: f64,
}

/// Reads `null` back as NaN
///
/// JSON has no NaN; serde_json writes undefined statistics (fewer than two
/// samples) as `null`.
pub mod nan_as_null {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}
