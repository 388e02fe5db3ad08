// src/mc/mc_engine.rs
use crate::analytics::merton_series::{merton_price, ConvergenceWarning, SeriesConfig};
use crate::error::{validation::*, JdError, JdResult};
use crate::math_utils::Timer;
use crate::mc::path_simulator::{PathSample, PathSimulator};
use crate::mc::payoffs::{ContractParameters, Payoff};
use crate::mc::statistics::{nan_as_null, PayoffAccumulator};
use crate::models::merton::{MertonModel, ModelParameters};
use crate::rng::RngFactory;
use bitflags::bitflags;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Samples per parallel work item
///
/// Chunk boundaries depend only on the sample index, which keeps the reduction
/// order (and therefore every bit of the result) independent of the number of
/// worker threads.
pub const CHUNK_SIZE: u64 = 1024;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ResultFlags: u32 {
        const NONE                = 0;
        const STD_ERROR_UNDEFINED = 1 << 0;
        const TARGET_REACHED      = 1 << 1;
        const PATH_CAP_REACHED    = 1 << 2;
        const ANTITHETIC          = 1 << 3;
        const SERIES_TRUNCATED    = 1 << 4;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub paths: usize, // Independent samples; antithetic pairs when `antithetic` is set
    pub steps: usize,
    pub seed: Option<u64>,
    pub antithetic: bool,
    pub target_std_error: Option<f64>, // Early stop, checked between batches
    pub batch_size: usize,
    pub workers: Option<usize>, // None: rayon's global pool
    pub confidence_level: f64,
}

impl SimulationConfig {
    /// Validate the Monte Carlo configuration
    pub fn validate(&self) -> JdResult<()> {
        validate_paths(self.paths)?;
        validate_steps(self.steps)?;
        if self.batch_size == 0 {
            return Err(JdError::InvalidConfiguration {
                field: "batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.workers == Some(0) {
            return Err(JdError::InvalidConfiguration {
                field: "workers".to_string(),
                reason: "must be greater than 0 when set".to_string(),
            });
        }
        if let Some(target) = self.target_std_error {
            validate_positive("target_std_error", target)?;
        }
        validate_open_unit_interval("confidence_level", self.confidence_level)?;
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            paths: 100_000,
            steps: 1,
            seed: None,
            antithetic: false,
            target_std_error: None,
            batch_size: 10_000,
            workers: None,
            confidence_level: 0.95,
        }
    }
}

/// Cross-check of the Monte Carlo estimate against the Merton series
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceComparison {
    pub price: f64,
    pub abs_diff: f64,
    pub rel_diff: Option<f64>, // None when the series price is zero
    pub terms: usize,
    pub warning: Option<ConvergenceWarning>,
}

/// Outcome of one pricing run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub price: f64,
    #[serde(deserialize_with = "nan_as_null::deserialize")]
    pub std_error: f64, // NaN below two samples
    #[serde(deserialize_with = "nan_as_null::deserialize")]
    pub ci_lower: f64,
    #[serde(deserialize_with = "nan_as_null::deserialize")]
    pub ci_upper: f64,
    pub confidence_level: f64,
    pub paths_used: u64,   // Simulated paths, both members of each antithetic pair
    pub samples_used: u64, // Independent samples behind the standard error
    pub batches: usize,
    pub seed: u64,
    pub elapsed_ms: Option<f64>,
    pub reference: Option<ReferenceComparison>,
    pub flags: ResultFlags,
}

impl PricingResult {
    pub fn contains(&self, value: f64) -> bool {
        self.ci_lower <= value && value <= self.ci_upper
    }

    pub fn ci_width(&self) -> f64 {
        self.ci_upper - self.ci_lower
    }
}

/// Monte Carlo pricer for European options under Merton jump-diffusion
///
/// # Algorithm
///
/// 1. Validate parameters and configuration (fails before any simulation)
/// 2. Split the N samples into batches; split each batch into chunks of
///    [`CHUNK_SIZE`] samples evaluated in parallel
/// 3. Sample i draws from sub-stream i of the master seed, simulates one path
///    (or an antithetic pair) and evaluates the discounted payoff
/// 4. Each chunk streams its payoffs into a [`PayoffAccumulator`]; chunk
///    accumulators are merged in index order
/// 5. After each batch, stop early if the standard error is below the target
///
/// # Errors
///
/// Any non-finite price or payoff aborts the run with `JdError::Numerical`;
/// no partial result is returned.
#[derive(Clone, Debug)]
pub struct Pricer {
    model: MertonModel,
    contract: ContractParameters,
    config: SimulationConfig,
    reference: Option<SeriesConfig>,
}

impl Pricer {
    pub fn new(
        params: ModelParameters,
        contract: ContractParameters,
        config: SimulationConfig,
    ) -> JdResult<Self> {
        let model = MertonModel::new(params)?;
        contract.validate()?;
        config.validate()?;

        Ok(Pricer {
            model,
            contract,
            config,
            reference: None,
        })
    }

    /// Also price with the Merton series and report the discrepancy
    pub fn with_reference(mut self, series: SeriesConfig) -> JdResult<Self> {
        series.validate()?;
        self.reference = Some(series);
        Ok(self)
    }

    pub fn model(&self) -> &MertonModel {
        &self.model
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Price the configured vanilla contract
    pub fn run(&self) -> JdResult<PricingResult> {
        let payoff = self.contract.payoff();
        let mut result = self.simulate(&payoff)?;

        if let Some(series_cfg) = &self.reference {
            let series = merton_price(&self.model, &self.contract, series_cfg)?;
            let abs_diff = (result.price - series.price).abs();
            if series.warning.is_some() {
                result.flags |= ResultFlags::SERIES_TRUNCATED;
            }
            tracing::info!(
                mc_price = result.price,
                series_price = series.price,
                abs_diff,
                "closed-form cross-check"
            );
            result.reference = Some(ReferenceComparison {
                price: series.price,
                abs_diff,
                rel_diff: (series.price != 0.0).then(|| abs_diff / series.price.abs()),
                terms: series.terms,
                warning: series.warning,
            });
        }

        Ok(result)
    }

    /// Price an arbitrary payoff on the configured model; no closed-form cross-check
    pub fn run_with_payoff(&self, payoff: &dyn Payoff) -> JdResult<PricingResult> {
        self.simulate(payoff)
    }

    fn simulate(&self, payoff: &dyn Payoff) -> JdResult<PricingResult> {
        match self.config.workers {
            Some(workers) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .map_err(|e| JdError::InvalidConfiguration {
                        field: "workers".to_string(),
                        reason: e.to_string(),
                    })?;
                pool.install(|| self.simulate_in_pool(payoff))
            }
            None => self.simulate_in_pool(payoff),
        }
    }

    fn simulate_in_pool(&self, payoff: &dyn Payoff) -> JdResult<PricingResult> {
        let cfg = &self.config;
        let timer = Timer::new();
        let simulator = PathSimulator::new(self.model, cfg.steps)?;
        let factory = match cfg.seed {
            Some(seed) => RngFactory::new(seed),
            None => RngFactory::from_entropy(),
        };
        let discount = self.model.discount_factor();
        let total = cfg.paths as u64;

        tracing::info!(
            payoff = payoff.name(),
            samples = total,
            steps = cfg.steps,
            antithetic = cfg.antithetic,
            seed = factory.master_seed(),
            workers = cfg.workers.unwrap_or_else(rayon::current_num_threads),
            "pricing run started"
        );

        let mut acc = PayoffAccumulator::new();
        let mut flags = ResultFlags::NONE;
        let mut batches = 0usize;
        let mut next = 0u64;

        while next < total {
            let end = (next + cfg.batch_size as u64).min(total);
            let batch = self.run_batch(&simulator, &factory, payoff, discount, next..end)?;
            acc.merge(&batch);
            batches += 1;
            next = end;

            tracing::debug!(
                batch = batches,
                samples = acc.count(),
                mean = acc.mean(),
                std_error = acc.standard_error(),
                "batch complete"
            );

            if let Some(target) = cfg.target_std_error {
                // A NaN standard error (fewer than two samples) never meets the target
                if acc.standard_error() <= target {
                    flags |= ResultFlags::TARGET_REACHED;
                    break;
                }
            }
        }

        if cfg.target_std_error.is_some() && !flags.contains(ResultFlags::TARGET_REACHED) {
            flags |= ResultFlags::PATH_CAP_REACHED;
        }
        if cfg.antithetic {
            flags |= ResultFlags::ANTITHETIC;
        }

        let summary = acc.summary(cfg.confidence_level)?;
        if !summary.mean.is_finite() {
            return Err(JdError::numerical(
                "payoff aggregation",
                format!("price estimate is not finite: {}", summary.mean),
            ));
        }
        if summary.std_error.is_nan() {
            flags |= ResultFlags::STD_ERROR_UNDEFINED;
            tracing::warn!(
                samples = summary.count,
                "standard error undefined with fewer than two samples"
            );
        }

        let samples_used = acc.count();
        let paths_used = if cfg.antithetic {
            2 * samples_used
        } else {
            samples_used
        };
        let elapsed_ms = timer.elapsed_ms();

        tracing::info!(
            price = summary.mean,
            std_error = summary.std_error,
            paths = paths_used,
            batches,
            elapsed_ms,
            "pricing run completed"
        );

        Ok(PricingResult {
            price: summary.mean,
            std_error: summary.std_error,
            ci_lower: summary.ci_lower,
            ci_upper: summary.ci_upper,
            confidence_level: cfg.confidence_level,
            paths_used,
            samples_used,
            batches,
            seed: factory.master_seed(),
            elapsed_ms: Some(elapsed_ms),
            reference: None,
            flags,
        })
    }

    /// Evaluate samples `range` and reduce them in chunk order
    fn run_batch(
        &self,
        simulator: &PathSimulator,
        factory: &RngFactory,
        payoff: &dyn Payoff,
        discount: f64,
        range: Range<u64>,
    ) -> JdResult<PayoffAccumulator> {
        let first_chunk = range.start / CHUNK_SIZE;
        let last_chunk = (range.end + CHUNK_SIZE - 1) / CHUNK_SIZE;
        let record_path = payoff.requires_path();
        let antithetic = self.config.antithetic;

        let chunks = (first_chunk as usize..last_chunk as usize)
            .into_par_iter()
            .map(|chunk| -> JdResult<PayoffAccumulator> {
                let start = (chunk as u64 * CHUNK_SIZE).max(range.start);
                let end = ((chunk as u64 + 1) * CHUNK_SIZE).min(range.end);
                let mut acc = PayoffAccumulator::new();

                for i in start..end {
                    let mut rng = factory.stream(i);
                    if antithetic {
                        let (a, b) = simulator
                            .sample_antithetic(&mut rng, record_path)
                            .map_err(|e| e.with_sample(i))?;
                        let value_a = evaluate(payoff, &a, discount).map_err(|e| e.with_sample(i))?;
                        let value_b = evaluate(payoff, &b, discount).map_err(|e| e.with_sample(i))?;
                        acc.push_pair(value_a, value_b);
                    } else {
                        let sample = simulator
                            .sample(&mut rng, record_path)
                            .map_err(|e| e.with_sample(i))?;
                        acc.push(evaluate(payoff, &sample, discount).map_err(|e| e.with_sample(i))?);
                    }
                }
                Ok(acc)
            })
            .collect::<JdResult<Vec<PayoffAccumulator>>>()?;

        Ok(chunks
            .into_iter()
            .fold(PayoffAccumulator::new(), PayoffAccumulator::merged))
    }
}

fn evaluate(payoff: &dyn Payoff, sample: &PathSample, discount: f64) -> JdResult<f64> {
    let value = payoff.discounted(sample, discount);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(JdError::numerical(
            format!("{} payoff", payoff.name()),
            format!("discounted payoff {} at S_T = {}", value, sample.terminal()),
        ))
    }
}

/// Price a European option and cross-check it against the Merton series
/// with default truncation settings
pub fn price_european(
    params: ModelParameters,
    contract: ContractParameters,
    config: SimulationConfig,
) -> JdResult<PricingResult> {
    Pricer::new(params, contract, config)?
        .with_reference(SeriesConfig::default())?
        .run()
}
