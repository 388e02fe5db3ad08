// tests/integration_test.rs
use fast_jd::analytics::bs_analytic;
use fast_jd::mc::mc_engine::{price_european, Pricer, PricingResult, ResultFlags, SimulationConfig};
use fast_jd::mc::path_simulator::PathSample;
use fast_jd::mc::payoffs::{ContractParameters, Payoff};
use fast_jd::math_utils::norm_cdf;
use fast_jd::models::merton::ModelParameters;

fn reference_params() -> ModelParameters {
    ModelParameters {
        s0: 100.0,
        r: 0.05,
        sigma: 0.2,
        lambda: 0.1,
        mu_j: -0.1,
        sigma_j: 0.15,
        t: 1.0,
    }
}

fn seeded(paths: usize, seed: u64) -> SimulationConfig {
    SimulationConfig {
        paths,
        seed: Some(seed),
        ..Default::default()
    }
}

fn assert_within_se(result: &PricingResult, expected: f64, n_se: f64, label: &str) {
    let diff = (result.price - expected).abs();
    assert!(
        diff <= n_se * result.std_error,
        "{}: MC {} vs expected {} differs by {} ({:.2} SE)",
        label,
        result.price,
        expected,
        diff,
        diff / result.std_error
    );
}

/// Discounted S_T − K, unfloored
struct Forward {
    k: f64,
}

impl Payoff for Forward {
    fn name(&self) -> &str {
        "forward"
    }

    fn intrinsic(&self, sample: &PathSample) -> f64 {
        sample.terminal() - self.k
    }
}

/// Cash-or-nothing call paying 1 when S_T > K
struct DigitalCall {
    k: f64,
}

impl Payoff for DigitalCall {
    fn name(&self) -> &str {
        "digital call"
    }

    fn intrinsic(&self, sample: &PathSample) -> f64 {
        if sample.terminal() > self.k {
            1.0
        } else {
            0.0
        }
    }
}

/// Arithmetic-average call over the monitoring dates of the path
struct AsianCall {
    k: f64,
}

impl Payoff for AsianCall {
    fn name(&self) -> &str {
        "asian call"
    }

    fn requires_path(&self) -> bool {
        true
    }

    fn intrinsic(&self, sample: &PathSample) -> f64 {
        let prices = sample.prices().expect("Path requested");
        let average = prices[1..].iter().sum::<f64>() / (prices.len() - 1) as f64;
        (average - self.k).max(0.0)
    }
}

#[test]
fn test_no_jumps_matches_black_scholes() {
    let params = ModelParameters {
        lambda: 0.0,
        ..reference_params()
    };

    for contract in [ContractParameters::call(100.0), ContractParameters::put(95.0)] {
        let result = Pricer::new(params, contract, seeded(200_000, 42))
            .expect("Valid configuration")
            .run()
            .expect("Finite run");
        let analytic = bs_analytic::bs_price(contract.kind, 100.0, contract.k, 0.05, 0.2, 1.0);

        println!(
            "\n{:?} K={}: MC {:.4} ± {:.4}, BS {:.4}",
            contract.kind, contract.k, result.price, result.std_error, analytic
        );
        assert_within_se(&result, analytic, 4.0, "no-jump limit");
    }
}

#[test]
fn test_reference_scenario_matches_series() {
    let result = price_european(
        reference_params(),
        ContractParameters::call(100.0),
        seeded(200_000, 7),
    )
    .expect("Valid configuration");
    let reference = result.reference.expect("Series reference attached");

    println!(
        "\nMC {:.4} ± {:.4} (95% CI [{:.4}, {:.4}]), series {:.4} in {} terms",
        result.price,
        result.std_error,
        result.ci_lower,
        result.ci_upper,
        reference.price,
        reference.terms
    );

    assert!(result.std_error < 0.05, "SE too large: {}", result.std_error);
    assert!(reference.warning.is_none());
    assert!(!result.flags.contains(ResultFlags::SERIES_TRUNCATED));
    assert_within_se(&result, reference.price, 4.0, "reference scenario");
    assert_eq!(result.paths_used, 200_000);
}

#[test]
fn test_reference_scenario_interval_covers_series() {
    let result = price_european(
        reference_params(),
        ContractParameters::call(100.0),
        seeded(100_000, 0),
    )
    .expect("Valid configuration");
    let reference = result.reference.expect("Series reference attached");

    println!(
        "\n95% CI [{:.4}, {:.4}], series {:.4}",
        result.ci_lower, result.ci_upper, reference.price
    );
    assert_eq!(result.confidence_level, 0.95);
    assert!(
        result.contains(reference.price),
        "series price {} outside [{}, {}]",
        reference.price,
        result.ci_lower,
        result.ci_upper
    );
}

#[test]
fn test_put_and_many_jumps_match_series() {
    let params = ModelParameters {
        lambda: 1.0,
        mu_j: -0.2,
        sigma_j: 0.25,
        ..reference_params()
    };

    for contract in [ContractParameters::put(100.0), ContractParameters::call(110.0)] {
        let cfg = SimulationConfig {
            steps: 4,
            ..seeded(150_000, 11)
        };
        let result = price_european(params, contract, cfg).expect("Valid configuration");
        let reference = result.reference.expect("Series reference attached");
        assert_within_se(&result, reference.price, 4.0, "frequent jumps");
    }
}

#[test]
fn test_put_call_parity_on_common_paths() {
    let cfg = seeded(100_000, 99);
    let call = Pricer::new(reference_params(), ContractParameters::call(105.0), cfg.clone())
        .unwrap()
        .run()
        .unwrap();
    let put = Pricer::new(reference_params(), ContractParameters::put(105.0), cfg.clone())
        .unwrap()
        .run()
        .unwrap();
    let forward = Pricer::new(reference_params(), ContractParameters::call(105.0), cfg)
        .unwrap()
        .run_with_payoff(&Forward { k: 105.0 })
        .unwrap();

    // Same seed, same paths: C − P equals the forward estimate up to rounding
    assert!(
        (call.price - put.price - forward.price).abs() < 1e-9,
        "C − P = {}, forward = {}",
        call.price - put.price,
        forward.price
    );

    // And the forward estimate is unbiased for S0 − K·e^{−rT}
    let parity = 100.0 - 105.0 * (-0.05f64).exp();
    assert_within_se(&forward, parity, 4.0, "forward");
}

#[test]
fn test_custom_digital_payoff() {
    let params = ModelParameters {
        lambda: 0.0,
        ..reference_params()
    };
    let pricer = Pricer::new(params, ContractParameters::call(100.0), seeded(100_000, 5)).unwrap();
    let result = pricer
        .run_with_payoff(&DigitalCall { k: 100.0 })
        .expect("Finite run");

    let d2 = ((100.0f64 / 100.0).ln() + (0.05 - 0.5 * 0.04) * 1.0) / 0.2;
    let analytic = (-0.05f64).exp() * norm_cdf(d2);

    assert!(result.reference.is_none());
    assert_within_se(&result, analytic, 4.0, "digital call");
}

#[test]
fn test_path_dependent_payoff_sees_full_path() {
    let cfg = SimulationConfig {
        steps: 12,
        ..seeded(50_000, 21)
    };
    let pricer = Pricer::new(reference_params(), ContractParameters::call(100.0), cfg).unwrap();

    let asian = pricer.run_with_payoff(&AsianCall { k: 100.0 }).expect("Finite run");
    let european = pricer.run().expect("Finite run");

    println!(
        "\nAsian {:.4} ± {:.4}, European {:.4} ± {:.4}",
        asian.price, asian.std_error, european.price, european.std_error
    );
    // Averaging removes roughly 40% of the terminal variance
    assert!(asian.price > 0.0);
    assert!(asian.price < european.price - 2.0);
}

#[test]
fn test_configuration_errors_name_the_field() {
    let contract = ContractParameters::call(100.0);

    let err = Pricer::new(
        ModelParameters {
            sigma: -0.2,
            ..reference_params()
        },
        contract,
        seeded(1000, 1),
    )
    .unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("sigma"), "{}", err);

    let err = Pricer::new(
        ModelParameters {
            lambda: f64::NAN,
            ..reference_params()
        },
        contract,
        seeded(1000, 1),
    )
    .unwrap_err();
    assert!(err.to_string().contains("lambda"), "{}", err);

    let err = Pricer::new(reference_params(), ContractParameters::put(0.0), seeded(1000, 1))
        .unwrap_err();
    assert!(err.to_string().contains("'k'"), "{}", err);

    let err = Pricer::new(reference_params(), contract, seeded(0, 1)).unwrap_err();
    assert!(err.to_string().contains("paths"), "{}", err);

    let err = Pricer::new(
        reference_params(),
        contract,
        SimulationConfig {
            steps: 0,
            ..seeded(10, 1)
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("steps"), "{}", err);
}

#[test]
fn test_config_from_json() {
    let cfg: SimulationConfig =
        serde_json::from_str(r#"{ "paths": 5000, "seed": 17, "antithetic": true }"#)
            .expect("Partial config fills defaults");
    assert_eq!(cfg.paths, 5000);
    assert_eq!(cfg.steps, 1);
    assert_eq!(cfg.batch_size, 10_000);
    assert_eq!(cfg.confidence_level, 0.95);

    let params: ModelParameters = serde_json::from_str(
        r#"{ "s0": 100, "r": 0.05, "sigma": 0.2, "lambda": 0.1,
             "mu_j": -0.1, "sigma_j": 0.15, "t": 1 }"#,
    )
    .expect("Complete parameter record");
    assert_eq!(params, reference_params());

    let contract: ContractParameters =
        serde_json::from_str(r#"{ "k": 100, "kind": "put" }"#).expect("Contract record");
    assert_eq!(contract, ContractParameters::put(100.0));

    let result = price_european(params, contract, cfg).expect("Valid configuration");
    assert!(result.flags.contains(ResultFlags::ANTITHETIC));
    assert_eq!(result.paths_used, 10_000);

    let json = serde_json::to_string(&result).expect("Serializable result");
    let back: PricingResult = serde_json::from_str(&json).expect("Round trip");
    assert_eq!(back.flags, result.flags);
    assert!((back.price - result.price).abs() < 1e-12);
    assert!(json.contains("\"reference\""));
}

#[test]
fn test_single_path_result_reads_back_from_json() {
    let result = Pricer::new(reference_params(), ContractParameters::call(100.0), seeded(1, 3))
        .unwrap()
        .run()
        .expect("One path is a valid run");
    assert!(result.std_error.is_nan());

    let json = serde_json::to_string(&result).expect("Serializable result");
    assert!(json.contains("\"std_error\":null"), "{}", json);

    let back: PricingResult = serde_json::from_str(&json).expect("Undefined statistics read back");
    assert!(back.std_error.is_nan());
    assert!(back.ci_lower.is_nan() && back.ci_upper.is_nan());
    assert!(back.flags.contains(ResultFlags::STD_ERROR_UNDEFINED));
    assert_eq!(back.samples_used, 1);
    assert!((back.price - result.price).abs() < 1e-12);
}

#[test]
fn test_zero_reference_price_has_no_relative_diff() {
    // Deterministic forward 100·e^{0.05} never reaches K = 200
    let params = ModelParameters {
        sigma: 0.0,
        lambda: 0.0,
        ..reference_params()
    };
    let result = price_european(params, ContractParameters::call(200.0), seeded(1_000, 4))
        .expect("Valid configuration");
    let reference = result.reference.expect("Series reference attached");

    assert_eq!(reference.price, 0.0);
    assert_eq!(result.price, 0.0);
    assert_eq!(reference.abs_diff, 0.0);
    assert!(reference.rel_diff.is_none());

    let json = serde_json::to_string(&result).expect("Serializable result");
    let back: PricingResult = serde_json::from_str(&json).expect("Round trip");
    assert_eq!(back.reference, result.reference);
}
