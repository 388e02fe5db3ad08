// demos/demo.rs
use fast_jd::mc::mc_engine::{price_european, SimulationConfig};
use fast_jd::mc::path_simulator::PathSimulator;
use fast_jd::mc::payoffs::ContractParameters;
use fast_jd::mc::statistics::PayoffAccumulator;
use fast_jd::models::merton::{Measure, MertonModel, ModelParameters};
use fast_jd::rng::RngFactory;
use fast_jd::JdResult;

fn main() -> JdResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("Running fast-jd Merton Jump-Diffusion Demo\n");

    let params = ModelParameters {
        s0: 100.0,
        r: 0.05,
        sigma: 0.2,
        lambda: 0.75,
        mu_j: -0.6,
        sigma_j: 0.25,
        t: 1.0,
    };
    let model = MertonModel::new(params)?;
    println!("Jump compensator k = {:.6}", model.compensator());

    // Terminal distribution against its closed-form moments
    let simulator = PathSimulator::new(model, 252)?;
    let factory = RngFactory::new(42);
    let paths = simulator.simulate_paths(&factory, 10_000)?;
    let terminals: PayoffAccumulator = paths.column(252).iter().copied().collect();

    println!("\nTerminal price S_T over 10 000 paths of 252 steps:");
    println!(
        "  mean     {:>10.4}  (exact {:>10.4})",
        terminals.mean(),
        model.terminal_mean(Measure::RiskNeutral)
    );
    println!(
        "  variance {:>10.4}  (exact {:>10.4})",
        terminals.variance(),
        model.terminal_variance(Measure::RiskNeutral)
    );
    println!("  first path, every 63rd step: {:?}", {
        let row = paths.row(0);
        (0..=252usize).step_by(63).map(|j| (row[j] * 100.0).round() / 100.0).collect::<Vec<_>>()
    });

    println!("\nEuropean options, 200 000 antithetic pairs:");
    println!(
        "{:<6} {:>8} {:>10} {:>10} {:>22} {:>10}",
        "Kind", "Strike", "MC", "SE", "95% CI", "Series"
    );
    for contract in [
        ContractParameters::call(90.0),
        ContractParameters::call(100.0),
        ContractParameters::put(100.0),
        ContractParameters::put(110.0),
    ] {
        let cfg = SimulationConfig {
            paths: 200_000,
            seed: Some(7),
            antithetic: true,
            ..Default::default()
        };
        let result = price_european(params, contract, cfg)?;
        let series = result.reference.map(|r| r.price).unwrap_or(f64::NAN);
        println!(
            "{:<6} {:>8.2} {:>10.4} {:>10.5} {:>22} {:>10.4}",
            format!("{:?}", contract.kind),
            contract.k,
            result.price,
            result.std_error,
            format!("[{:.4}, {:.4}]", result.ci_lower, result.ci_upper),
            series
        );
    }

    Ok(())
}
