// scripts/benchmark.rs
use fast_jd::analytics::merton_series::{merton_price, SeriesConfig};
use fast_jd::mc::mc_engine::{Pricer, PricingResult, SimulationConfig};
use fast_jd::mc::payoffs::ContractParameters;
use fast_jd::models::merton::{MertonModel, ModelParameters};
use fast_jd::JdResult;
use std::env;
use std::process::{Command, ExitCode};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_cores: usize,
    rust_version: String,
    rayon_threads: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_cores: num_cpus::get(),
            rust_version: Self::get_rust_version(),
            rayon_threads: rayon::current_num_threads(),
        }
    }

    fn get_rust_version() -> String {
        Command::new("rustc")
            .arg("--version")
            .output()
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
            .unwrap_or_else(|_| "Unknown Rust version".to_string())
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    paths: u64,
    time_ms: f64,
    throughput_paths_per_sec: f64,
    price: f64,
    std_error: f64,
    series_price: f64,
}

impl BenchmarkResult {
    fn from_run(name: String, run: &PricingResult, series_price: f64) -> Self {
        let time_ms = run.elapsed_ms.unwrap_or(f64::NAN);
        BenchmarkResult {
            name,
            paths: run.paths_used,
            time_ms,
            throughput_paths_per_sec: run.paths_used as f64 / (time_ms / 1000.0),
            price: run.price,
            std_error: run.std_error,
            series_price,
        }
    }

    /// Distance to the series price in standard errors
    fn z_score(&self) -> f64 {
        (self.price - self.series_price) / self.std_error
    }
}

fn reference_scenario() -> (ModelParameters, ContractParameters) {
    let params = ModelParameters {
        s0: 100.0,
        r: 0.05,
        sigma: 0.2,
        lambda: 0.1,
        mu_j: -0.1,
        sigma_j: 0.15,
        t: 1.0,
    };
    (params, ContractParameters::call(100.0))
}

fn run_convergence_benchmarks() -> JdResult<Vec<BenchmarkResult>> {
    let (params, contract) = reference_scenario();
    let series = merton_price(&MertonModel::new(params)?, &contract, &SeriesConfig::default())?;
    println!(
        "Merton series price: {:.6} ({} terms)",
        series.price, series.terms
    );

    let mut results = Vec::new();
    for &paths in &[10_000, 100_000, 1_000_000] {
        println!("Running benchmarks with {} paths...", paths);

        for antithetic in [false, true] {
            let cfg = SimulationConfig {
                // Equal path budget for both variants
                paths: if antithetic { paths / 2 } else { paths },
                seed: Some(42),
                antithetic,
                ..Default::default()
            };
            let run = Pricer::new(params, contract, cfg)?.run()?;
            let name = format!(
                "Merton Call{} ({}k paths)",
                if antithetic { " AV" } else { "" },
                paths / 1000
            );
            results.push(BenchmarkResult::from_run(name, &run, series.price));
        }
    }

    Ok(results)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("fast-jd Convergence Benchmark");
    println!("=============================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU Cores: {}", system_info.cpu_cores);
    println!("  Rust Version: {}", system_info.rust_version);
    println!("  Rayon Threads: {}", system_info.rayon_threads);
    println!(
        "  Started: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    let results = match run_convergence_benchmarks() {
        Ok(results) => results,
        Err(e) => {
            tracing::error!(error = %e, "benchmark aborted");
            return ExitCode::FAILURE;
        }
    };

    println!("\n{:=<96}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<96}", "");
    println!(
        "{:<30} {:>9} {:>11} {:>14} {:>10} {:>9} {:>10} {:>7}",
        "Benchmark", "Paths", "Time (ms)", "Throughput", "Price", "SE", "Series", "z"
    );
    println!("{:-<96}", "");

    for result in &results {
        println!(
            "{:<30} {:>9} {:>11.2} {:>14.0} {:>10.4} {:>9.5} {:>10.4} {:>7.2}",
            result.name,
            result.paths,
            result.time_ms,
            result.throughput_paths_per_sec,
            result.price,
            result.std_error,
            result.series_price,
            result.z_score()
        );
    }

    println!("{:=<96}", "");
    println!("\nTo reproduce these results:");
    println!("1. Use Rust version: {}", system_info.rust_version);
    println!("2. Run: cargo run --bin benchmark --release");
    println!("3. Set RUST_LOG=debug for per-batch progress");

    ExitCode::SUCCESS
}
