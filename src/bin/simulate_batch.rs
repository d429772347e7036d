//! Run every scenario in a CSV file against one benchmark rate
//!
//! Outputs one summary row per scenario; rows that fail validation carry
//! the error text instead of figures.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use log::info;
use serde::Serialize;

use procapcred_simulator::{
    benchmark::{resolve_benchmark_from, BcbSelicProvider},
    params::{input::parse_percentage, load_scenarios},
    Assumptions, BenchmarkRate, OperationParameters, SimulationConfig, SimulationError, SimulationResult,
    Simulator,
};

#[derive(Debug, Parser)]
#[command(name = "simulate_batch", about = "Simulate a CSV of credit scenarios in parallel")]
struct Args {
    /// Scenarios CSV
    #[arg(long, default_value = "data/scenarios.csv")]
    scenarios: PathBuf,

    /// Summary output CSV
    #[arg(long, default_value = "batch_simulation_output.csv")]
    output: PathBuf,

    /// Use this benchmark rate (percent) instead of fetching it
    #[arg(long)]
    selic: Option<String>,

    /// Assumption overrides CSV
    #[arg(long)]
    assumptions: Option<PathBuf>,

    /// Closed-form CET with charges added on top
    #[arg(long)]
    legacy_cost: bool,

    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,
}

/// One line of the batch summary
#[derive(Debug, Serialize)]
struct SummaryRow {
    scenario: usize,
    principal: f64,
    term_months: u32,
    operation_kind: String,
    annual_rate_pct: Option<f64>,
    cet_pct: Option<f64>,
    cost_method: Option<String>,
    total_financing_cost: Option<f64>,
    benchmark_return: Option<f64>,
    savings_yield: Option<f64>,
    net_result: Option<f64>,
    outcome: Option<String>,
    error: Option<String>,
}

impl SummaryRow {
    fn new(scenario: usize, params: &OperationParameters, result: &Result<SimulationResult, SimulationError>) -> Self {
        let mut row = SummaryRow {
            scenario,
            principal: params.principal,
            term_months: params.term_months,
            operation_kind: format!("{:?}", params.operation_kind),
            annual_rate_pct: None,
            cet_pct: None,
            cost_method: None,
            total_financing_cost: None,
            benchmark_return: None,
            savings_yield: None,
            net_result: None,
            outcome: None,
            error: None,
        };

        match result {
            Ok(sim) => {
                row.annual_rate_pct = Some(sim.annual_rate * 100.0);
                row.cet_pct = Some(sim.cost.effective_annual_rate * 100.0);
                row.cost_method = Some(format!("{:?}", sim.cost.method));
                row.total_financing_cost = Some(sim.cost.total_financing_cost);
                row.benchmark_return = Some(sim.comparison.benchmark_return);
                row.savings_yield = Some(sim.comparison.alternative_savings_yield);
                row.net_result = Some(sim.comparison.net_result);
                row.outcome = Some(format!("{:?}", sim.comparison.outcome));
            }
            Err(err) => row.error = Some(err.to_string()),
        }
        row
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    println!("Loading scenarios from {}...", args.scenarios.display());
    let scenarios = load_scenarios(&args.scenarios)
        .with_context(|| format!("loading scenarios from {}", args.scenarios.display()))?;
    println!("Loaded {} scenarios in {:?}", scenarios.len(), start.elapsed());

    let assumptions = match &args.assumptions {
        Some(path) => Assumptions::from_csv_path(path)?,
        None => Assumptions::canonical(),
    };
    let mut config = if args.legacy_cost {
        SimulationConfig::legacy()
    } else {
        SimulationConfig::default()
    };
    config.fetch_timeout = Duration::from_secs(args.timeout_secs);

    let benchmark = match &args.selic {
        Some(raw) => BenchmarkRate::supplied(parse_percentage("selic", raw)?),
        None => {
            let provider = BcbSelicProvider::new(config.fetch_timeout);
            resolve_benchmark_from(&provider, config.fetch_timeout, assumptions.default_benchmark_pct).await
        }
    };
    info!("benchmark for batch: {}% ({:?})", benchmark.annual_pct, benchmark.source);

    let simulator = Simulator::new(assumptions, config);

    println!("Running simulations...");
    let sim_start = Instant::now();
    let results = simulator.run_batch(&scenarios, &benchmark);
    println!("Simulations complete in {:?}", sim_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut failed = 0;
    for (idx, (params, result)) in scenarios.iter().zip(&results).enumerate() {
        if result.is_err() {
            failed += 1;
        }
        writer.serialize(SummaryRow::new(idx + 1, params, result))?;
    }
    writer.flush()?;

    println!("Output written to {}", args.output.display());
    println!(
        "\nBatch Summary:\n  Scenarios: {}\n  Failed:    {}\n  Benchmark: {:.2}%{}",
        scenarios.len(),
        failed,
        benchmark.annual_pct,
        if benchmark.used_fallback() { " (default)" } else { "" }
    );
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}
