//! Procapcred Simulator CLI
//!
//! Runs one simulation from command-line inputs and prints the outcome and
//! the amortization schedule.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;

use procapcred_simulator::{
    assumptions::loader::DEFAULT_ASSUMPTIONS_PATH,
    benchmark::{resolve_benchmark_from, BcbSelicProvider},
    params::input::{parse_money, parse_percentage},
    AmortizationMethod, Assumptions, BenchmarkRate, ClientClass, OperationKind, OperationParameters, Outcome,
    SimulationConfig, SimulationResult, Simulator,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Direct,
    Indirect,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ClassArg {
    Individual,
    Business,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Price,
    Sac,
}

#[derive(Debug, Parser)]
#[command(name = "procapcred", version, about = "Simulate a subsidized credit line against capital remuneration")]
struct Cli {
    /// Requested amount, e.g. "R$ 10.000,00" or 10000
    #[arg(long)]
    principal: String,

    /// Term in months
    #[arg(long)]
    term: u32,

    #[arg(long, value_enum, default_value = "direct")]
    kind: KindArg,

    /// Funding cost factor in percent
    #[arg(long)]
    cost_factor: String,

    /// Program rate in percent
    #[arg(long)]
    program_rate: String,

    /// Agent factor in percent (indirect only; defaults to the layout default)
    #[arg(long)]
    agent_factor: Option<String>,

    #[arg(long, value_enum, default_value = "business")]
    client_class: ClassArg,

    #[arg(long, value_enum, default_value = "sac")]
    method: MethodArg,

    /// Closed-form CET with charges added on top, as in the first revision
    #[arg(long)]
    legacy_cost: bool,

    /// Use this benchmark rate (percent) instead of fetching it
    #[arg(long)]
    selic: Option<String>,

    /// Assumption overrides CSV
    #[arg(long)]
    assumptions: Option<PathBuf>,

    /// Benchmark fetch timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    /// Write the schedule to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the full result as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn params(&self) -> anyhow::Result<OperationParameters> {
        let operation_kind = match self.kind {
            KindArg::Direct => OperationKind::Direct,
            KindArg::Indirect => OperationKind::Indirect,
        };
        let agent_factor_pct = match (&self.agent_factor, operation_kind.uses_agent_factor()) {
            (Some(raw), true) => Some(parse_percentage("agent_factor_pct", raw)?),
            (None, true) => Some(operation_kind.field_layout().agent_factor_default),
            (_, false) => None,
        };

        Ok(OperationParameters {
            principal: parse_money("principal", &self.principal)?,
            term_months: self.term,
            operation_kind,
            cost_factor_pct: parse_percentage("cost_factor_pct", &self.cost_factor)?,
            program_rate_pct: parse_percentage("program_rate_pct", &self.program_rate)?,
            agent_factor_pct,
            client_class: match self.client_class {
                ClassArg::Individual => ClientClass::Individual,
                ClassArg::Business => ClientClass::Business,
            },
        })
    }

    fn config(&self) -> SimulationConfig {
        let mut config = if self.legacy_cost {
            SimulationConfig::legacy()
        } else {
            SimulationConfig::default()
        };
        config.amortization = match self.method {
            MethodArg::Price => AmortizationMethod::Price,
            MethodArg::Sac => AmortizationMethod::Sac,
        };
        config.fetch_timeout = Duration::from_secs(self.timeout_secs);
        config
    }

    fn assumptions(&self) -> anyhow::Result<Assumptions> {
        match &self.assumptions {
            Some(path) => Assumptions::from_csv_path(path)
                .with_context(|| format!("loading assumptions from {}", path.display())),
            None => {
                let default_path = PathBuf::from(DEFAULT_ASSUMPTIONS_PATH);
                if default_path.exists() {
                    info!("using assumption overrides from {}", default_path.display());
                    Ok(Assumptions::from_csv_path(&default_path)?)
                } else {
                    Ok(Assumptions::canonical())
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let params = cli.params()?;
    let config = cli.config();
    let simulator = Simulator::new(cli.assumptions()?, config.clone());

    // Inputs are checked before any network access
    params.validate()?;
    let benchmark = match &cli.selic {
        Some(raw) => BenchmarkRate::supplied(parse_percentage("selic", raw)?),
        None => {
            let provider = BcbSelicProvider::new(config.fetch_timeout);
            resolve_benchmark_from(
                &provider,
                config.fetch_timeout,
                simulator.assumptions().default_benchmark_pct,
            )
            .await
        }
    };
    let result = simulator.simulate(&params, benchmark)?;

    if let Some(path) = &cli.csv {
        write_schedule_csv(path, &result)?;
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
        if let Some(path) = &cli.csv {
            println!("\nSchedule written to: {}", path.display());
        }
    }

    Ok(())
}

fn write_schedule_csv(path: &Path, result: &SimulationResult) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in &result.schedule.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_report(result: &SimulationResult) {
    let params = &result.params;
    let cost = &result.cost;
    let comparison = &result.comparison;

    println!("Procapcred Simulation");
    println!("=====================\n");

    println!("Principal:          {:>14.2}", params.principal);
    println!("Term:               {:>14} months", params.term_months);
    println!("Operation:          {:>14}", format!("{:?}", params.operation_kind));
    println!("Annual rate:        {:>13.2}%", result.annual_rate * 100.0);
    println!("Monthly rate:       {:>13.4}%", result.monthly_rate * 100.0);
    println!(
        "Benchmark (SELIC):  {:>13.2}%{}",
        result.benchmark.annual_pct,
        if result.benchmark.used_fallback() { "  (default, live rate unavailable)" } else { "" }
    );
    println!();

    println!("Transaction tax:    {:>14.2}", cost.transaction_tax);
    println!("Insurance:          {:>14.2}", cost.insurance_premium);
    println!("Interest:           {:>14.2}", cost.total_interest);
    println!("Total cost:         {:>14.2}", cost.total_financing_cost);
    println!("Total paid:         {:>14.2}", cost.total_amount_paid);
    println!("CET (annual):       {:>13.2}%  [{:?}]", cost.effective_annual_rate * 100.0, cost.method);
    println!();

    println!("Capital return:     {:>14.2}", comparison.benchmark_return);
    println!("Savings yield:      {:>14.2}", comparison.alternative_savings_yield);
    println!("Net result:         {:>14.2}", comparison.net_result);
    println!(
        "Verdict:            {}",
        match comparison.outcome {
            Outcome::Favorable => "favorable",
            Outcome::BreakEven => "break-even",
            Outcome::Unfavorable => "unfavorable",
        }
    );

    println!("\n{:>5} {:>14} {:>14} {:>14} {:>14}", "Month", "Payment", "Interest", "Amortization", "Balance");
    println!("{}", "-".repeat(65));
    for row in &result.schedule.rows {
        println!(
            "{:>5} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
            row.period, row.payment, row.interest, row.amortization, row.balance
        );
    }
}
