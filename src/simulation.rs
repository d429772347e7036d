//! Simulation orchestrator
//!
//! Composes rate derivation, amortization, charges, effective cost and the
//! benefit comparison into one request -> result computation. The benchmark
//! rate is resolved once per run and passed by value into the math.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::amortization::{AmortizationEngine, AmortizationMethod, AmortizationSchedule};
use crate::assumptions::Assumptions;
use crate::benchmark::{resolve_benchmark, BenchmarkRate, BenchmarkRateProvider};
use crate::comparison::{BenefitComparator, Comparison};
use crate::cost::{Charges, CostBreakdown, CostStrategy, EffectiveCostSolver};
use crate::error::{Result, SimulationError};
use crate::params::OperationParameters;
use crate::rates::DerivedRates;

/// Default bound on the benchmark fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub amortization: AmortizationMethod,

    pub cost_strategy: CostStrategy,

    /// Use the closed-form rate when the IRR cannot be solved
    pub fallback_to_closed_form: bool,

    pub fetch_timeout: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            amortization: AmortizationMethod::Sac,
            cost_strategy: CostStrategy::canonical(),
            fallback_to_closed_form: true,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl SimulationConfig {
    /// Price schedule with closed-form cost and charges on top
    pub fn legacy() -> Self {
        Self {
            amortization: AmortizationMethod::Price,
            cost_strategy: CostStrategy::legacy(),
            ..Self::default()
        }
    }
}

/// Everything handed to the presentation layer for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub params: OperationParameters,
    pub benchmark: BenchmarkRate,
    pub amortization: AmortizationMethod,
    pub annual_rate: f64,
    pub monthly_rate: f64,
    pub schedule: AmortizationSchedule,
    pub cost: CostBreakdown,
    pub comparison: Comparison,
}

/// Runs simulations against a fixed set of assumptions
#[derive(Debug, Clone)]
pub struct Simulator {
    assumptions: Assumptions,
    config: SimulationConfig,
}

impl Simulator {
    pub fn new(assumptions: Assumptions, config: SimulationConfig) -> Self {
        Self { assumptions, config }
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Validate, resolve the benchmark rate, then compute
    ///
    /// Validation happens before any fetch. Fetch failures never surface here;
    /// they resolve to the default rate and are flagged on the result.
    pub async fn run<P>(&self, params: &OperationParameters, provider: &P) -> Result<SimulationResult>
    where
        P: BenchmarkRateProvider + ?Sized,
    {
        params.validate()?;
        let benchmark = resolve_benchmark(
            provider,
            self.config.fetch_timeout,
            self.assumptions.default_benchmark_pct,
        )
        .await;
        self.simulate(params, benchmark)
    }

    /// Like [`Simulator::run`], abandoned as soon as `cancel` completes
    ///
    /// Nothing from a cancelled run is kept.
    pub async fn run_until_cancelled<P, C>(
        &self,
        params: &OperationParameters,
        provider: &P,
        cancel: C,
    ) -> Result<SimulationResult>
    where
        P: BenchmarkRateProvider + ?Sized,
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                debug!("simulation cancelled before completion");
                Err(SimulationError::Cancelled)
            }
            result = self.run(params, provider) => result,
        }
    }

    /// Synchronous computation with an already-resolved benchmark rate
    pub fn simulate(&self, params: &OperationParameters, benchmark: BenchmarkRate) -> Result<SimulationResult> {
        params.validate()?;

        let rates = DerivedRates::from_params(params)?;
        debug!(
            "rates derived: annual {:.6}, monthly {:.8}",
            rates.annual_rate, rates.monthly_rate
        );

        let schedule = AmortizationEngine::new(self.config.amortization).build(
            params.principal,
            rates.monthly_rate,
            params.term_months,
        );

        let tax = self.assumptions.tax_calculator();
        let charges = Charges {
            transaction_tax: tax.transaction_tax(params.principal, params.term_months, params.client_class),
            insurance_premium: tax.insurance_premium(params.principal, params.term_months),
        };

        let cost = self.solve_cost(params.principal, &schedule, charges)?;

        let comparison = BenefitComparator::new(self.assumptions.savings_monthly_rate, self.assumptions.break_even_band)
            .compare(
                params.principal,
                params.term_months,
                benchmark.annual_pct,
                cost.total_financing_cost,
            );

        Ok(SimulationResult {
            params: params.clone(),
            benchmark,
            amortization: self.config.amortization,
            annual_rate: rates.annual_rate,
            monthly_rate: rates.monthly_rate,
            schedule,
            cost,
            comparison,
        })
    }

    /// Run many parameter sets against one benchmark rate, in parallel
    pub fn run_batch(&self, params: &[OperationParameters], benchmark: &BenchmarkRate) -> Vec<Result<SimulationResult>> {
        params
            .par_iter()
            .map(|p| self.simulate(p, benchmark.clone()))
            .collect()
    }

    fn solve_cost(&self, principal: f64, schedule: &AmortizationSchedule, charges: Charges) -> Result<CostBreakdown> {
        let solver = EffectiveCostSolver::new(self.config.cost_strategy);
        match solver.solve(principal, schedule, charges) {
            Err(SimulationError::UnsolvableIrr { reason }) if self.config.fallback_to_closed_form => {
                warn!("IRR unsolvable ({}), reporting closed-form CET", reason);
                solver
                    .closed_form(principal, schedule, charges)
                    .map(CostBreakdown::as_fallback)
            }
            other => other,
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(Assumptions::canonical(), SimulationConfig::default())
    }
}
