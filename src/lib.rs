//! Procapcred Simulator - financial outcome of a subsidized business credit line
//!
//! This library provides:
//! - Interest rate derivation from program cost factors (direct and indirect operations)
//! - Amortization schedules under the Price and SAC systems
//! - Transaction tax (IOF) and credit insurance charges
//! - Effective annual cost (CET) by closed form or IRR bisection
//! - Comparison against capital remuneration at the benchmark rate and a savings account

pub mod error;
pub mod params;
pub mod assumptions;
pub mod rates;
pub mod amortization;
pub mod cost;
pub mod comparison;
pub mod benchmark;
pub mod simulation;

// Re-export commonly used types
pub use error::{ConfigError, RateFetchError, SimulationError};
pub use params::{ClientClass, OperationKind, OperationParameters};
pub use assumptions::Assumptions;
pub use amortization::{AmortizationMethod, AmortizationRow, AmortizationSchedule};
pub use cost::{CostBreakdown, CostStrategy};
pub use comparison::{Comparison, Outcome};
pub use benchmark::{BenchmarkRate, BenchmarkRateProvider, RateSource};
pub use simulation::{SimulationConfig, SimulationResult, Simulator};
