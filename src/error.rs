//! Error types for simulation, benchmark fetching and assumption loading

use thiserror::Error;

/// Failures that abort or degrade a single simulation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid input: {field} - {reason}")]
    Validation { field: String, reason: String },

    /// `1 + annual_rate <= 0` has no real monthly equivalent
    #[error("annual rate {annual_rate} has no monthly equivalent (1 + rate must be positive)")]
    ArithmeticDomain { annual_rate: f64 },

    #[error("effective cost could not be solved: {reason}")]
    UnsolvableIrr { reason: String },

    #[error("simulation cancelled")]
    Cancelled,
}

impl SimulationError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        SimulationError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Input-class errors are the caller's to fix; the rest are computation outcomes
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SimulationError::Validation { .. } | SimulationError::ArithmeticDomain { .. }
        )
    }
}

/// Benchmark rate could not be obtained from the provider
#[derive(Debug, Error)]
pub enum RateFetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate fetch timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("rate source returned no observations")]
    Empty,

    #[error("could not parse rate value '{0}'")]
    Parse(String),
}

/// Assumption or scenario files could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown assumption parameter: {0}")]
    UnknownParameter(String),

    #[error("invalid row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: SimulationError,
    },
}

pub type Result<T> = std::result::Result<T, SimulationError>;
