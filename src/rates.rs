//! Interest rate derivation from program cost factors
//!
//! Each percentage becomes a multiplicative factor `1 + pct/100`; the annual
//! rate is the product of the factors minus one. A negative annual rate is a
//! legitimate subsidy outcome and is passed through unchanged.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::params::{OperationKind, OperationParameters};

/// Convert a percentage to its multiplicative factor
pub fn pct_factor(pct: f64) -> f64 {
    1.0 + pct / 100.0
}

/// Annual nominal rate as a decimal (0.1186 for 11.86%)
///
/// `agent_factor_pct` only enters indirect operations; for direct ones it is ignored.
pub fn derive_annual_rate(
    operation_kind: OperationKind,
    cost_factor_pct: f64,
    program_rate_pct: f64,
    agent_factor_pct: Option<f64>,
) -> f64 {
    let base = pct_factor(cost_factor_pct) * pct_factor(program_rate_pct);
    match operation_kind {
        OperationKind::Direct => base - 1.0,
        OperationKind::Indirect => base * pct_factor(agent_factor_pct.unwrap_or(0.0)) - 1.0,
    }
}

/// Equivalent monthly rate: (1 + annual)^(1/12) - 1
pub fn monthly_from_annual(annual_rate: f64) -> Result<f64> {
    if !annual_rate.is_finite() || 1.0 + annual_rate <= 0.0 {
        return Err(SimulationError::ArithmeticDomain { annual_rate });
    }
    Ok((1.0 + annual_rate).powf(1.0 / 12.0) - 1.0)
}

/// Equivalent annual rate: (1 + monthly)^12 - 1
pub fn annual_from_monthly(monthly_rate: f64) -> f64 {
    (1.0 + monthly_rate).powi(12) - 1.0
}

/// Annual and monthly rate pair used by a simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedRates {
    pub annual_rate: f64,
    pub monthly_rate: f64,
}

impl DerivedRates {
    pub fn from_params(params: &OperationParameters) -> Result<Self> {
        let annual_rate = derive_annual_rate(
            params.operation_kind,
            params.cost_factor_pct,
            params.program_rate_pct,
            params.effective_agent_factor_pct(),
        );
        let monthly_rate = monthly_from_annual(annual_rate)?;
        Ok(Self { annual_rate, monthly_rate })
    }
}
