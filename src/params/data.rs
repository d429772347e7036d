//! Operation parameters for a single credit line simulation

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Longest term accepted, fifty years of monthly installments
pub const MAX_TERM_MONTHS: u32 = 600;

/// Agent factor suggested when an indirect operation is selected
pub const DEFAULT_AGENT_FACTOR_PCT: f64 = 3.0;

/// How the credit reaches the borrower
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Contracted straight with the development bank
    Direct,
    /// Contracted through a financial agent who adds its own spread
    Indirect,
}

/// Visibility and default of the agent factor input for an operation kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub agent_factor_visible: bool,
    pub agent_factor_default: f64,
}

impl OperationKind {
    pub fn uses_agent_factor(&self) -> bool {
        matches!(self, OperationKind::Indirect)
    }

    /// Input layout the presentation layer should show for this kind
    pub fn field_layout(&self) -> FieldLayout {
        match self {
            OperationKind::Direct => FieldLayout {
                agent_factor_visible: false,
                agent_factor_default: 0.0,
            },
            OperationKind::Indirect => FieldLayout {
                agent_factor_visible: true,
                agent_factor_default: DEFAULT_AGENT_FACTOR_PCT,
            },
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" | "direta" => Ok(OperationKind::Direct),
            "indirect" | "indireta" => Ok(OperationKind::Indirect),
            other => Err(SimulationError::validation(
                "operation_kind",
                format!("unknown operation kind '{}'", other),
            )),
        }
    }
}

/// Borrower class, selects the daily transaction tax rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientClass {
    Individual,
    #[default]
    Business,
}

impl ClientClass {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "individual" | "pf" => Ok(ClientClass::Individual),
            "business" | "pj" => Ok(ClientClass::Business),
            other => Err(SimulationError::validation(
                "client_class",
                format!("unknown client class '{}'", other),
            )),
        }
    }
}

/// Immutable input to one simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationParameters {
    /// Requested amount before any deduction
    pub principal: f64,

    /// Number of monthly installments
    pub term_months: u32,

    pub operation_kind: OperationKind,

    /// Funding cost, in percent (7.0 = 7%)
    pub cost_factor_pct: f64,

    /// Development bank spread, in percent
    pub program_rate_pct: f64,

    /// Agent spread, in percent; only read for indirect operations
    #[serde(default)]
    pub agent_factor_pct: Option<f64>,

    #[serde(default)]
    pub client_class: ClientClass,
}

impl OperationParameters {
    pub fn direct(principal: f64, term_months: u32, cost_factor_pct: f64, program_rate_pct: f64) -> Self {
        Self {
            principal,
            term_months,
            operation_kind: OperationKind::Direct,
            cost_factor_pct,
            program_rate_pct,
            agent_factor_pct: None,
            client_class: ClientClass::default(),
        }
    }

    pub fn indirect(
        principal: f64,
        term_months: u32,
        cost_factor_pct: f64,
        program_rate_pct: f64,
        agent_factor_pct: f64,
    ) -> Self {
        Self {
            principal,
            term_months,
            operation_kind: OperationKind::Indirect,
            cost_factor_pct,
            program_rate_pct,
            agent_factor_pct: Some(agent_factor_pct),
            client_class: ClientClass::default(),
        }
    }

    pub fn with_client_class(mut self, client_class: ClientClass) -> Self {
        self.client_class = client_class;
        self
    }

    /// Agent factor as seen by the rate derivation (None for direct operations)
    pub fn effective_agent_factor_pct(&self) -> Option<f64> {
        if self.operation_kind.uses_agent_factor() {
            self.agent_factor_pct
        } else {
            None
        }
    }

    /// Check the parameters, reporting the first offending field
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(SimulationError::validation(
                "principal",
                format!("must be a positive amount, got {}", self.principal),
            ));
        }
        if self.term_months == 0 {
            return Err(SimulationError::validation("term_months", "must be at least one month"));
        }
        if self.term_months > MAX_TERM_MONTHS {
            return Err(SimulationError::validation(
                "term_months",
                format!("must be at most {} months, got {}", MAX_TERM_MONTHS, self.term_months),
            ));
        }
        check_finite("cost_factor_pct", self.cost_factor_pct)?;
        check_finite("program_rate_pct", self.program_rate_pct)?;

        if self.operation_kind.uses_agent_factor() {
            match self.agent_factor_pct {
                Some(pct) => check_finite("agent_factor_pct", pct)?,
                None => {
                    return Err(SimulationError::validation(
                        "agent_factor_pct",
                        "required for indirect operations",
                    ))
                }
            }
        }
        Ok(())
    }
}

fn check_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimulationError::validation(field, "must be a finite percentage"))
    }
}
