//! Period-by-period schedule construction for Price and SAC amortization

use serde::{Deserialize, Serialize};

use super::schedule::{AmortizationRow, AmortizationSchedule};

/// Balances at or below this amount are floating-point residue
pub const BALANCE_EPSILON: f64 = 1e-2;

/// Amortization system used to build the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmortizationMethod {
    /// Constant total payment (French/annuity system)
    Price,
    /// Constant principal amortization
    #[default]
    Sac,
}

impl AmortizationMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "price" | "annuity" => Some(AmortizationMethod::Price),
            "sac" | "constant-amortization" => Some(AmortizationMethod::Sac),
            _ => None,
        }
    }
}

/// Level installment of a Price schedule
///
/// Falls back to straight division when the rate is exactly zero.
pub fn price_payment(principal: f64, monthly_rate: f64, term_months: u32) -> f64 {
    if monthly_rate == 0.0 {
        return principal / term_months as f64;
    }
    principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powi(-exponent(term_months)))
}

/// Term as a `powi` exponent, saturating instead of wrapping
fn exponent(term_months: u32) -> i32 {
    i32::try_from(term_months).unwrap_or(i32::MAX)
}

/// Builds schedules for a fixed method
#[derive(Debug, Clone, Copy, Default)]
pub struct AmortizationEngine {
    method: AmortizationMethod,
}

impl AmortizationEngine {
    pub fn new(method: AmortizationMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> AmortizationMethod {
        self.method
    }

    /// Build the schedule for `term_months` installments
    pub fn build(&self, principal: f64, monthly_rate: f64, term_months: u32) -> AmortizationSchedule {
        let mut schedule = AmortizationSchedule::new();
        if term_months == 0 {
            return schedule;
        }

        let level_payment = price_payment(principal, monthly_rate, term_months);
        let level_amortization = principal / term_months as f64;
        let mut balance = principal;

        for period in 1..=term_months {
            let interest = balance * monthly_rate;
            let (payment, amortization) = match self.method {
                AmortizationMethod::Price => (level_payment, level_payment - interest),
                AmortizationMethod::Sac => (level_amortization + interest, level_amortization),
            };

            balance -= amortization;

            // Residue is recorded as zero; the running balance keeps accruing
            schedule.add_row(AmortizationRow {
                period,
                payment,
                interest,
                amortization,
                balance: if balance <= BALANCE_EPSILON { 0.0 } else { balance },
            });
        }

        schedule
    }
}
