//! Mandatory charges on the credit: transaction tax (IOF) and credit insurance

use serde::{Deserialize, Serialize};

use crate::params::ClientClass;

/// Daily tax rate for individuals (0.0082% per day)
pub const DAILY_TAX_RATE_INDIVIDUAL: f64 = 0.000082;

/// Daily tax rate for businesses (0.0041% per day)
pub const DAILY_TAX_RATE_BUSINESS: f64 = 0.000041;

/// Flat daily rate used before the client class split existed
pub const DAILY_TAX_RATE_LEGACY: f64 = 0.000041;

/// One-off surcharge applied on every operation (0.38%)
pub const TAX_SURCHARGE_RATE: f64 = 0.0038;

/// Insurance premium per month of term (0.066%)
pub const INSURANCE_MONTHLY_RATE: f64 = 0.00066;

/// Daily accrual stops after one year
pub const MAX_TAXED_DAYS: u32 = 365;

/// Months are counted as 30 days
pub const DAYS_PER_MONTH: u32 = 30;

/// How the daily tax rate is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DailyTaxRate {
    /// Single rate regardless of client class
    Flat(f64),
    /// Separate rates for individuals and businesses
    ByClientClass { individual: f64, business: f64 },
}

impl DailyTaxRate {
    pub fn rate_for(&self, client_class: ClientClass) -> f64 {
        match *self {
            DailyTaxRate::Flat(rate) => rate,
            DailyTaxRate::ByClientClass { individual, business } => match client_class {
                ClientClass::Individual => individual,
                ClientClass::Business => business,
            },
        }
    }
}

/// Rates used to compute tax and insurance on an operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxRates {
    pub daily_rate: DailyTaxRate,
    pub surcharge_rate: f64,
    /// Zero disables insurance without changing the formula
    pub insurance_monthly_rate: f64,
}

impl TaxRates {
    pub fn by_client_class() -> Self {
        Self {
            daily_rate: DailyTaxRate::ByClientClass {
                individual: DAILY_TAX_RATE_INDIVIDUAL,
                business: DAILY_TAX_RATE_BUSINESS,
            },
            surcharge_rate: TAX_SURCHARGE_RATE,
            insurance_monthly_rate: INSURANCE_MONTHLY_RATE,
        }
    }

    pub fn legacy_flat() -> Self {
        Self {
            daily_rate: DailyTaxRate::Flat(DAILY_TAX_RATE_LEGACY),
            ..Self::by_client_class()
        }
    }
}

impl Default for TaxRates {
    fn default() -> Self {
        Self::by_client_class()
    }
}

/// Number of days on which the daily tax accrues
pub fn taxed_days(term_months: u32) -> u32 {
    term_months.saturating_mul(DAYS_PER_MONTH).min(MAX_TAXED_DAYS)
}

/// Pure tax and insurance calculator
#[derive(Debug, Clone, Copy)]
pub struct TaxCalculator {
    rates: TaxRates,
}

impl TaxCalculator {
    pub fn new(rates: TaxRates) -> Self {
        Self { rates }
    }

    /// Transaction tax: daily accrual capped at one year plus the fixed surcharge
    pub fn transaction_tax(&self, principal: f64, term_months: u32, client_class: ClientClass) -> f64 {
        let daily_rate = self.rates.daily_rate.rate_for(client_class);
        let daily = principal * daily_rate * taxed_days(term_months) as f64;
        let surcharge = principal * self.rates.surcharge_rate;
        daily + surcharge
    }

    /// Insurance premium, linear in term
    pub fn insurance_premium(&self, principal: f64, term_months: u32) -> f64 {
        principal * self.rates.insurance_monthly_rate * term_months as f64
    }
}
