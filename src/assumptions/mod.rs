//! Regulatory and market assumptions shared by every simulation

mod tax;
pub mod loader;

pub use tax::{
    taxed_days, DailyTaxRate, TaxCalculator, TaxRates, DAILY_TAX_RATE_BUSINESS, DAILY_TAX_RATE_INDIVIDUAL,
    DAILY_TAX_RATE_LEGACY, INSURANCE_MONTHLY_RATE, MAX_TAXED_DAYS, TAX_SURCHARGE_RATE,
};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Savings account yield, roughly 0.5% per month
pub const SAVINGS_MONTHLY_RATE: f64 = 0.005;

/// Benchmark (SELIC) used when the live rate cannot be fetched, in percent
pub const DEFAULT_BENCHMARK_PCT: f64 = 10.5;

/// Losses up to this amount still count as break-even
pub const BREAK_EVEN_BAND: f64 = 50.0;

/// Wider break-even band used by a later revision of the comparison
pub const BREAK_EVEN_BAND_WIDE: f64 = 100.0;

/// Container for all simulation assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    pub tax: TaxRates,

    /// Monthly yield of the savings alternative
    pub savings_monthly_rate: f64,

    /// Annual benchmark rate in percent, used as fallback
    pub default_benchmark_pct: f64,

    /// Width of the break-even band below zero, in currency units
    pub break_even_band: f64,
}

impl Assumptions {
    /// Current policy: tax rate split by client class
    pub fn canonical() -> Self {
        Self {
            tax: TaxRates::by_client_class(),
            savings_monthly_rate: SAVINGS_MONTHLY_RATE,
            default_benchmark_pct: DEFAULT_BENCHMARK_PCT,
            break_even_band: BREAK_EVEN_BAND,
        }
    }

    /// Earlier policy with a single daily tax rate
    pub fn legacy() -> Self {
        Self {
            tax: TaxRates::legacy_flat(),
            ..Self::canonical()
        }
    }

    /// Canonical assumptions with overrides from a `parameter,value` CSV file
    pub fn from_csv_path(path: &Path) -> Result<Self, ConfigError> {
        let mut assumptions = Self::canonical();
        loader::apply_overrides(&mut assumptions, path)?;
        Ok(assumptions)
    }

    pub fn tax_calculator(&self) -> TaxCalculator {
        TaxCalculator::new(self.tax)
    }
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ClientClass;

    #[test]
    fn test_legacy_differs_only_in_tax_rate() {
        let canonical = Assumptions::canonical();
        let legacy = Assumptions::legacy();

        assert_eq!(legacy.break_even_band, canonical.break_even_band);
        assert_eq!(legacy.tax.surcharge_rate, canonical.tax.surcharge_rate);
        assert_eq!(legacy.tax.daily_rate.rate_for(ClientClass::Individual), DAILY_TAX_RATE_LEGACY);
        assert_eq!(
            canonical.tax.daily_rate.rate_for(ClientClass::Individual),
            DAILY_TAX_RATE_INDIVIDUAL
        );
    }
}
