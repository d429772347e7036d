//! CSV-based assumption overrides
//!
//! The file holds `parameter,value` rows; parameters not listed keep their
//! canonical value.

use std::fs::File;
use std::path::Path;

use log::debug;

use super::{Assumptions, DailyTaxRate};
use crate::error::{ConfigError, SimulationError};

/// Default location of the overrides file
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions.csv";

#[derive(Debug, serde::Deserialize)]
struct OverrideRow {
    parameter: String,
    value: String,
}

/// Apply overrides from a CSV file
pub fn apply_overrides(assumptions: &mut Assumptions, path: &Path) -> Result<(), ConfigError> {
    let file = File::open(path)?;
    apply_overrides_from_reader(assumptions, file)
}

/// Apply overrides from any reader
pub fn apply_overrides_from_reader<R: std::io::Read>(
    assumptions: &mut Assumptions,
    reader: R,
) -> Result<(), ConfigError> {
    let mut reader = csv::Reader::from_reader(reader);

    for (idx, result) in reader.deserialize().enumerate() {
        let row: OverrideRow = result?;
        let parameter = row.parameter.trim();
        let value = parse_value(parameter, &row.value)
            .map_err(|source| ConfigError::InvalidRow { row: idx + 1, source })?;
        apply(assumptions, parameter, value)?;
        debug!("assumption override {} = {}", parameter, value);
    }

    Ok(())
}

fn parse_value(parameter: &str, raw: &str) -> Result<f64, SimulationError> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SimulationError::validation(parameter, format!("'{}' is not a number", raw)))
}

fn apply(assumptions: &mut Assumptions, parameter: &str, value: f64) -> Result<(), ConfigError> {
    let (individual, business) = match assumptions.tax.daily_rate {
        DailyTaxRate::Flat(rate) => (rate, rate),
        DailyTaxRate::ByClientClass { individual, business } => (individual, business),
    };

    match parameter {
        "daily_tax_rate" => assumptions.tax.daily_rate = DailyTaxRate::Flat(value),
        "daily_tax_rate_individual" => {
            assumptions.tax.daily_rate = DailyTaxRate::ByClientClass { individual: value, business }
        }
        "daily_tax_rate_business" => {
            assumptions.tax.daily_rate = DailyTaxRate::ByClientClass { individual, business: value }
        }
        "tax_surcharge_rate" => assumptions.tax.surcharge_rate = value,
        "insurance_monthly_rate" => assumptions.tax.insurance_monthly_rate = value,
        "savings_monthly_rate" => assumptions.savings_monthly_rate = value,
        "default_benchmark_pct" => assumptions.default_benchmark_pct = value,
        "break_even_band" => assumptions.break_even_band = value.abs(),
        other => return Err(ConfigError::UnknownParameter(other.to_string())),
    }
    Ok(())
}
