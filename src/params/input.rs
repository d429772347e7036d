//! Normalization of user-typed monetary and percentage values
//!
//! Amounts arrive formatted for display ("R$ 1.500,50"), percentages may use a
//! decimal comma ("10,5"). Both are reduced to a plain `f64` here.

use crate::error::{Result, SimulationError};

/// Parse a monetary amount, accepting currency symbols and either separator style
///
/// Dots are thousands separators and a comma is the decimal point
/// ("1.500" is 1500). The one exception is a lone dot followed by one or two
/// digits with no comma anywhere ("2500.5", "10000.00"), read as a decimal.
pub fn parse_money(field: &str, raw: &str) -> Result<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replacen(',', ".", 1)
    } else if has_decimal_dot(&cleaned) {
        cleaned
    } else {
        cleaned.replace('.', "")
    };

    parse_number(field, raw, &normalized)
}

fn has_decimal_dot(cleaned: &str) -> bool {
    match cleaned.split_once('.') {
        Some((_, fraction)) => !fraction.contains('.') && (1..=2).contains(&fraction.len()),
        None => false,
    }
}

/// Parse a percentage typed with either decimal separator ("10,5" or "10.5")
pub fn parse_percentage(field: &str, raw: &str) -> Result<f64> {
    let normalized = raw.trim().trim_end_matches('%').trim().replace(',', ".");
    parse_number(field, raw, &normalized)
}

/// Parse a whole number of months
pub fn parse_term(field: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| SimulationError::validation(field, format!("'{}' is not a whole number of months", raw)))
}

fn parse_number(field: &str, raw: &str, normalized: &str) -> Result<f64> {
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SimulationError::validation(field, format!("'{}' is not a number", raw))),
    }
}
