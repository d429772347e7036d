//! Net benefit of taking the credit versus the alternatives
//!
//! The principal committed as paid-in capital earns the benchmark rate pro
//! rata (simple, not compounded). The savings alternative compounds monthly.

use serde::{Deserialize, Serialize};

/// Three-way verdict handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Capital remuneration exceeds the cost of the credit
    Favorable,
    /// Small loss within the break-even band
    BreakEven,
    Unfavorable,
}

impl Outcome {
    /// Classify a net result given the break-even band width
    pub fn classify(net_result: f64, break_even_band: f64) -> Self {
        if net_result > 0.0 {
            Outcome::Favorable
        } else if net_result >= -break_even_band.abs() {
            Outcome::BreakEven
        } else {
            Outcome::Unfavorable
        }
    }
}

/// Return on committing the principal as capital at the benchmark rate
pub fn benchmark_return(principal: f64, benchmark_annual_pct: f64, term_months: u32) -> f64 {
    principal * (benchmark_annual_pct / 100.0) * (term_months as f64 / 12.0)
}

/// Interest earned by leaving the principal in savings
pub fn savings_yield(principal: f64, monthly_rate: f64, term_months: u32) -> f64 {
    principal * (1.0 + monthly_rate).powi(i32::try_from(term_months).unwrap_or(i32::MAX)) - principal
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub benchmark_return: f64,
    pub alternative_savings_yield: f64,
    /// Benchmark return minus total financing cost
    pub net_result: f64,
    pub outcome: Outcome,
}

/// Compares the credit against the capital and savings alternatives
#[derive(Debug, Clone, Copy)]
pub struct BenefitComparator {
    pub savings_monthly_rate: f64,
    pub break_even_band: f64,
}

impl BenefitComparator {
    pub fn new(savings_monthly_rate: f64, break_even_band: f64) -> Self {
        Self {
            savings_monthly_rate,
            break_even_band,
        }
    }

    pub fn compare(
        &self,
        principal: f64,
        term_months: u32,
        benchmark_annual_pct: f64,
        total_financing_cost: f64,
    ) -> Comparison {
        let benchmark_return = benchmark_return(principal, benchmark_annual_pct, term_months);
        let net_result = benchmark_return - total_financing_cost;

        Comparison {
            benchmark_return,
            alternative_savings_yield: savings_yield(principal, self.savings_monthly_rate, term_months),
            net_result,
            outcome: Outcome::classify(net_result, self.break_even_band),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{BREAK_EVEN_BAND, BREAK_EVEN_BAND_WIDE, SAVINGS_MONTHLY_RATE};
    use approx::assert_relative_eq;

    #[test]
    fn test_benchmark_return_is_simple_interest() {
        assert_relative_eq!(benchmark_return(10_000.0, 10.5, 12), 1_050.0, max_relative = 1e-12);
        assert_relative_eq!(benchmark_return(10_000.0, 10.5, 24), 2_100.0, max_relative = 1e-12);
        assert_relative_eq!(benchmark_return(10_000.0, 10.5, 6), 525.0, max_relative = 1e-12);
    }

    #[test]
    fn test_savings_compounds() {
        let yield_12 = savings_yield(10_000.0, SAVINGS_MONTHLY_RATE, 12);
        assert_relative_eq!(yield_12, 616.778118644983, max_relative = 1e-9);
        assert!(yield_12 > 10_000.0 * 0.005 * 12.0);
    }

    #[test]
    fn test_classification_bands() {
        assert_eq!(Outcome::classify(0.01, BREAK_EVEN_BAND), Outcome::Favorable);
        assert_eq!(Outcome::classify(0.0, BREAK_EVEN_BAND), Outcome::BreakEven);
        assert_eq!(Outcome::classify(-30.0, BREAK_EVEN_BAND), Outcome::BreakEven);
        assert_eq!(Outcome::classify(-30.0, BREAK_EVEN_BAND_WIDE), Outcome::BreakEven);
        assert_eq!(Outcome::classify(-50.0, BREAK_EVEN_BAND), Outcome::BreakEven);
        assert_eq!(Outcome::classify(-75.0, BREAK_EVEN_BAND), Outcome::Unfavorable);
        assert_eq!(Outcome::classify(-75.0, BREAK_EVEN_BAND_WIDE), Outcome::BreakEven);
        assert_eq!(Outcome::classify(-100.01, BREAK_EVEN_BAND_WIDE), Outcome::Unfavorable);
    }

    #[test]
    fn test_compare() {
        let comparator = BenefitComparator::new(SAVINGS_MONTHLY_RATE, BREAK_EVEN_BAND);
        let comparison = comparator.compare(10_000.0, 12, 10.5, 645.1);
        assert_relative_eq!(comparison.net_result, 404.9, max_relative = 1e-9);
        assert_eq!(comparison.outcome, Outcome::Favorable);

        let costly = comparator.compare(10_000.0, 12, 10.5, 1_200.0);
        assert_eq!(costly.outcome, Outcome::Unfavorable);
    }
}
