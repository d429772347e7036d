//! Internal Rate of Return (IRR) calculation
//!
//! Used to find the periodic rate that equates the net amount disbursed to
//! the discounted installments.

/// Lower end of the bisection bracket (periodic rate)
pub const IRR_LOWER_BOUND: f64 = 0.0;

/// Upper end of the bisection bracket, 100% per period
pub const IRR_UPPER_BOUND: f64 = 1.0;

pub const IRR_MAX_ITERATIONS: u32 = 100;

/// Convergence criterion on |NPV|
pub const IRR_NPV_TOLERANCE: f64 = 1e-7;

/// Calculate NPV at a given periodic rate
///
/// `cashflows[0]` is undiscounted; `cashflows[t]` is discounted by `(1 + rate)^t`.
pub fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Periodic IRR by bisection over [0, 1]
///
/// Returns `None` when NPV does not change sign across the bracket or the
/// iteration budget runs out before |NPV| drops under the tolerance.
pub fn calculate_irr(cashflows: &[f64]) -> Option<f64> {
    if cashflows.is_empty() {
        return None;
    }

    let mut low = IRR_LOWER_BOUND;
    let mut high = IRR_UPPER_BOUND;
    let mut npv_low = npv_at_rate(cashflows, low);
    let npv_high = npv_at_rate(cashflows, high);

    // A root must be bracketed; same-sign ends mean no rate in range
    if !(npv_low * npv_high < 0.0) {
        return None;
    }

    for _ in 0..IRR_MAX_ITERATIONS {
        let mid = (low + high) / 2.0;
        let npv_mid = npv_at_rate(cashflows, mid);

        // Bracket collapsed to adjacent floats: mid is as close as f64 gets
        if npv_mid.abs() < IRR_NPV_TOLERANCE || mid <= low || mid >= high {
            return Some(mid);
        }

        if npv_mid * npv_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    None
}

/// Annual IRR from monthly cashflows
pub fn calculate_annual_irr(cashflows: &[f64]) -> Option<f64> {
    calculate_irr(cashflows).map(|monthly| (1.0 + monthly).powi(12) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::price_payment;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_recovers_known_rate() {
        // Net amount disbursed after a known tax, 12 level payments at r0
        let r0 = 0.0125;
        let net = 10_000.0 - 185.6;
        let payment = price_payment(net, r0, 12);

        let mut cashflows = vec![net];
        cashflows.extend(vec![-payment; 12]);

        let irr = calculate_irr(&cashflows).unwrap();
        assert_abs_diff_eq!(irr, r0, epsilon = 1e-6);
    }

    #[test]
    fn test_simple_irr() {
        // Receive 1000, repay 1100 after 12 months: 10% annual
        let mut cashflows = vec![1000.0];
        cashflows.extend(vec![0.0; 11]);
        cashflows.push(-1100.0);

        let annual = calculate_annual_irr(&cashflows).unwrap();
        assert_abs_diff_eq!(annual, 0.10, epsilon = 1e-6);
    }

    #[test]
    fn test_no_sign_change_is_not_zero() {
        let cashflows = vec![1000.0, 100.0, 100.0];
        assert_eq!(calculate_irr(&cashflows), None);

        let outflows = vec![-1000.0, -100.0, -100.0];
        assert_eq!(calculate_irr(&outflows), None);
    }

    #[test]
    fn test_rate_outside_bracket_is_unsolvable() {
        // Repaying less than received needs a negative rate
        let cashflows = vec![1000.0, -400.0, -400.0];
        assert_eq!(calculate_irr(&cashflows), None);
    }

    #[test]
    fn test_large_flows_resolve_at_float_precision() {
        // |NPV| near the root is never under the tolerance at this scale
        let irr = calculate_irr(&[1e12, -1.1e12]).unwrap();
        assert_abs_diff_eq!(irr, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_cashflows() {
        assert_eq!(calculate_irr(&[]), None);
    }

    #[test]
    fn test_npv_at_zero_is_sum() {
        let cashflows = vec![900.0, -500.0, -500.0];
        assert_abs_diff_eq!(npv_at_rate(&cashflows, 0.0), -100.0, epsilon = 1e-12);
    }
}
