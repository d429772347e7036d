//! Total and effective annual cost (CET) of the credit
//!
//! Two strategies are supported: a closed-form approximation from the ratio of
//! total paid to principal, and an exact solve of the IRR of the realized net
//! cashflows. Taxes and insurance can either be withheld from the amount
//! disbursed or paid on top of the installments.

use serde::{Deserialize, Serialize};

use super::irr::calculate_irr;
use crate::amortization::AmortizationSchedule;
use crate::error::{Result, SimulationError};

/// How the effective annual rate is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostMethod {
    /// Bisection IRR over net cashflows
    Irr,
    /// (total paid / base)^(12/n) - 1
    ClosedForm,
}

/// Where tax and insurance are settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeTreatment {
    /// Withheld from the principal at disbursement
    DeductedUpfront,
    /// Paid by the borrower in addition to the installments
    AddedOnTop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostStrategy {
    pub method: CostMethod,
    pub charges: ChargeTreatment,
}

impl CostStrategy {
    /// IRR over net disbursement
    pub fn canonical() -> Self {
        Self {
            method: CostMethod::Irr,
            charges: ChargeTreatment::DeductedUpfront,
        }
    }

    /// Closed form with charges on top, as the first revision computed it
    pub fn legacy() -> Self {
        Self {
            method: CostMethod::ClosedForm,
            charges: ChargeTreatment::AddedOnTop,
        }
    }
}

impl Default for CostStrategy {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Method that produced `effective_annual_rate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    Irr,
    ClosedForm,
    /// IRR was requested but could not be solved
    ClosedFormFallback,
}

/// Mandatory charges on the operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Charges {
    pub transaction_tax: f64,
    pub insurance_premium: f64,
}

impl Charges {
    pub fn total(&self) -> f64 {
        self.transaction_tax + self.insurance_premium
    }
}

/// Cost of the operation, derived once per simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub transaction_tax: f64,
    pub insurance_premium: f64,
    /// Interest portion of the installments
    pub total_interest: f64,
    /// What the borrower actually receives
    pub net_disbursed: f64,
    /// Everything paid beyond the principal: interest, tax and insurance
    pub total_financing_cost: f64,
    pub total_amount_paid: f64,
    pub effective_annual_rate: f64,
    /// Closed-form rate under the same charge treatment, for comparison
    pub approximate_annual_rate: f64,
    pub method: CostSource,
}

/// Computes cost breakdowns under a fixed strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectiveCostSolver {
    strategy: CostStrategy,
}

/// Amounts shared by both methods for one charge treatment
struct Settlement {
    net_disbursed: f64,
    total_amount_paid: f64,
}

impl EffectiveCostSolver {
    pub fn new(strategy: CostStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> CostStrategy {
        self.strategy
    }

    /// Solve with the configured method
    pub fn solve(&self, principal: f64, schedule: &AmortizationSchedule, charges: Charges) -> Result<CostBreakdown> {
        match self.strategy.method {
            CostMethod::Irr => self.irr(principal, schedule, charges),
            CostMethod::ClosedForm => self.closed_form(principal, schedule, charges),
        }
    }

    /// Closed-form approximation from total paid over the amount received
    pub fn closed_form(&self, principal: f64, schedule: &AmortizationSchedule, charges: Charges) -> Result<CostBreakdown> {
        let settlement = self.settle(principal, schedule, charges)?;
        let rate = approximate_rate(&settlement, schedule.len() as u32);
        Ok(self.breakdown(schedule, charges, settlement, rate, rate, CostSource::ClosedForm))
    }

    /// Exact effective rate from the IRR of the net cashflows
    pub fn irr(&self, principal: f64, schedule: &AmortizationSchedule, charges: Charges) -> Result<CostBreakdown> {
        let settlement = self.settle(principal, schedule, charges)?;
        let cashflows = self.cashflows(principal, schedule, charges);

        let monthly = calculate_irr(&cashflows).ok_or_else(|| SimulationError::UnsolvableIrr {
            reason: "net present value does not change sign between 0% and 100% per month".to_string(),
        })?;
        let annual = (1.0 + monthly).powi(12) - 1.0;
        let approximate = approximate_rate(&settlement, schedule.len() as u32);

        Ok(self.breakdown(schedule, charges, settlement, annual, approximate, CostSource::Irr))
    }

    /// Borrower cashflows: inflow at t=0, installments as outflows
    pub fn cashflows(&self, principal: f64, schedule: &AmortizationSchedule, charges: Charges) -> Vec<f64> {
        let mut flows = Vec::with_capacity(schedule.len() + 1);
        match self.strategy.charges {
            ChargeTreatment::DeductedUpfront => {
                flows.push(principal - charges.total());
                flows.extend(schedule.payments().map(|p| -p));
            }
            ChargeTreatment::AddedOnTop => {
                flows.push(principal);
                flows.extend(schedule.payments().map(|p| -p));
                // Charges settled alongside the first installment
                if let Some(first) = flows.get_mut(1) {
                    *first -= charges.total();
                }
            }
        }
        flows
    }

    fn settle(&self, principal: f64, schedule: &AmortizationSchedule, charges: Charges) -> Result<Settlement> {
        let installments = schedule.total_paid();
        let settlement = match self.strategy.charges {
            ChargeTreatment::DeductedUpfront => Settlement {
                net_disbursed: principal - charges.total(),
                total_amount_paid: installments,
            },
            ChargeTreatment::AddedOnTop => Settlement {
                net_disbursed: principal,
                total_amount_paid: installments + charges.total(),
            },
        };

        if settlement.net_disbursed <= 0.0 {
            return Err(SimulationError::validation(
                "principal",
                "tax and insurance consume the whole amount",
            ));
        }
        Ok(settlement)
    }

    fn breakdown(
        &self,
        schedule: &AmortizationSchedule,
        charges: Charges,
        settlement: Settlement,
        effective_annual_rate: f64,
        approximate_annual_rate: f64,
        method: CostSource,
    ) -> CostBreakdown {
        CostBreakdown {
            transaction_tax: charges.transaction_tax,
            insurance_premium: charges.insurance_premium,
            total_interest: schedule.total_interest(),
            net_disbursed: settlement.net_disbursed,
            total_financing_cost: settlement.total_amount_paid - settlement.net_disbursed,
            total_amount_paid: settlement.total_amount_paid,
            effective_annual_rate,
            approximate_annual_rate,
            method,
        }
    }
}

fn approximate_rate(settlement: &Settlement, term_months: u32) -> f64 {
    if term_months == 0 {
        return 0.0;
    }
    (settlement.total_amount_paid / settlement.net_disbursed).powf(12.0 / term_months as f64) - 1.0
}

impl CostBreakdown {
    /// Replace an unsolvable IRR with the closed-form rate
    pub fn as_fallback(mut self) -> Self {
        self.effective_annual_rate = self.approximate_annual_rate;
        self.method = CostSource::ClosedFormFallback;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::{AmortizationEngine, AmortizationMethod};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const MONTHLY: f64 = 0.009751304859252574;

    fn example_schedule() -> AmortizationSchedule {
        AmortizationEngine::new(AmortizationMethod::Price).build(10_000.0, MONTHLY, 12)
    }

    fn example_charges() -> Charges {
        Charges {
            transaction_tax: 185.6,
            insurance_premium: 79.2,
        }
    }

    #[test]
    fn test_closed_form_legacy() {
        let solver = EffectiveCostSolver::new(CostStrategy::legacy());
        let schedule = example_schedule();
        let cost = solver.closed_form(10_000.0, &schedule, example_charges()).unwrap();

        let total_paid = schedule.total_paid() + 264.8;
        assert_relative_eq!(cost.total_amount_paid, total_paid, max_relative = 1e-12);
        assert_relative_eq!(cost.total_financing_cost, total_paid - 10_000.0, max_relative = 1e-12);
        // 12-month term: the ratio itself is the annual factor
        assert_relative_eq!(cost.effective_annual_rate, total_paid / 10_000.0 - 1.0, max_relative = 1e-12);
        assert_eq!(cost.method, CostSource::ClosedForm);
    }

    #[test]
    fn test_irr_exceeds_nominal_rate() {
        let solver = EffectiveCostSolver::new(CostStrategy::canonical());
        let cost = solver.irr(10_000.0, &example_schedule(), example_charges()).unwrap();

        assert_eq!(cost.method, CostSource::Irr);
        assert_relative_eq!(cost.net_disbursed, 10_000.0 - 264.8, max_relative = 1e-12);
        // Withholding charges makes the credit dearer than its 12.35% nominal rate
        assert!(cost.effective_annual_rate > 0.1235);
        assert!(cost.effective_annual_rate < 0.20);
    }

    #[test]
    fn test_no_charges_irr_matches_nominal() {
        let solver = EffectiveCostSolver::new(CostStrategy::canonical());
        let charges = Charges {
            transaction_tax: 0.0,
            insurance_premium: 0.0,
        };
        let cost = solver.irr(10_000.0, &example_schedule(), charges).unwrap();
        assert_abs_diff_eq!(cost.effective_annual_rate, 0.1235, epsilon = 1e-6);
    }

    #[test]
    fn test_financing_cost_independent_of_treatment() {
        let schedule = example_schedule();
        let deducted = EffectiveCostSolver::new(CostStrategy::canonical())
            .solve(10_000.0, &schedule, example_charges())
            .unwrap();
        let on_top = EffectiveCostSolver::new(CostStrategy {
            method: CostMethod::Irr,
            charges: ChargeTreatment::AddedOnTop,
        })
        .solve(10_000.0, &schedule, example_charges())
        .unwrap();

        assert_relative_eq!(deducted.total_financing_cost, on_top.total_financing_cost, max_relative = 1e-12);
        assert_relative_eq!(on_top.total_amount_paid, deducted.total_amount_paid + 264.8, max_relative = 1e-12);
    }

    #[test]
    fn test_cashflow_layout() {
        let schedule = example_schedule();
        let deducted = EffectiveCostSolver::new(CostStrategy::canonical()).cashflows(10_000.0, &schedule, example_charges());
        assert_eq!(deducted.len(), 13);
        assert_relative_eq!(deducted[0], 9_735.2, max_relative = 1e-12);
        assert!(deducted[1..].iter().all(|&cf| cf < 0.0));

        let on_top = EffectiveCostSolver::new(CostStrategy::legacy()).cashflows(10_000.0, &schedule, example_charges());
        assert_eq!(on_top[0], 10_000.0);
        assert_relative_eq!(on_top[1], deducted[1] - 264.8, max_relative = 1e-12);
    }

    #[test]
    fn test_subsidized_rate_is_unsolvable() {
        let schedule = AmortizationEngine::new(AmortizationMethod::Price).build(10_000.0, -0.01, 12);
        let charges = Charges {
            transaction_tax: 0.0,
            insurance_premium: 0.0,
        };
        let solver = EffectiveCostSolver::new(CostStrategy::canonical());
        let err = solver.irr(10_000.0, &schedule, charges).unwrap_err();
        assert!(matches!(err, SimulationError::UnsolvableIrr { .. }));

        // The closed form still yields a (negative) rate
        let fallback = solver.closed_form(10_000.0, &schedule, charges).unwrap();
        assert!(fallback.effective_annual_rate < 0.0);
    }

    #[test]
    fn test_charges_exceeding_principal() {
        let charges = Charges {
            transaction_tax: 6_000.0,
            insurance_premium: 5_000.0,
        };
        let solver = EffectiveCostSolver::new(CostStrategy::canonical());
        assert!(solver.solve(10_000.0, &example_schedule(), charges).is_err());
    }
}
