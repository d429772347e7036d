//! Amortization schedule output structures

use serde::{Deserialize, Serialize};

/// A single installment of the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-indexed installment number
    pub period: u32,
    pub payment: f64,
    pub interest: f64,
    /// Principal repaid by this installment
    pub amortization: f64,
    /// Outstanding balance after the installment, zeroed below the residue epsilon
    pub balance: f64,
}

/// Ordered installments covering the whole term
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub rows: Vec<AmortizationRow>,
}

impl AmortizationSchedule {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, row: AmortizationRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Scheduled payments in order, as borrower outflows
    pub fn payments(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|r| r.payment)
    }

    pub fn total_paid(&self) -> f64 {
        self.payments().sum()
    }

    pub fn total_interest(&self) -> f64 {
        self.rows.iter().map(|r| r.interest).sum()
    }

    /// Get summary statistics
    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            installments: self.rows.len() as u32,
            total_paid: self.total_paid(),
            total_interest: self.total_interest(),
            total_amortization: self.rows.iter().map(|r| r.amortization).sum(),
            first_payment: self.rows.first().map(|r| r.payment).unwrap_or(0.0),
            last_payment: self.rows.last().map(|r| r.payment).unwrap_or(0.0),
        }
    }
}

/// Summary statistics for a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub installments: u32,
    pub total_paid: f64,
    pub total_interest: f64,
    pub total_amortization: f64,
    pub first_payment: f64,
    pub last_payment: f64,
}
