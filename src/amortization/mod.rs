//! Amortization schedules under the Price and SAC systems

mod engine;
mod schedule;

pub use engine::{price_payment, AmortizationEngine, AmortizationMethod, BALANCE_EPSILON};
pub use schedule::{AmortizationRow, AmortizationSchedule, ScheduleSummary};
