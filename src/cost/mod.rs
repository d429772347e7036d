//! Effective cost of the credit: IRR solver and CET breakdown

mod effective;
pub mod irr;

pub use effective::{
    ChargeTreatment, Charges, CostBreakdown, CostMethod, CostSource, CostStrategy, EffectiveCostSolver,
};
pub use irr::{calculate_annual_irr, calculate_irr, npv_at_rate};
