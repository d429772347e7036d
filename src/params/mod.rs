//! Simulation inputs: operation parameters, input normalization and scenario loading

mod data;
pub mod input;
pub mod loader;

pub use data::{ClientClass, FieldLayout, OperationKind, OperationParameters, DEFAULT_AGENT_FACTOR_PCT, MAX_TERM_MONTHS};
pub use loader::{load_scenarios, load_scenarios_from_reader};
