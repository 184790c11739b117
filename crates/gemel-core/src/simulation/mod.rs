pub mod engine;
pub mod inputs;
pub mod tax;

pub use engine::{simulate, MonthlyResult, SimulationResult, YearlyResult};
pub use inputs::{OutputMetric, ParamField, SimulationInputs, WithdrawalMode};
