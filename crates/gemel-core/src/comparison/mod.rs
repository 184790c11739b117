pub mod cross_strategy;
pub mod scenarios;
pub mod sensitivity;

pub use cross_strategy::{
    find_crossover_age, run_full_comparison, AgeComparisonResult, ComparisonSummary,
    CrossStrategyInputs, CrossoverSearch, StrategyOutcome, Winner,
};
pub use scenarios::{
    compare_fees, compare_start_ages, compare_withdrawal_modes, fee_impact, ComparisonResult,
    FeeImpactRow, ModeComparison, Scenario,
};
pub use sensitivity::{generate_sensitivity_matrix, SensitivityMatrix};
