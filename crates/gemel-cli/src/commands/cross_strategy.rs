use clap::Args;
use serde_json::Value;

use gemel_core::comparison::cross_strategy::{
    self, CrossStrategyInputs, DEFAULT_SCAN_MAX_AGE, DEFAULT_SCAN_MIN_AGE,
};
use gemel_core::tables;
use gemel_core::withdrawal;

use crate::input;

/// Arguments for the fund-vs-taxable-account sweep
#[derive(Args)]
pub struct FullComparisonArgs {
    /// Path to a JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Youngest starting age to scan
    #[arg(long, default_value_t = DEFAULT_SCAN_MIN_AGE)]
    pub min_age: u32,

    /// Oldest starting age to scan
    #[arg(long, default_value_t = DEFAULT_SCAN_MAX_AGE)]
    pub max_age: u32,
}

/// Arguments for the crossover-age search
#[derive(Args)]
pub struct CrossoverArgs {
    /// Path to a JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Youngest starting age to scan
    #[arg(long, default_value_t = DEFAULT_SCAN_MIN_AGE)]
    pub min_age: u32,

    /// Oldest starting age to scan
    #[arg(long, default_value_t = DEFAULT_SCAN_MAX_AGE)]
    pub max_age: u32,
}

/// Arguments for the monthly retirement income comparison
#[derive(Args)]
pub struct WithdrawalArgs {
    /// Path to a JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Age at which contributions begin
    #[arg(long)]
    pub starting_age: u32,
}

pub fn run_full_comparison(args: FullComparisonArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: CrossStrategyInputs = input::read_input(args.input.as_deref(), "full-comparison")?;

    let output = cross_strategy::run_full_comparison(&inputs, args.min_age, args.max_age)?;
    let shaped = serde_json::json!({
        "rows": tables::age_comparison_rows(&output.result),
        "crossover_age": output.result.crossover_age,
    });

    let mut value = serde_json::to_value(&output)?;
    value["result"] = shaped;
    Ok(value)
}

pub fn run_crossover(args: CrossoverArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: CrossStrategyInputs = input::read_input(args.input.as_deref(), "crossover")?;

    let output = cross_strategy::find_crossover_age(&inputs, args.min_age, args.max_age)?;
    Ok(serde_json::to_value(&output)?)
}

pub fn run_withdrawal(args: WithdrawalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: CrossStrategyInputs = input::read_input(args.input.as_deref(), "withdrawal")?;

    let output = withdrawal::calculate_monthly_withdrawal_comparison(&inputs, args.starting_age)?;
    Ok(serde_json::to_value(&output)?)
}
