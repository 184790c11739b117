use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use gemel_core::comparison::scenarios::{
    self, DEFAULT_COMPARE_AGES, DEFAULT_FEE_LEVELS, DEFAULT_FEE_RANGE,
};
use gemel_core::comparison::sensitivity;
use gemel_core::simulation::{OutputMetric, ParamField, SimulationInputs};
use gemel_core::tables;

use crate::input;

/// Arguments for the start-age comparison
#[derive(Args)]
pub struct CompareAgesArgs {
    /// Path to a JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated starting ages (e.g. "30,40,50,59")
    #[arg(long)]
    pub ages: Option<String>,
}

/// Arguments for the withdrawal-mode comparison
#[derive(Args)]
pub struct CompareModesArgs {
    /// Path to a JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the fee comparison
#[derive(Args)]
pub struct CompareFeesArgs {
    /// Path to a JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated AUM fee rates, ascending (e.g. "0.004,0.0065,0.0105")
    #[arg(long)]
    pub fees: Option<String>,
}

/// Arguments for the fee-impact table
#[derive(Args)]
pub struct FeeImpactArgs {
    /// Path to a JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated AUM fee rates to tabulate
    #[arg(long)]
    pub fees: Option<String>,
}

/// Arguments for the 2-way sensitivity matrix
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to a JSON or YAML input file with the base case
    #[arg(long)]
    pub input: Option<String>,

    /// First swept parameter (e.g. "expected_return")
    #[arg(long)]
    pub param1: String,

    /// Comma-separated values for the first parameter
    #[arg(long)]
    pub values1: String,

    /// Second swept parameter (e.g. "fee_aum")
    #[arg(long)]
    pub param2: String,

    /// Comma-separated values for the second parameter
    #[arg(long)]
    pub values2: String,

    /// Result metric recorded per cell
    #[arg(long, default_value = "net_balance")]
    pub metric: String,
}

pub fn run_compare_ages(args: CompareAgesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let base: SimulationInputs = input::read_input(args.input.as_deref(), "compare-ages")?;
    let ages = match args.ages.as_deref() {
        Some(list) => parse_u32_list(list)?,
        None => DEFAULT_COMPARE_AGES.to_vec(),
    };

    let output = scenarios::compare_start_ages(&base, &ages)?;
    let deltas: Vec<Value> = output
        .result
        .net_balance_deltas()
        .into_iter()
        .map(|(scenario, delta)| {
            serde_json::json!({ "scenario": scenario, "net_balance_delta": delta })
        })
        .collect();
    let shaped = serde_json::json!({
        "baseline": output.result.baseline_label,
        "rows": tables::comparison_rows(&output.result),
        "deltas": deltas,
    });

    let mut value = serde_json::to_value(&output)?;
    value["result"] = shaped;
    Ok(value)
}

pub fn run_compare_modes(args: CompareModesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: SimulationInputs = input::read_input(args.input.as_deref(), "compare-modes")?;

    let output = scenarios::compare_withdrawal_modes(&inputs)?;
    let shaped = serde_json::json!({
        "rows": tables::mode_rows(&output.result),
        "tax_savings": output.result.tax_savings,
    });

    let mut value = serde_json::to_value(&output)?;
    value["result"] = shaped;
    Ok(value)
}

pub fn run_compare_fees(args: CompareFeesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let base: SimulationInputs = input::read_input(args.input.as_deref(), "compare-fees")?;
    let fees = match args.fees.as_deref() {
        Some(list) => parse_decimal_list(list)?,
        None => DEFAULT_FEE_LEVELS.to_vec(),
    };

    let output = scenarios::compare_fees(&base, &fees)?;
    let shaped = serde_json::json!({
        "baseline": output.result.baseline_label,
        "rows": tables::comparison_rows(&output.result),
    });

    let mut value = serde_json::to_value(&output)?;
    value["result"] = shaped;
    Ok(value)
}

pub fn run_fee_impact(args: FeeImpactArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let base: SimulationInputs = input::read_input(args.input.as_deref(), "fee-impact")?;
    let fees = match args.fees.as_deref() {
        Some(list) => parse_decimal_list(list)?,
        None => DEFAULT_FEE_RANGE.to_vec(),
    };

    let output = scenarios::fee_impact(&base, &fees)?;
    Ok(serde_json::to_value(&output)?)
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let base: SimulationInputs = input::read_input(args.input.as_deref(), "sensitivity")?;

    let param1: ParamField = args.param1.parse()?;
    let param2: ParamField = args.param2.parse()?;
    let metric: OutputMetric = args.metric.parse()?;
    let values1 = parse_decimal_list(&args.values1)?;
    let values2 = parse_decimal_list(&args.values2)?;

    let output = sensitivity::generate_sensitivity_matrix(
        &base, param1, &values1, param2, &values2, metric,
    )?;
    Ok(serde_json::to_value(&output)?)
}

fn parse_u32_list(list: &str) -> Result<Vec<u32>, Box<dyn std::error::Error>> {
    list.split(',')
        .map(|s| {
            s.trim()
                .parse::<u32>()
                .map_err(|e| format!("Invalid age '{}': {e}", s.trim()).into())
        })
        .collect()
}

fn parse_decimal_list(list: &str) -> Result<Vec<Decimal>, Box<dyn std::error::Error>> {
    list.split(',')
        .map(|s| {
            s.trim()
                .parse::<Decimal>()
                .map_err(|e| format!("Invalid value '{}': {e}", s.trim()).into())
        })
        .collect()
}
