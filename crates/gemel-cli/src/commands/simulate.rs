use clap::Args;
use serde_json::Value;

use gemel_core::regulations::Regulations;
use gemel_core::simulation::{simulate, SimulationInputs};
use gemel_core::tables;

use crate::input;

/// Arguments for a single projection
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to a JSON or YAML input file (or pipe JSON via stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Include the full monthly series in the output
    #[arg(long)]
    pub monthly: bool,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_inputs: SimulationInputs = input::read_input(args.input.as_deref(), "simulate")?;

    let mut output = simulate(&sim_inputs)?;
    output
        .warnings
        .extend(Regulations::default().fee_warnings(sim_inputs.fee_aum, sim_inputs.fee_deposit));

    let result = &output.result;
    let summary = serde_json::json!({
        "start_age": result.inputs.start_age,
        "withdraw_age": result.inputs.withdraw_age,
        "years": result.inputs.years_of_contribution(),
        "withdrawal_mode": result.inputs.withdrawal_mode.to_string(),
        "gross_balance": result.gross_balance,
        "total_contributions": result.total_contributions,
        "real_basis": result.real_basis,
        "real_gain": result.real_gain,
        "tax_amount": result.tax_amount,
        "net_balance": result.net_balance,
        "effective_tax_rate": result.effective_tax_rate(),
        "tax_savings_from_annuity": result.tax_savings_from_annuity(),
        "cap_was_binding": result.cap_was_binding,
        "cap_limited_amount": result.cap_limited_amount,
    });

    let shaped = if args.monthly {
        serde_json::json!({
            "summary": summary,
            "yearly": tables::yearly_rows(result),
            "monthly": result.monthly_results,
        })
    } else {
        serde_json::json!({
            "summary": summary,
            "yearly": tables::yearly_rows(result),
        })
    };

    let mut value = serde_json::to_value(&output)?;
    value["result"] = shaped;
    Ok(value)
}
