use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::simulation::engine::{run_simulation, SimulationResult};
use crate::simulation::inputs::{ParamField, SimulationInputs, WithdrawalMode};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProvidentResult;

/// Market-typical AUM fee levels: low, average, and the legal maximum.
pub const DEFAULT_FEE_LEVELS: [Rate; 3] = [dec!(0.004), dec!(0.0065), dec!(0.0105)];

/// Finer fee grid for the fee-impact table.
pub const DEFAULT_FEE_RANGE: [Rate; 8] = [
    dec!(0.003),
    dec!(0.004),
    dec!(0.005),
    dec!(0.006),
    dec!(0.007),
    dec!(0.008),
    dec!(0.009),
    dec!(0.0105),
];

/// Default starting ages for the start-age comparison.
pub const DEFAULT_COMPARE_AGES: [u32; 4] = [30, 40, 50, 59];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One labelled scenario inside a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub label: String,
    pub result: SimulationResult,
}

/// Results of several scenario runs, in sweep order, with a designated
/// baseline for delta reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub scenarios: Vec<Scenario>,
    pub baseline_label: String,
}

impl ComparisonResult {
    pub fn get(&self, label: &str) -> Option<&SimulationResult> {
        self.scenarios
            .iter()
            .find(|s| s.label == label)
            .map(|s| &s.result)
    }

    /// Net-balance difference of every scenario versus the baseline.
    ///
    /// Empty when the baseline label does not name a scenario.
    pub fn net_balance_deltas(&self) -> Vec<(String, Money)> {
        let Some(baseline) = self.get(&self.baseline_label) else {
            return Vec::new();
        };
        let baseline_net = baseline.net_balance;
        self.scenarios
            .iter()
            .map(|s| (s.label.clone(), s.result.net_balance - baseline_net))
            .collect()
    }
}

/// Lump sum and annuity runs of the same inputs, side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeComparison {
    pub lump_sum: SimulationResult,
    pub annuity: SimulationResult,
    /// Tax avoided by choosing the annuity over the lump sum.
    pub tax_savings: Money,
}

/// One row of the fee-impact table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeImpactRow {
    pub fee_aum: Rate,
    pub fee_label: String,
    pub gross_balance: Money,
    pub net_balance: Money,
    pub tax_amount: Money,
    /// Shortfall versus fee-free compounding of the same contributions.
    pub fee_cost: Money,
}

// ---------------------------------------------------------------------------
// Sweeps
// ---------------------------------------------------------------------------

/// Re-run the simulation for several starting ages.
///
/// Ages at or above the withdrawal age are skipped, not errors. The baseline
/// is the youngest age that actually ran.
pub fn compare_start_ages(
    base: &SimulationInputs,
    ages: &[u32],
) -> ProvidentResult<ComputationOutput<ComparisonResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut scenarios = Vec::new();
    let mut min_valid: Option<u32> = None;

    for &age in ages {
        if age >= base.withdraw_age {
            warnings.push(format!(
                "Skipped age {age}: not below withdrawal age {}",
                base.withdraw_age
            ));
            continue;
        }
        let modified = base.with_override(ParamField::StartAge, Decimal::from(age))?;
        let result = run_simulation(&modified)?;
        scenarios.push(Scenario {
            label: format!("Age {age}"),
            result,
        });
        min_valid = Some(min_valid.map_or(age, |m| m.min(age)));
    }

    let baseline_label = min_valid.map(|a| format!("Age {a}")).unwrap_or_default();
    let comparison = ComparisonResult {
        scenarios,
        baseline_label,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Start-age comparison (one projection per candidate age)",
        &serde_json::json!({
            "ages": ages,
            "withdraw_age": base.withdraw_age,
        }),
        warnings,
        elapsed,
        comparison,
    ))
}

/// Run the same inputs once per withdrawal mode.
pub fn compare_withdrawal_modes(
    inputs: &SimulationInputs,
) -> ProvidentResult<ComputationOutput<ModeComparison>> {
    let start = Instant::now();

    let lump_sum = run_simulation(&inputs.with_mode(WithdrawalMode::LumpSum))?;
    let annuity = run_simulation(&inputs.with_mode(WithdrawalMode::Annuity))?;
    let tax_savings = lump_sum.tax_amount - annuity.tax_amount;

    let comparison = ModeComparison {
        lump_sum,
        annuity,
        tax_savings,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Withdrawal-mode comparison (lump sum vs annuity)",
        &serde_json::json!({
            "withdraw_age": inputs.withdraw_age,
            "annuity_min_age": inputs.annuity_min_age,
        }),
        Vec::new(),
        elapsed,
        comparison,
    ))
}

/// Re-run the simulation across an ascending list of AUM fee levels.
pub fn compare_fees(
    base: &SimulationInputs,
    fee_levels: &[Rate],
) -> ProvidentResult<ComputationOutput<ComparisonResult>> {
    let start = Instant::now();

    let mut scenarios = Vec::new();
    for &fee in fee_levels {
        let modified = base.with_override(ParamField::FeeAum, fee)?;
        let result = run_simulation(&modified)?;
        scenarios.push(Scenario {
            label: fee_label(fee),
            result,
        });
    }

    let baseline_label = fee_levels.first().map(|&f| fee_label(f)).unwrap_or_default();
    let comparison = ComparisonResult {
        scenarios,
        baseline_label,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "AUM fee comparison (one projection per fee level)",
        &serde_json::json!({ "fee_levels": fee_levels }),
        Vec::new(),
        elapsed,
        comparison,
    ))
}

/// Per-fee summary of gross/net balances and the long-run cost of fees.
pub fn fee_impact(
    base: &SimulationInputs,
    fee_range: &[Rate],
) -> ProvidentResult<ComputationOutput<Vec<FeeImpactRow>>> {
    let start = Instant::now();

    // Fee-free compounding benchmark the shortfall is measured against
    let growth = (Decimal::ONE + base.expected_return)
        .powu(base.years_of_contribution() as u64);

    let mut rows = Vec::with_capacity(fee_range.len());
    for &fee in fee_range {
        let modified = base.with_override(ParamField::FeeAum, fee)?;
        let result = run_simulation(&modified)?;
        rows.push(FeeImpactRow {
            fee_aum: fee,
            fee_label: fee_label(fee),
            gross_balance: result.gross_balance,
            net_balance: result.net_balance,
            tax_amount: result.tax_amount,
            fee_cost: result.total_contributions * growth - result.gross_balance,
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fee impact across a fee grid",
        &serde_json::json!({
            "fee_range": fee_range,
            "expected_return": base.expected_return.to_string(),
        }),
        Vec::new(),
        elapsed,
        rows,
    ))
}

fn fee_label(fee: Rate) -> String {
    format!("{:.2}% AUM Fee", fee * dec!(100))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
