//! Row-oriented projections of engine results.
//!
//! Pure read-only transforms consumed by external renderers (tables, charts,
//! exports). Nothing here feeds back into the engine.

use serde::{Deserialize, Serialize};

use crate::simulation::engine::SimulationResult;
use crate::types::{Money, Rate};

#[cfg(feature = "comparison")]
use crate::comparison::cross_strategy::ComparisonSummary;
#[cfg(feature = "comparison")]
use crate::comparison::scenarios::{ComparisonResult, ModeComparison};

/// One year of a single simulation, flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRow {
    pub year: u32,
    pub age: u32,
    pub contributions_ytd: Money,
    pub cumulative_contributions: Money,
    pub balance: Money,
    pub real_basis: Money,
}

/// Summary line for one scenario of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub scenario: String,
    pub years: u32,
    pub total_contributions: Money,
    pub gross_balance: Money,
    pub tax_amount: Money,
    pub net_balance: Money,
    pub effective_tax_rate: Rate,
    pub cap_was_binding: bool,
}

impl ScenarioRow {
    fn from_result(label: &str, result: &SimulationResult) -> Self {
        Self {
            scenario: label.to_string(),
            years: result.inputs.years_of_contribution(),
            total_contributions: result.total_contributions,
            gross_balance: result.gross_balance,
            tax_amount: result.tax_amount,
            net_balance: result.net_balance,
            effective_tax_rate: result.effective_tax_rate(),
            cap_was_binding: result.cap_was_binding,
        }
    }
}

/// Yearly schedule of a single run.
pub fn yearly_rows(result: &SimulationResult) -> Vec<YearlyRow> {
    result
        .yearly_results
        .iter()
        .map(|yr| YearlyRow {
            year: yr.year,
            age: yr.age,
            contributions_ytd: yr.contributions_ytd,
            cumulative_contributions: yr.cumulative_contributions,
            balance: yr.balance,
            real_basis: yr.real_basis,
        })
        .collect()
}

/// One summary line per scenario, in sweep order.
#[cfg(feature = "comparison")]
pub fn comparison_rows(comparison: &ComparisonResult) -> Vec<ScenarioRow> {
    comparison
        .scenarios
        .iter()
        .map(|s| ScenarioRow::from_result(&s.label, &s.result))
        .collect()
}

/// Lump sum and annuity as two summary lines.
#[cfg(feature = "comparison")]
pub fn mode_rows(comparison: &ModeComparison) -> Vec<ScenarioRow> {
    vec![
        ScenarioRow::from_result("Lump Sum", &comparison.lump_sum),
        ScenarioRow::from_result("Annuity", &comparison.annuity),
    ]
}

/// One line per starting age of the cross-strategy sweep.
#[cfg(feature = "comparison")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeRow {
    pub starting_age: u32,
    pub years_invested: u32,
    pub fund_net: Money,
    pub alternative_net: Money,
    pub difference: Money,
    pub difference_pct: Rate,
    pub winner: String,
}

#[cfg(feature = "comparison")]
pub fn age_comparison_rows(summary: &ComparisonSummary) -> Vec<AgeRow> {
    summary
        .rows
        .iter()
        .map(|row| AgeRow {
            starting_age: row.starting_age,
            years_invested: row.years_invested,
            fund_net: row.fund.net_balance,
            alternative_net: row.alternative.net_balance,
            difference: row.difference,
            difference_pct: row.difference_pct,
            winner: format!("{:?}", row.winner),
        })
        .collect()
}
