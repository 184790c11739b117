use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProvidentError;
use crate::rates;
use crate::regulations::Regulations;
use crate::simulation::inputs::WithdrawalMode;
use crate::simulation::tax;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProvidentResult;

/// Default scan range for the starting-age sweep.
pub const DEFAULT_SCAN_MIN_AGE: u32 = 18;
pub const DEFAULT_SCAN_MAX_AGE: u32 = 59;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Inputs for the annual-resolution fund-vs-taxable-account sweep.
///
/// Both accounts receive the same desired contribution and the same gross
/// return; they differ in fees and in tax treatment. Unlike the monthly
/// engine this one compounds annually with closed-form annuity formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossStrategyInputs {
    pub retirement_age: u32,
    /// Desired monthly contribution in NIS.
    pub monthly_contribution: Money,
    /// Annual contribution cap, binding only for the fund account.
    #[serde(default = "default_annual_cap")]
    pub annual_cap: Money,
    /// Expected annual nominal return, shared by both accounts.
    #[serde(default = "default_annual_return")]
    pub annual_return: Rate,
    /// Annual AUM fee of the provident fund.
    #[serde(default = "default_fund_fee")]
    pub fund_fee_annual: Rate,
    /// Annual fee of the alternative taxable account.
    #[serde(default = "default_alternative_fee")]
    pub alternative_fee_annual: Rate,
    #[serde(default = "default_inflation")]
    pub inflation: Rate,
    #[serde(default = "default_capital_gains_tax")]
    pub capital_gains_tax: Rate,
    #[serde(default = "default_annuity_min_age")]
    pub annuity_min_age: u32,
    /// How the fund balance is assumed to be withdrawn at retirement.
    #[serde(default = "default_withdrawal_mode")]
    pub withdrawal_mode: WithdrawalMode,
    /// Payout horizon for the retirement-income comparison, in years.
    #[serde(default = "default_payout_years")]
    pub payout_years: u32,
    /// Assumed annual return during the payout phase.
    #[serde(default = "default_payout_return")]
    pub payout_annual_return: Rate,
}

fn default_annual_cap() -> Money {
    Regulations::default().annual_cap
}

fn default_annual_return() -> Rate {
    dec!(0.05)
}

fn default_fund_fee() -> Rate {
    dec!(0.0065)
}

fn default_alternative_fee() -> Rate {
    dec!(0.0065)
}

fn default_inflation() -> Rate {
    dec!(0.025)
}

fn default_capital_gains_tax() -> Rate {
    Regulations::default().capital_gains_tax
}

fn default_annuity_min_age() -> u32 {
    Regulations::default().annuity_min_age
}

fn default_withdrawal_mode() -> WithdrawalMode {
    WithdrawalMode::Annuity
}

fn default_payout_years() -> u32 {
    20
}

fn default_payout_return() -> Rate {
    dec!(0.03)
}

impl CrossStrategyInputs {
    pub fn validate(&self) -> ProvidentResult<()> {
        for (field, value) in [
            ("monthly_contribution", self.monthly_contribution),
            ("annual_cap", self.annual_cap),
            ("annual_return", self.annual_return),
            ("fund_fee_annual", self.fund_fee_annual),
            ("alternative_fee_annual", self.alternative_fee_annual),
            ("inflation", self.inflation),
            ("capital_gains_tax", self.capital_gains_tax),
            ("payout_annual_return", self.payout_annual_return),
        ] {
            if value < Decimal::ZERO {
                return Err(ProvidentError::InvalidInput {
                    field: field.into(),
                    reason: format!("must be non-negative, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Which strategy came out ahead at a given starting age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Fund,
    Alternative,
    Tie,
}

/// Final figures for one account type at one starting age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub gross_balance: Money,
    pub total_contributions: Money,
    pub tax_amount: Money,
    pub net_balance: Money,
}

impl StrategyOutcome {
    fn zero() -> Self {
        Self {
            gross_balance: Decimal::ZERO,
            total_contributions: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            net_balance: Decimal::ZERO,
        }
    }
}

/// Both strategies evaluated for a single starting age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeComparisonResult {
    pub starting_age: u32,
    pub years_invested: u32,
    pub fund: StrategyOutcome,
    pub alternative: StrategyOutcome,
    /// fund net minus alternative net.
    pub difference: Money,
    /// Difference relative to the alternative net, 0 when that is 0.
    pub difference_pct: Rate,
    pub winner: Winner,
}

/// The full starting-age sweep plus the crossover age, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub rows: Vec<AgeComparisonResult>,
    pub crossover_age: Option<u32>,
}

/// Result of a standalone crossover search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverSearch {
    pub min_age: u32,
    pub max_age: u32,
    pub crossover_age: Option<u32>,
}

// ---------------------------------------------------------------------------
// Closed-form accumulation
// ---------------------------------------------------------------------------

/// Future value of a level annual contribution stream:
/// `C * ((1+r)^n - 1) / r`, degrading to `C * n` at r = 0.
fn annuity_fv(annual_contribution: Money, rate: Rate, years: u32) -> Money {
    if years == 0 {
        return Decimal::ZERO;
    }
    if rate.is_zero() {
        return annual_contribution * Decimal::from(years);
    }
    let factor = (Decimal::ONE + rate).powu(years as u64);
    annual_contribution * (factor - Decimal::ONE) / rate
}

/// Evaluate both strategies for one starting age.
///
/// A starting age at or past retirement is a defined all-zero row, not an
/// error.
pub(crate) fn evaluate_age(inputs: &CrossStrategyInputs, starting_age: u32) -> AgeComparisonResult {
    let years = inputs.retirement_age.saturating_sub(starting_age);
    if years == 0 {
        return AgeComparisonResult {
            starting_age,
            years_invested: 0,
            fund: StrategyOutcome::zero(),
            alternative: StrategyOutcome::zero(),
            difference: Decimal::ZERO,
            difference_pct: Decimal::ZERO,
            winner: Winner::Tie,
        };
    }

    let desired_annual = inputs.monthly_contribution * dec!(12);
    // Only the fund is subject to the statutory cap
    let fund_annual = desired_annual.min(inputs.annual_cap);

    let fund_rate = rates::net_annual_return(inputs.annual_return, inputs.fund_fee_annual);
    let alt_rate = rates::net_annual_return(inputs.annual_return, inputs.alternative_fee_annual);

    let fund_gross = annuity_fv(fund_annual, fund_rate, years);
    let alt_gross = annuity_fv(desired_annual, alt_rate, years);

    let fund_contributions = fund_annual * Decimal::from(years);
    let alt_contributions = desired_annual * Decimal::from(years);

    // Real basis in closed form: the same contribution stream indexed
    // forward at the inflation rate
    let fund_real_basis = annuity_fv(fund_annual, inputs.inflation, years);
    let fund_tax = tax::fund_withdrawal_tax(
        fund_gross - fund_real_basis,
        inputs.capital_gains_tax,
        inputs.withdrawal_mode,
        inputs.retirement_age,
        inputs.annuity_min_age,
    );
    let alt_tax = tax::taxable_account_tax(alt_gross - alt_contributions, inputs.capital_gains_tax);

    let fund = StrategyOutcome {
        gross_balance: fund_gross,
        total_contributions: fund_contributions,
        tax_amount: fund_tax,
        net_balance: fund_gross - fund_tax,
    };
    let alternative = StrategyOutcome {
        gross_balance: alt_gross,
        total_contributions: alt_contributions,
        tax_amount: alt_tax,
        net_balance: alt_gross - alt_tax,
    };

    let difference = fund.net_balance - alternative.net_balance;
    let difference_pct = if alternative.net_balance.is_zero() {
        Decimal::ZERO
    } else {
        difference / alternative.net_balance
    };
    let winner = if difference > Decimal::ZERO {
        Winner::Fund
    } else if difference < Decimal::ZERO {
        Winner::Alternative
    } else {
        Winner::Tie
    };

    AgeComparisonResult {
        starting_age,
        years_invested: years,
        fund,
        alternative,
        difference,
        difference_pct,
        winner,
    }
}

/// First (youngest) scanned age at which the fund strategy wins outright.
///
/// The scan order is the contract: if the advantage is non-monotonic in age
/// the first occurrence is reported, not a stable threshold.
fn first_fund_win(rows: &[AgeComparisonResult]) -> Option<u32> {
    rows.iter()
        .find(|r| r.winner == Winner::Fund)
        .map(|r| r.starting_age)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Evaluate both strategies for every starting age in `min_age..=max_age`.
pub fn run_full_comparison(
    inputs: &CrossStrategyInputs,
    min_age: u32,
    max_age: u32,
) -> ProvidentResult<ComputationOutput<ComparisonSummary>> {
    let start = Instant::now();
    inputs.validate()?;
    check_range(min_age, max_age)?;

    let rows: Vec<AgeComparisonResult> = (min_age..=max_age)
        .map(|age| evaluate_age(inputs, age))
        .collect();
    let crossover_age = first_fund_win(&rows);

    let summary = ComparisonSummary {
        rows,
        crossover_age,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fund vs taxable account, closed-form annual sweep over starting ages",
        &serde_json::json!({
            "min_age": min_age,
            "max_age": max_age,
            "retirement_age": inputs.retirement_age,
            "withdrawal_mode": inputs.withdrawal_mode.to_string(),
        }),
        Vec::new(),
        elapsed,
        summary,
    ))
}

/// Lowest starting age in range at which the fund strategy beats the
/// alternative, or `None` if it never does.
pub fn find_crossover_age(
    inputs: &CrossStrategyInputs,
    min_age: u32,
    max_age: u32,
) -> ProvidentResult<ComputationOutput<CrossoverSearch>> {
    let start = Instant::now();
    inputs.validate()?;
    check_range(min_age, max_age)?;

    let crossover_age = (min_age..=max_age)
        .map(|age| evaluate_age(inputs, age))
        .find(|row| row.winner == Winner::Fund)
        .map(|row| row.starting_age);

    let search = CrossoverSearch {
        min_age,
        max_age,
        crossover_age,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Crossover-age search (ascending scan, first fund win)",
        &serde_json::json!({
            "min_age": min_age,
            "max_age": max_age,
            "retirement_age": inputs.retirement_age,
        }),
        Vec::new(),
        elapsed,
        search,
    ))
}

fn check_range(min_age: u32, max_age: u32) -> ProvidentResult<()> {
    if min_age > max_age {
        return Err(ProvidentError::InvalidInput {
            field: "min_age".into(),
            reason: format!("min_age ({min_age}) must be <= max_age ({max_age})"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
