use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::comparison::cross_strategy::{self, CrossStrategyInputs};
use crate::error::ProvidentError;
use crate::rates;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProvidentResult;

/// Monthly retirement income from both account types at the start of a
/// fixed-length payout horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyWithdrawalResult {
    pub starting_age: u32,
    pub payout_years: u32,
    pub payout_annual_return: Rate,
    /// Fund balance entering the payout phase (gross of any tax).
    pub fund_balance: Money,
    pub alternative_balance: Money,
    pub fund_gross_monthly: Money,
    /// Annuity payments from the fund are tax-free.
    pub fund_net_monthly: Money,
    pub alternative_gross_monthly: Money,
    pub alternative_net_monthly: Money,
    /// Tax on the gain portion of each taxable-account withdrawal.
    pub alternative_monthly_tax: Money,
    /// Tax avoided over the whole payout horizon.
    pub lifetime_tax_savings: Money,
}

/// Compare the sustainable monthly income of the fund annuity against an
/// ordinary taxable account drawn down over the same horizon.
///
/// Each taxable-account withdrawal is assumed to be composed of principal
/// and gain in the same proportion as the whole account, and only the gain
/// portion is taxed.
pub fn calculate_monthly_withdrawal_comparison(
    inputs: &CrossStrategyInputs,
    starting_age: u32,
) -> ProvidentResult<ComputationOutput<MonthlyWithdrawalResult>> {
    let start = Instant::now();
    inputs.validate()?;
    if inputs.payout_years == 0 {
        return Err(ProvidentError::InvalidInput {
            field: "payout_years".into(),
            reason: "payout horizon must be at least one year".into(),
        });
    }

    let accumulation = cross_strategy::evaluate_age(inputs, starting_age);
    let fund_balance = accumulation.fund.gross_balance;
    let alternative_balance = accumulation.alternative.gross_balance;

    let monthly_rate = rates::annual_to_monthly(inputs.payout_annual_return)?;
    let months = inputs.payout_years * 12;

    let fund_gross_monthly = annuity_payment(fund_balance, monthly_rate, months)?;
    let alternative_gross_monthly = annuity_payment(alternative_balance, monthly_rate, months)?;

    // Gain share of the taxable account, applied pro-rata to every payment
    let gain_ratio = if alternative_balance.is_zero() {
        Decimal::ZERO
    } else {
        ((alternative_balance - accumulation.alternative.total_contributions)
            / alternative_balance)
            .max(Decimal::ZERO)
    };
    let alternative_monthly_tax =
        alternative_gross_monthly * gain_ratio * inputs.capital_gains_tax;
    let alternative_net_monthly = alternative_gross_monthly - alternative_monthly_tax;

    let lifetime_tax_savings =
        alternative_monthly_tax * dec!(12) * Decimal::from(inputs.payout_years);

    let result = MonthlyWithdrawalResult {
        starting_age,
        payout_years: inputs.payout_years,
        payout_annual_return: inputs.payout_annual_return,
        fund_balance,
        alternative_balance,
        fund_gross_monthly,
        fund_net_monthly: fund_gross_monthly,
        alternative_gross_monthly,
        alternative_net_monthly,
        alternative_monthly_tax,
        lifetime_tax_savings,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Amortizing monthly drawdown, fund annuity vs taxable account",
        &serde_json::json!({
            "starting_age": starting_age,
            "retirement_age": inputs.retirement_age,
            "payout_years": inputs.payout_years,
            "payout_annual_return": inputs.payout_annual_return.to_string(),
        }),
        Vec::new(),
        elapsed,
        result,
    ))
}

/// Level payment exhausting `pv` over `months` periods:
/// `PMT = PV * r / (1 - (1+r)^(-n))`, degrading to `PV / n` at r = 0.
fn annuity_payment(pv: Money, monthly_rate: Rate, months: u32) -> ProvidentResult<Money> {
    if monthly_rate.is_zero() {
        return Ok(pv / Decimal::from(months));
    }
    let factor = (Decimal::ONE + monthly_rate).powu(months as u64);
    let denom = Decimal::ONE - Decimal::ONE / factor;
    if denom.is_zero() {
        return Err(ProvidentError::DivisionByZero {
            context: "annuity payment factor".into(),
        });
    }
    Ok(pv * monthly_rate / denom)
}
