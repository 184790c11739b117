use rust_decimal::Decimal;

use crate::types::{Money, Rate};

use super::inputs::WithdrawalMode;

/// Tax due on a provident fund withdrawal.
///
/// An annuity taken at or after the minimum annuity age is exempt; anything
/// else pays the capital-gains rate on the real (inflation-adjusted) gain.
/// A negative real gain is never taxed and never credited.
pub fn fund_withdrawal_tax(
    real_gain: Money,
    tax_rate: Rate,
    mode: WithdrawalMode,
    withdraw_age: u32,
    annuity_min_age: u32,
) -> Money {
    if mode == WithdrawalMode::Annuity && withdraw_age >= annuity_min_age {
        Decimal::ZERO
    } else {
        tax_rate * real_gain.max(Decimal::ZERO)
    }
}

/// Tax due on liquidating an ordinary taxable investment account.
///
/// Taxed on the nominal gain regardless of withdrawal mode or age; there is
/// no annuity exemption for this account type.
pub fn taxable_account_tax(nominal_gain: Money, tax_rate: Rate) -> Money {
    tax_rate * nominal_gain.max(Decimal::ZERO)
}

/// Tax paid as a fraction of the nominal gain, 0 when there is no gain.
pub fn effective_tax_rate(tax_amount: Money, nominal_gain: Money) -> Rate {
    if nominal_gain <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        tax_amount / nominal_gain
    }
}
