use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use gemel_core::regulations::Regulations;
use gemel_core::simulation::{simulate, SimulationInputs, WithdrawalMode};

fn inputs(start_age: u32, withdraw_age: u32, monthly: Decimal) -> SimulationInputs {
    SimulationInputs::default_from(&Regulations::default(), start_age, withdraw_age, monthly)
        .unwrap()
}

// ===========================================================================
// Accounting identities
// ===========================================================================

#[test]
fn test_net_balance_identity_holds_across_modes_and_ages() {
    for withdraw_age in [55, 60, 67] {
        for mode in [WithdrawalMode::LumpSum, WithdrawalMode::Annuity] {
            let scenario = inputs(30, withdraw_age, dec!(4000)).with_mode(mode);
            let result = simulate(&scenario).unwrap().result;
            assert_eq!(result.net_balance, result.gross_balance - result.tax_amount);
        }
    }
}

#[test]
fn test_annuity_at_or_after_min_age_is_tax_free() {
    for withdraw_age in [60, 61, 70] {
        let scenario = inputs(25, withdraw_age, dec!(5000));
        let result = simulate(&scenario).unwrap().result;
        assert!(result.real_gain > Decimal::ZERO);
        assert_eq!(result.tax_amount, Decimal::ZERO);
    }
}

#[test]
fn test_lump_sum_tax_is_rate_times_real_gain_and_never_negative() {
    let scenario = inputs(30, 60, dec!(4000)).with_mode(WithdrawalMode::LumpSum);
    let result = simulate(&scenario).unwrap().result;
    assert_eq!(
        result.tax_amount,
        scenario.capital_gains_tax * result.real_gain.max(Decimal::ZERO)
    );
    assert!(result.tax_amount >= Decimal::ZERO);

    // Heavy deposit fee pushes the real gain negative; tax stays zero
    let mut losing = inputs(30, 31, dec!(1000)).with_mode(WithdrawalMode::LumpSum);
    losing.expected_return = Decimal::ZERO;
    losing.fee_deposit = dec!(0.04);
    let result = simulate(&losing).unwrap().result;
    assert!(result.real_gain < Decimal::ZERO);
    assert_eq!(result.tax_amount, Decimal::ZERO);
}

// ===========================================================================
// Fee and cap behaviour
// ===========================================================================

#[test]
fn test_management_fee_monotonically_drags_gross_balance() {
    let fees = [dec!(0.0), dec!(0.003), dec!(0.0065), dec!(0.0105), dec!(0.02)];
    let mut last: Option<Decimal> = None;
    for fee in fees {
        let mut scenario = inputs(30, 60, dec!(4000));
        scenario.fee_aum = fee;
        let gross = simulate(&scenario).unwrap().result.gross_balance;
        if let Some(prev) = last {
            assert!(gross < prev, "fee {fee} did not decrease gross balance");
        }
        last = Some(gross);
    }
}

#[test]
fn test_cap_binding_flags() {
    // 12 * 7500 = 90_000 > 83_641: the cap must bind
    let capped = simulate(&inputs(30, 60, dec!(7500))).unwrap().result;
    assert!(capped.cap_was_binding);
    assert!(capped.cap_limited_amount > Decimal::ZERO);

    // 12 * 6000 = 72_000 <= 83_641: it must not
    let free = simulate(&inputs(30, 60, dec!(6000))).unwrap().result;
    assert!(!free.cap_was_binding);
    assert_eq!(free.cap_limited_amount, Decimal::ZERO);
}

// ===========================================================================
// Determinism
// ===========================================================================

#[test]
fn test_simulate_is_idempotent() {
    let scenario = inputs(32, 61, dec!(5500));
    let first = simulate(&scenario).unwrap().result;
    let second = simulate(&scenario).unwrap().result;
    assert_eq!(first, second);
}

// ===========================================================================
// Named scenarios
// ===========================================================================

#[test]
fn test_scenario_annuity_at_sixty_with_market_average_inputs() {
    let scenario = SimulationInputs {
        start_age: 30,
        withdraw_age: 60,
        monthly_contribution: dec!(6970),
        annual_cap: dec!(83_641),
        expected_return: dec!(0.05),
        fee_aum: dec!(0.0065),
        fee_deposit: Decimal::ZERO,
        inflation: dec!(0.025),
        capital_gains_tax: dec!(0.25),
        annuity_min_age: 60,
        withdrawal_mode: WithdrawalMode::Annuity,
    }
    .validated()
    .unwrap();
    let result = simulate(&scenario).unwrap().result;

    assert_eq!(result.tax_amount, Decimal::ZERO);
    // Positive real return environment
    assert!(result.gross_balance > result.total_contributions);
    // 6970 * 12 = 83_640 fits just under the cap
    assert!(!result.cap_was_binding);
    assert_eq!(result.total_contributions, dec!(6970) * dec!(360));
}

#[test]
fn test_scenario_zero_contribution() {
    for (start_age, withdraw_age) in [(20, 60), (45, 67), (59, 60)] {
        let result = simulate(&inputs(start_age, withdraw_age, Decimal::ZERO))
            .unwrap()
            .result;
        assert_eq!(result.total_contributions, Decimal::ZERO);
        assert_eq!(result.gross_balance, Decimal::ZERO);
        assert_eq!(result.tax_amount, Decimal::ZERO);
    }
}

#[test]
fn test_scenario_zero_cap() {
    let mut scenario = inputs(30, 60, dec!(5000));
    scenario.annual_cap = Decimal::ZERO;
    let result = simulate(&scenario).unwrap().result;

    assert!(result.cap_was_binding);
    assert_eq!(result.total_contributions, Decimal::ZERO);
    assert_eq!(result.monthly_results[0].contribution, Decimal::ZERO);
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_invalid_configuration_fails_at_construction() {
    let regs = Regulations::default();
    assert!(SimulationInputs::default_from(&regs, 60, 60, dec!(1000)).is_err());
    assert!(SimulationInputs::default_from(&regs, 65, 60, dec!(1000)).is_err());
    assert!(SimulationInputs::default_from(&regs, 30, 60, dec!(-1)).is_err());
}
