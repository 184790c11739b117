use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::rates;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ProvidentResult;

use super::inputs::SimulationInputs;
use super::tax;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A contribution actually credited to the account, by deposit month.
///
/// Owned by a single run; the list is what the forward-inflation basis is
/// computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub month: usize,
    pub amount: Money,
}

/// Snapshot at the end of a single month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyResult {
    /// Month number, 0-indexed from the start of contributions.
    pub month: usize,
    /// Age at this month, fractional.
    pub age: Decimal,
    pub balance: Money,
    /// Contribution credited this month (after cap, before deposit fee).
    pub contribution: Money,
    /// Inflation-adjusted basis of all contributions up to this month.
    pub real_basis: Money,
    pub cumulative_contributions: Money,
}

/// Aggregated snapshot at the end of a contribution year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyResult {
    /// Contribution year, 1-indexed.
    pub year: u32,
    pub age: u32,
    pub balance: Money,
    pub contributions_ytd: Money,
    pub cumulative_contributions: Money,
    pub real_basis: Money,
}

/// Complete result of a provident fund simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub inputs: SimulationInputs,
    pub monthly_results: Vec<MonthlyResult>,
    pub yearly_results: Vec<YearlyResult>,
    /// Final balance before tax.
    pub gross_balance: Money,
    /// Sum of all contributions actually credited.
    pub total_contributions: Money,
    /// Inflation-adjusted cost basis at withdrawal.
    pub real_basis: Money,
    /// gross_balance - real_basis.
    pub real_gain: Money,
    /// Tax due at withdrawal (0 for an eligible annuity).
    pub tax_amount: Money,
    /// gross_balance - tax_amount.
    pub net_balance: Money,
    /// True if the annual cap ever limited a contribution.
    pub cap_was_binding: bool,
    /// Total desired contributions forfeited to the cap.
    pub cap_limited_amount: Money,
}

impl SimulationResult {
    /// gross balance minus raw (non-indexed) contributions.
    pub fn nominal_gain(&self) -> Money {
        self.gross_balance - self.total_contributions
    }

    /// Tax paid as a fraction of the nominal gain.
    pub fn effective_tax_rate(&self) -> Rate {
        tax::effective_tax_rate(self.tax_amount, self.nominal_gain())
    }

    /// Lump-sum tax avoided by the annuity exemption.
    ///
    /// Zero unless the run actually withdraws as an eligible annuity.
    pub fn tax_savings_from_annuity(&self) -> Money {
        if self.inputs.withdrawal_mode == super::inputs::WithdrawalMode::Annuity
            && self.inputs.is_annuity_eligible()
        {
            self.inputs.capital_gains_tax * self.real_gain.max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        }
    }
}

// ---------------------------------------------------------------------------
// Core simulation
// ---------------------------------------------------------------------------

/// Run a full provident fund projection and wrap it in the standard
/// computation envelope.
///
/// Balance recurrence per month:
/// `B_{t+1} = (B_t + D_t * (1 - F_d)) * (1 + r_m) * (1 - f_m)`
/// with the deposit credited at the start of the month, before return and
/// AUM fee. `D_t` respects the annual contribution cap.
pub fn simulate(
    inputs: &SimulationInputs,
) -> ProvidentResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = run_simulation(inputs)?;

    if result.cap_was_binding {
        warnings.push(format!(
            "Annual contribution cap was binding; ₪{:.2} could not be contributed",
            result.cap_limited_amount
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Provident fund projection (monthly compounding, capped contributions, real-gain tax)",
        &serde_json::json!({
            "start_age": inputs.start_age,
            "withdraw_age": inputs.withdraw_age,
            "monthly_contribution": inputs.monthly_contribution.to_string(),
            "annual_cap": inputs.annual_cap.to_string(),
            "expected_return": inputs.expected_return.to_string(),
            "fee_aum": inputs.fee_aum.to_string(),
            "fee_deposit": inputs.fee_deposit.to_string(),
            "inflation": inputs.inflation.to_string(),
            "withdrawal_mode": inputs.withdrawal_mode.to_string(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// The bare simulation, shared by [`simulate`] and the sweep engines.
pub(crate) fn run_simulation(inputs: &SimulationInputs) -> ProvidentResult<SimulationResult> {
    inputs.validate()?;

    let monthly_return = rates::annual_to_monthly(inputs.expected_return)?;
    let monthly_fee = rates::monthly_aum_fee(inputs.fee_aum);
    let monthly_inflation = rates::annual_to_monthly(inputs.inflation)?;

    let total_months = inputs.months_of_contribution();

    let mut balance = Decimal::ZERO;
    let mut total_contributions = Decimal::ZERO;
    let mut monthly_results: Vec<MonthlyResult> = Vec::with_capacity(total_months);
    let mut yearly_results: Vec<YearlyResult> = Vec::new();

    let mut cap_was_binding = false;
    let mut cap_limited_amount = Decimal::ZERO;

    let mut year_contributions = Decimal::ZERO;
    let mut current_year: u32 = 1;

    let mut records: Vec<ContributionRecord> = Vec::new();

    for month in 0..total_months {
        let year_of_contribution = (month / 12) as u32 + 1;
        if year_of_contribution > current_year {
            // Flush the snapshot for the just-completed year
            yearly_results.push(YearlyResult {
                year: current_year,
                age: inputs.start_age + current_year,
                balance,
                contributions_ytd: year_contributions,
                cumulative_contributions: total_contributions,
                real_basis: real_basis_at(&records, month, monthly_inflation),
            });
            current_year = year_of_contribution;
            year_contributions = Decimal::ZERO;
        }

        // Contribution for this month, respecting the annual cap
        let desired = inputs.monthly_contribution;
        let remaining_cap = inputs.annual_cap - year_contributions;

        let actual = if remaining_cap <= Decimal::ZERO {
            if desired > Decimal::ZERO {
                cap_was_binding = true;
                cap_limited_amount += desired;
            }
            Decimal::ZERO
        } else if desired > remaining_cap {
            cap_was_binding = true;
            cap_limited_amount += desired - remaining_cap;
            remaining_cap
        } else {
            desired
        };

        let net_contribution = actual * (Decimal::ONE - inputs.fee_deposit);

        balance = (balance + net_contribution)
            * (Decimal::ONE + monthly_return)
            * (Decimal::ONE - monthly_fee);

        if actual > Decimal::ZERO {
            records.push(ContributionRecord { month, amount: actual });
        }
        total_contributions += actual;
        year_contributions += actual;

        monthly_results.push(MonthlyResult {
            month,
            age: Decimal::from(inputs.start_age) + Decimal::from(month as u64) / dec!(12),
            balance,
            contribution: actual,
            real_basis: real_basis_at(&records, month, monthly_inflation),
            cumulative_contributions: total_contributions,
        });
    }

    // Flush the final year if it has pending contributions, or if the run
    // was short enough that no year was ever flushed
    if year_contributions > Decimal::ZERO || yearly_results.is_empty() {
        yearly_results.push(YearlyResult {
            year: current_year,
            age: inputs.withdraw_age,
            balance,
            contributions_ytd: year_contributions,
            cumulative_contributions: total_contributions,
            real_basis: real_basis_at(&records, total_months - 1, monthly_inflation),
        });
    }

    let real_basis = real_basis_at(&records, total_months - 1, monthly_inflation);
    let real_gain = balance - real_basis;

    let tax_amount = tax::fund_withdrawal_tax(
        real_gain,
        inputs.capital_gains_tax,
        inputs.withdrawal_mode,
        inputs.withdraw_age,
        inputs.annuity_min_age,
    );
    let net_balance = balance - tax_amount;

    Ok(SimulationResult {
        inputs: inputs.clone(),
        monthly_results,
        yearly_results,
        gross_balance: balance,
        total_contributions,
        real_basis,
        real_gain,
        tax_amount,
        net_balance,
        cap_was_binding,
        cap_limited_amount,
    })
}

/// Inflation-adjusted cost basis as of `current_month`.
///
/// `Basis = Σ D_t * (1 + π_m)^(T - t)`: every recorded contribution is
/// indexed forward from its own deposit month.
fn real_basis_at(
    records: &[ContributionRecord],
    current_month: usize,
    monthly_inflation: Rate,
) -> Money {
    let growth = Decimal::ONE + monthly_inflation;
    let mut basis = Decimal::ZERO;
    for rec in records {
        let elapsed = (current_month - rec.month) as u64;
        basis += rec.amount * growth.powu(elapsed);
    }
    basis
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regulations::Regulations;
    use crate::simulation::inputs::WithdrawalMode;

    fn inputs(start_age: u32, withdraw_age: u32, monthly: Decimal) -> SimulationInputs {
        SimulationInputs::default_from(&Regulations::default(), start_age, withdraw_age, monthly)
            .unwrap()
    }

    /// Frictionless inputs: zero return, fees, and inflation, so every
    /// figure is exact and easy to reason about.
    fn frictionless(start_age: u32, withdraw_age: u32, monthly: Decimal) -> SimulationInputs {
        let mut inputs = inputs(start_age, withdraw_age, monthly);
        inputs.expected_return = Decimal::ZERO;
        inputs.fee_aum = Decimal::ZERO;
        inputs.inflation = Decimal::ZERO;
        inputs
    }

    // ---------------------------------------------------------------
    // 1. Frictionless run: balance equals raw contributions
    // ---------------------------------------------------------------
    #[test]
    fn test_frictionless_balance_is_sum_of_contributions() {
        let result = run_simulation(&frictionless(30, 31, dec!(1000))).unwrap();

        assert_eq!(result.gross_balance, dec!(12_000));
        assert_eq!(result.total_contributions, dec!(12_000));
        assert_eq!(result.real_basis, dec!(12_000));
        assert_eq!(result.real_gain, Decimal::ZERO);
        assert_eq!(result.tax_amount, Decimal::ZERO);
        assert_eq!(result.net_balance, dec!(12_000));
        assert!(!result.cap_was_binding);
    }

    // ---------------------------------------------------------------
    // 2. Deposit fee reduces the balance but not the recorded basis
    // ---------------------------------------------------------------
    #[test]
    fn test_deposit_fee_creates_negative_real_gain_without_tax() {
        let mut inputs = frictionless(30, 31, dec!(1000));
        inputs.fee_deposit = dec!(0.04);
        inputs.withdrawal_mode = WithdrawalMode::LumpSum;
        let result = run_simulation(&inputs).unwrap();

        // 12 * 1000 * 0.96 in the account, full 12_000 recorded as basis
        assert_eq!(result.gross_balance, dec!(11_520));
        assert_eq!(result.total_contributions, dec!(12_000));
        assert_eq!(result.real_gain, dec!(-480));
        // Losses are never taxed
        assert_eq!(result.tax_amount, Decimal::ZERO);
        assert_eq!(result.net_balance, result.gross_balance);
    }

    // ---------------------------------------------------------------
    // 3. Cap clipping: per-year forfeit accumulates across the run
    // ---------------------------------------------------------------
    #[test]
    fn test_cap_clips_contributions() {
        let mut inputs = frictionless(30, 32, dec!(8000));
        inputs.annual_cap = dec!(83_641);
        let result = run_simulation(&inputs).unwrap();

        // 96_000 desired per year vs a cap of 83_641
        assert!(result.cap_was_binding);
        assert_eq!(result.cap_limited_amount, dec!(24_718)); // 12_359 * 2 years
        assert_eq!(result.total_contributions, dec!(167_282)); // 83_641 * 2
    }

    // ---------------------------------------------------------------
    // 4. Cap of zero rejects everything and still produces a result
    // ---------------------------------------------------------------
    #[test]
    fn test_zero_cap_rejects_all_contributions() {
        let mut inputs = inputs(30, 60, dec!(5000));
        inputs.annual_cap = Decimal::ZERO;
        let result = run_simulation(&inputs).unwrap();

        assert!(result.cap_was_binding);
        assert_eq!(result.total_contributions, Decimal::ZERO);
        assert_eq!(result.gross_balance, Decimal::ZERO);
        assert_eq!(result.tax_amount, Decimal::ZERO);
        assert_eq!(result.cap_limited_amount, dec!(5000) * dec!(360));
    }

    // ---------------------------------------------------------------
    // 5. Zero contribution is a valid pure-growth (empty) run
    // ---------------------------------------------------------------
    #[test]
    fn test_zero_contribution_is_valid() {
        let result = run_simulation(&inputs(30, 60, Decimal::ZERO)).unwrap();

        assert_eq!(result.total_contributions, Decimal::ZERO);
        assert_eq!(result.gross_balance, Decimal::ZERO);
        assert_eq!(result.tax_amount, Decimal::ZERO);
        assert!(!result.cap_was_binding);
        assert_eq!(result.monthly_results.len(), 360);
    }

    // ---------------------------------------------------------------
    // 6. Yearly snapshots: one per contribution year, final year flushed
    // ---------------------------------------------------------------
    #[test]
    fn test_yearly_snapshots() {
        let result = run_simulation(&frictionless(30, 33, dec!(1000))).unwrap();
        let years = &result.yearly_results;

        assert_eq!(years.len(), 3);
        assert_eq!(years[0].year, 1);
        assert_eq!(years[0].age, 31);
        assert_eq!(years[0].contributions_ytd, dec!(12_000));
        assert_eq!(years[1].cumulative_contributions, dec!(24_000));
        // The final snapshot carries the withdrawal age
        assert_eq!(years[2].age, 33);
        assert_eq!(years[2].cumulative_contributions, dec!(36_000));
    }

    // ---------------------------------------------------------------
    // 7. Monthly snapshots: count, ages, cumulative totals
    // ---------------------------------------------------------------
    #[test]
    fn test_monthly_snapshots() {
        let result = run_simulation(&frictionless(40, 41, dec!(500))).unwrap();
        let months = &result.monthly_results;

        assert_eq!(months.len(), 12);
        assert_eq!(months[0].month, 0);
        assert_eq!(months[0].age, dec!(40));
        assert_eq!(months[0].cumulative_contributions, dec!(500));
        assert_eq!(months[11].cumulative_contributions, dec!(6000));
        assert!(months[11].age > dec!(40.9) && months[11].age < dec!(41));
    }

    // ---------------------------------------------------------------
    // 8. Balance recurrence against a hand-computed two-month case
    // ---------------------------------------------------------------
    #[test]
    fn test_balance_recurrence_hand_computed() {
        let mut inputs = frictionless(30, 31, dec!(1000));
        inputs.expected_return = dec!(0.12);
        inputs.fee_aum = dec!(0.012);
        let result = run_simulation(&inputs).unwrap();

        let r_m = rates::annual_to_monthly(dec!(0.12)).unwrap();
        let f_m = dec!(0.001);

        let b1 = dec!(1000) * (Decimal::ONE + r_m) * (Decimal::ONE - f_m);
        let b2 = (b1 + dec!(1000)) * (Decimal::ONE + r_m) * (Decimal::ONE - f_m);

        assert_eq!(result.monthly_results[0].balance, b1);
        assert_eq!(result.monthly_results[1].balance, b2);
    }

    // ---------------------------------------------------------------
    // 9. Forward-inflation basis formula
    // ---------------------------------------------------------------
    #[test]
    fn test_real_basis_indexes_each_contribution_forward() {
        let records = vec![
            ContributionRecord { month: 0, amount: dec!(100) },
            ContributionRecord { month: 12, amount: dec!(100) },
        ];
        let basis = real_basis_at(&records, 12, dec!(0.01));

        // 100 * 1.01^12 + 100 * 1.01^0
        let expected = dec!(100) * dec!(1.01).powu(12) + dec!(100);
        assert_eq!(basis, expected);
        assert!((basis - dec!(212.6825030)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_real_basis_zero_inflation_is_nominal_sum() {
        let records = vec![
            ContributionRecord { month: 3, amount: dec!(250) },
            ContributionRecord { month: 9, amount: dec!(750) },
        ];
        assert_eq!(real_basis_at(&records, 20, Decimal::ZERO), dec!(1000));
    }

    // ---------------------------------------------------------------
    // 10. net = gross - tax, and the tax rule per mode
    // ---------------------------------------------------------------
    #[test]
    fn test_net_balance_identity_and_tax_rule() {
        let base = inputs(30, 60, dec!(3000));

        let annuity = run_simulation(&base).unwrap();
        assert_eq!(annuity.tax_amount, Decimal::ZERO);
        assert_eq!(annuity.net_balance, annuity.gross_balance);

        let lump = run_simulation(&base.with_mode(WithdrawalMode::LumpSum)).unwrap();
        assert_eq!(
            lump.tax_amount,
            lump.inputs.capital_gains_tax * lump.real_gain.max(Decimal::ZERO)
        );
        assert_eq!(lump.net_balance, lump.gross_balance - lump.tax_amount);
        // Same accumulation either way
        assert_eq!(lump.gross_balance, annuity.gross_balance);
    }

    // ---------------------------------------------------------------
    // 11. Annuity below the minimum age is taxed like a lump sum
    // ---------------------------------------------------------------
    #[test]
    fn test_annuity_below_min_age_taxed() {
        let result = run_simulation(&inputs(30, 55, dec!(3000))).unwrap();
        assert!(result.real_gain > Decimal::ZERO);
        assert!(result.tax_amount > Decimal::ZERO);
        assert_eq!(
            result.tax_amount,
            result.inputs.capital_gains_tax * result.real_gain
        );
    }

    // ---------------------------------------------------------------
    // 12. Counterfactual annuity age threads through the tax rule
    // ---------------------------------------------------------------
    #[test]
    fn test_counterfactual_annuity_min_age() {
        let mut relaxed = inputs(30, 55, dec!(3000));
        relaxed.annuity_min_age = 55;
        let result = run_simulation(&relaxed).unwrap();
        assert_eq!(result.tax_amount, Decimal::ZERO);
    }

    // ---------------------------------------------------------------
    // 13. Management fee drag is monotone
    // ---------------------------------------------------------------
    #[test]
    fn test_higher_fee_never_increases_gross_balance() {
        let base = inputs(30, 60, dec!(3000));
        let mut previous: Option<Decimal> = None;
        for fee in [dec!(0), dec!(0.004), dec!(0.0065), dec!(0.0105)] {
            let mut next = base.clone();
            next.fee_aum = fee;
            let result = run_simulation(&next).unwrap();
            if let Some(prev) = previous {
                assert!(result.gross_balance < prev, "fee {fee} did not reduce balance");
            }
            previous = Some(result.gross_balance);
        }
    }

    // ---------------------------------------------------------------
    // 14. Determinism: identical inputs, identical result
    // ---------------------------------------------------------------
    #[test]
    fn test_simulation_is_deterministic() {
        let base = inputs(30, 60, dec!(6970));
        let a = run_simulation(&base).unwrap();
        let b = run_simulation(&base).unwrap();
        assert_eq!(a, b);
    }

    // ---------------------------------------------------------------
    // 15. Derived measures
    // ---------------------------------------------------------------
    #[test]
    fn test_effective_tax_rate_and_annuity_savings() {
        let annuity = run_simulation(&inputs(30, 60, dec!(3000))).unwrap();
        assert_eq!(annuity.effective_tax_rate(), Decimal::ZERO);
        // The exemption saved exactly the lump-sum tax
        let lump = run_simulation(&annuity.inputs.with_mode(WithdrawalMode::LumpSum)).unwrap();
        assert_eq!(annuity.tax_savings_from_annuity(), lump.tax_amount);
        assert_eq!(lump.tax_savings_from_annuity(), Decimal::ZERO);

        assert!(lump.effective_tax_rate() > Decimal::ZERO);
        assert!(lump.effective_tax_rate() < lump.inputs.capital_gains_tax);
    }

    // ---------------------------------------------------------------
    // 16. Invalid configuration never reaches the loop
    // ---------------------------------------------------------------
    #[test]
    fn test_invalid_inputs_fail_fast() {
        let mut bad = inputs(30, 60, dec!(3000));
        bad.start_age = 60;
        assert!(run_simulation(&bad).is_err());

        let mut bad = inputs(30, 60, dec!(3000));
        bad.inflation = dec!(-0.01);
        assert!(run_simulation(&bad).is_err());
    }

    // ---------------------------------------------------------------
    // 17. Envelope: warnings surface cap enforcement
    // ---------------------------------------------------------------
    #[test]
    fn test_simulate_envelope_warns_on_binding_cap() {
        let mut capped = inputs(30, 32, dec!(8000));
        capped.annual_cap = dec!(83_641);
        let output = simulate(&capped).unwrap();
        assert!(output.warnings.iter().any(|w| w.contains("cap")));

        let output = simulate(&inputs(30, 32, dec!(3000))).unwrap();
        assert!(output.warnings.is_empty());
    }
}
