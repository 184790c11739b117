use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ProvidentError;
use crate::rates;
use crate::regulations::Regulations;
use crate::types::{Money, Rate};
use crate::ProvidentResult;

use super::engine::SimulationResult;

/// How the accumulated balance is withdrawn at the end of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalMode {
    /// Single taxable withdrawal of the whole balance.
    LumpSum,
    /// Conversion to a recognized annuity, tax-free from the minimum age.
    Annuity,
}

impl fmt::Display for WithdrawalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WithdrawalMode::LumpSum => write!(f, "Lump Sum"),
            WithdrawalMode::Annuity => write!(f, "Annuity"),
        }
    }
}

/// Input parameters for a provident fund simulation.
///
/// Immutable per run: sweeps never mutate a shared instance, they derive a
/// new one via [`SimulationInputs::with_override`] or
/// [`SimulationInputs::with_mode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInputs {
    /// Age when contributions begin.
    pub start_age: u32,
    /// Target withdrawal age (60+ for the annuity benefit).
    pub withdraw_age: u32,
    /// Monthly contribution amount in NIS.
    pub monthly_contribution: Money,
    /// Annual contribution cap in NIS.
    #[serde(default = "default_annual_cap")]
    pub annual_cap: Money,
    /// Expected annual nominal return.
    #[serde(default = "default_expected_return")]
    pub expected_return: Rate,
    /// Annual AUM fee.
    #[serde(default = "default_fee_aum")]
    pub fee_aum: Rate,
    /// Fee on deposits, often waived in practice.
    #[serde(default)]
    pub fee_deposit: Rate,
    /// Expected annual inflation rate.
    #[serde(default = "default_inflation")]
    pub inflation: Rate,
    /// Tax rate on real gains for lump-sum withdrawal.
    #[serde(default = "default_capital_gains_tax")]
    pub capital_gains_tax: Rate,
    /// Minimum age for tax-free annuity conversion.
    #[serde(default = "default_annuity_min_age")]
    pub annuity_min_age: u32,
    #[serde(default = "default_withdrawal_mode")]
    pub withdrawal_mode: WithdrawalMode,
}

fn default_annual_cap() -> Money {
    Regulations::default().annual_cap
}

fn default_expected_return() -> Rate {
    dec!(0.05)
}

fn default_fee_aum() -> Rate {
    // Market average
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

impl SimulationInputs {
    /// Convenience constructor taking the statutory values from a
    /// [`Regulations`] and market-average defaults for everything else.
    pub fn default_from(
        regulations: &Regulations,
        start_age: u32,
        withdraw_age: u32,
        monthly_contribution: Money,
    ) -> ProvidentResult<Self> {
        Self {
            start_age,
            withdraw_age,
            monthly_contribution,
            annual_cap: regulations.annual_cap,
            expected_return: default_expected_return(),
            fee_aum: default_fee_aum(),
            fee_deposit: Decimal::ZERO,
            inflation: default_inflation(),
            capital_gains_tax: regulations.capital_gains_tax,
            annuity_min_age: regulations.annuity_min_age,
            withdrawal_mode: WithdrawalMode::Annuity,
        }
        .validated()
    }

    /// Check the construction invariants.
    pub fn validate(&self) -> ProvidentResult<()> {
        if self.start_age >= self.withdraw_age {
            return Err(ProvidentError::InvalidInput {
                field: "start_age".into(),
                reason: format!(
                    "start_age ({}) must be less than withdraw_age ({})",
                    self.start_age, self.withdraw_age
                ),
            });
        }
        for (field, value) in [
            ("monthly_contribution", self.monthly_contribution),
            ("annual_cap", self.annual_cap),
            ("expected_return", self.expected_return),
            ("fee_aum", self.fee_aum),
            ("fee_deposit", self.fee_deposit),
            ("inflation", self.inflation),
            ("capital_gains_tax", self.capital_gains_tax),
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

    /// Validating factory: consume and return the inputs only if valid.
    pub fn validated(self) -> ProvidentResult<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Derive a new inputs value with one numeric field overridden.
    ///
    /// The result is re-validated, so an override that breaks an invariant
    /// (e.g. a start age at or above the withdrawal age) fails here and
    /// never reaches the projection engine.
    pub fn with_override(&self, field: ParamField, value: Decimal) -> ProvidentResult<Self> {
        let mut next = self.clone();
        match field {
            ParamField::StartAge => next.start_age = decimal_to_age(field, value)?,
            ParamField::WithdrawAge => next.withdraw_age = decimal_to_age(field, value)?,
            ParamField::MonthlyContribution => next.monthly_contribution = value,
            ParamField::AnnualCap => next.annual_cap = value,
            ParamField::ExpectedReturn => next.expected_return = value,
            ParamField::FeeAum => next.fee_aum = value,
            ParamField::FeeDeposit => next.fee_deposit = value,
            ParamField::Inflation => next.inflation = value,
            ParamField::CapitalGainsTax => next.capital_gains_tax = value,
        }
        next.validated()
    }

    /// Derive a new inputs value with the withdrawal mode replaced.
    pub fn with_mode(&self, mode: WithdrawalMode) -> Self {
        let mut next = self.clone();
        next.withdrawal_mode = mode;
        next
    }

    pub fn years_of_contribution(&self) -> u32 {
        self.withdraw_age - self.start_age
    }

    pub fn months_of_contribution(&self) -> usize {
        self.years_of_contribution() as usize * 12
    }

    /// Fee-adjusted compound annual return.
    pub fn net_annual_return(&self) -> Rate {
        rates::net_annual_return(self.expected_return, self.fee_aum)
    }

    /// Whether the withdrawal age qualifies for tax-free annuity conversion.
    pub fn is_annuity_eligible(&self) -> bool {
        self.withdraw_age >= self.annuity_min_age
    }
}

fn decimal_to_age(field: ParamField, value: Decimal) -> ProvidentResult<u32> {
    value.trunc().to_u32().ok_or_else(|| ProvidentError::InvalidInput {
        field: field.name().into(),
        reason: format!("not a representable age: {value}"),
    })
}

/// The overridable numeric fields of [`SimulationInputs`].
///
/// Enumerated explicitly so parameter sweeps never touch fields by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamField {
    StartAge,
    WithdrawAge,
    MonthlyContribution,
    AnnualCap,
    ExpectedReturn,
    FeeAum,
    FeeDeposit,
    Inflation,
    CapitalGainsTax,
}

impl ParamField {
    pub fn name(&self) -> &'static str {
        match self {
            ParamField::StartAge => "start_age",
            ParamField::WithdrawAge => "withdraw_age",
            ParamField::MonthlyContribution => "monthly_contribution",
            ParamField::AnnualCap => "annual_cap",
            ParamField::ExpectedReturn => "expected_return",
            ParamField::FeeAum => "fee_aum",
            ParamField::FeeDeposit => "fee_deposit",
            ParamField::Inflation => "inflation",
            ParamField::CapitalGainsTax => "capital_gains_tax",
        }
    }

    /// Human-readable label for a swept value, used as an axis label.
    pub fn format_value(&self, value: Decimal) -> String {
        match self {
            ParamField::StartAge | ParamField::WithdrawAge => {
                format!("Age {}", value.trunc().normalize())
            }
            ParamField::MonthlyContribution | ParamField::AnnualCap => {
                format!("₪{:.0}", value)
            }
            _ => format!("{:.2}%", value * dec!(100)),
        }
    }
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamField {
    type Err = ProvidentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start_age" => Ok(ParamField::StartAge),
            "withdraw_age" => Ok(ParamField::WithdrawAge),
            "monthly_contribution" => Ok(ParamField::MonthlyContribution),
            "annual_cap" => Ok(ParamField::AnnualCap),
            "expected_return" => Ok(ParamField::ExpectedReturn),
            "fee_aum" => Ok(ParamField::FeeAum),
            "fee_deposit" => Ok(ParamField::FeeDeposit),
            "inflation" => Ok(ParamField::Inflation),
            "capital_gains_tax" => Ok(ParamField::CapitalGainsTax),
            other => Err(ProvidentError::UnknownParameter(other.to_string())),
        }
    }
}

/// Result metric reported by a sensitivity sweep cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMetric {
    NetBalance,
    GrossBalance,
    TaxAmount,
    TotalContributions,
    RealBasis,
    RealGain,
    CapLimitedAmount,
}

impl OutputMetric {
    pub fn name(&self) -> &'static str {
        match self {
            OutputMetric::NetBalance => "net_balance",
            OutputMetric::GrossBalance => "gross_balance",
            OutputMetric::TaxAmount => "tax_amount",
            OutputMetric::TotalContributions => "total_contributions",
            OutputMetric::RealBasis => "real_basis",
            OutputMetric::RealGain => "real_gain",
            OutputMetric::CapLimitedAmount => "cap_limited_amount",
        }
    }

    pub fn extract(&self, result: &SimulationResult) -> Decimal {
        match self {
            OutputMetric::NetBalance => result.net_balance,
            OutputMetric::GrossBalance => result.gross_balance,
            OutputMetric::TaxAmount => result.tax_amount,
            OutputMetric::TotalContributions => result.total_contributions,
            OutputMetric::RealBasis => result.real_basis,
            OutputMetric::RealGain => result.real_gain,
            OutputMetric::CapLimitedAmount => result.cap_limited_amount,
        }
    }
}

impl fmt::Display for OutputMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputMetric {
    type Err = ProvidentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "net_balance" => Ok(OutputMetric::NetBalance),
            "gross_balance" => Ok(OutputMetric::GrossBalance),
            "tax_amount" => Ok(OutputMetric::TaxAmount),
            "total_contributions" => Ok(OutputMetric::TotalContributions),
            "real_basis" => Ok(OutputMetric::RealBasis),
            "real_gain" => Ok(OutputMetric::RealGain),
            "cap_limited_amount" => Ok(OutputMetric::CapLimitedAmount),
            other => Err(ProvidentError::UnknownMetric(other.to_string())),
        }
    }
}
