use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Statutory parameters for investment provident funds.
///
/// Threaded into every entry point as an explicit value rather than as
/// module constants, so counterfactual policy scenarios can be simulated by
/// overriding individual fields per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regulations {
    /// Annual contribution cap per saver, in NIS.
    pub annual_cap: Money,
    /// Maximum annual AUM fee a fund may charge.
    pub max_fee_aum: Rate,
    /// Maximum fee on deposits.
    pub max_fee_deposit: Rate,
    /// Maximum AUM fee while receiving an annuity.
    pub max_fee_annuity: Rate,
    /// Flat capital-gains tax rate on real gains.
    pub capital_gains_tax: Rate,
    /// Minimum age for tax-free annuity conversion.
    pub annuity_min_age: u32,
}

impl Default for Regulations {
    /// The 2026 statutory values.
    fn default() -> Self {
        Self {
            annual_cap: dec!(83_641),
            max_fee_aum: dec!(0.0105),
            max_fee_deposit: dec!(0.04),
            max_fee_annuity: dec!(0.006),
            capital_gains_tax: dec!(0.25),
            annuity_min_age: 60,
        }
    }
}

impl Regulations {
    /// Soft diagnostics for fees above the statutory caps.
    ///
    /// Exceeding a cap is not a validation failure: counterfactual runs with
    /// illegal fee levels are allowed, the caller just gets told.
    pub fn fee_warnings(&self, fee_aum: Rate, fee_deposit: Rate) -> Vec<String> {
        let mut warnings = Vec::new();
        if fee_aum > self.max_fee_aum {
            warnings.push(format!(
                "AUM fee {:.2}% exceeds the legal cap of {:.2}%",
                fee_aum * dec!(100),
                self.max_fee_aum * dec!(100),
            ));
        }
        if fee_deposit > self.max_fee_deposit {
            warnings.push(format!(
                "Deposit fee {:.2}% exceeds the legal cap of {:.2}%",
                fee_deposit * dec!(100),
                self.max_fee_deposit * dec!(100),
            ));
        }
        warnings
    }
}
