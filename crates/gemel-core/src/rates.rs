use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::ProvidentError;
use crate::types::Rate;
use crate::ProvidentResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Convert an annual rate to its compound-consistent monthly equivalent.
///
/// r_m = (1 + R)^(1/12) - 1, so compounding the result over 12 periods
/// reproduces the annual rate (up to Decimal tolerance). Used for returns
/// and inflation, never for the AUM fee.
pub fn annual_to_monthly(annual: Rate) -> ProvidentResult<Rate> {
    if annual <= dec!(-1) {
        return Err(ProvidentError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Rate must be greater than -100%".into(),
        });
    }
    if annual.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let base = Decimal::ONE + annual;
    Ok(base.powd(Decimal::ONE / MONTHS_PER_YEAR) - Decimal::ONE)
}

/// Monthly AUM fee slice.
///
/// Funds quote the annual fee and deduct it in twelve equal slices, so this
/// is simple division rather than compound conversion.
pub fn monthly_aum_fee(fee_annual: Rate) -> Rate {
    fee_annual / MONTHS_PER_YEAR
}

/// Fee-adjusted compound annual return: (1 + R)(1 - f) - 1.
pub fn net_annual_return(gross: Rate, fee: Rate) -> Rate {
    (Decimal::ONE + gross) * (Decimal::ONE - fee) - Decimal::ONE
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: Decimal = dec!(0.0000001);

    #[test]
    fn test_monthly_rate_compounds_back_to_annual() {
        for annual in [dec!(0.05), dec!(0.025), dec!(0.12), dec!(0.0001)] {
            let monthly = annual_to_monthly(annual).unwrap();
            let mut compounded = Decimal::ONE;
            for _ in 0..12 {
                compounded *= Decimal::ONE + monthly;
            }
            let diff = (compounded - Decimal::ONE - annual).abs();
            assert!(diff < TOLERANCE, "annual={annual} diff={diff}");
        }
    }

    #[test]
    fn test_zero_annual_rate_is_zero_monthly() {
        assert_eq!(annual_to_monthly(Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_negative_annual_rate_converts() {
        let monthly = annual_to_monthly(dec!(-0.10)).unwrap();
        assert!(monthly < Decimal::ZERO);
        let mut compounded = Decimal::ONE;
        for _ in 0..12 {
            compounded *= Decimal::ONE + monthly;
        }
        assert!((compounded - dec!(0.90)).abs() < TOLERANCE);
    }

    #[test]
    fn test_rate_below_minus_one_rejected() {
        assert!(annual_to_monthly(dec!(-1)).is_err());
        assert!(annual_to_monthly(dec!(-1.5)).is_err());
    }

    #[test]
    fn test_aum_fee_is_simple_division() {
        assert_eq!(monthly_aum_fee(dec!(0.012)), dec!(0.001));
        // Deliberately not the compound conversion
        let compound = annual_to_monthly(dec!(0.012)).unwrap();
        assert!(monthly_aum_fee(dec!(0.012)) != compound);
    }

    #[test]
    fn test_net_annual_return() {
        // (1.05)(0.9935) - 1 = 0.043175
        assert_eq!(net_annual_return(dec!(0.05), dec!(0.0065)), dec!(0.043175));
        assert_eq!(net_annual_return(dec!(0.05), Decimal::ZERO), dec!(0.05));
        assert_eq!(net_annual_return(Decimal::ZERO, dec!(0.01)), dec!(-0.01));
    }
}
