//! Decimal amounts.
//!
//! Amounts are stored as canonical decimal strings and only ever handled as
//! [`Decimal`] in memory.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a stored decimal string.
///
/// # Errors
/// Returns `Error::CorruptAmount` if the value is not a valid decimal.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|_| Error::CorruptAmount {
        value: raw.to_string(),
    })
}

/// Formats a decimal for storage, without trailing zeros.
#[must_use]
pub fn format_amount(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Rejects zero and negative request amounts.
pub fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount.is_sign_positive() && !amount.is_zero() {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_and_format() {
        assert_eq!(parse_amount("1000.50").unwrap(), dec!(1000.5));
        assert_eq!(parse_amount(" -300 ").unwrap(), dec!(-300));
        assert_eq!(format_amount(dec!(1000.50)), "1000.5");
        assert_eq!(format_amount(dec!(2000)), "2000");
        assert_eq!(format_amount(dec!(-0)), "0");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_amount("12abc").unwrap_err(),
            Error::CorruptAmount { value } if value == "12abc"
        ));
    }

    #[test]
    fn test_small_amounts_do_not_drift() {
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += parse_amount("0.1").unwrap();
        }
        assert_eq!(format_amount(total), "100");
    }

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive(dec!(0.01)).is_ok());
        assert!(matches!(
            ensure_positive(Decimal::ZERO).unwrap_err(),
            Error::InvalidAmount { .. }
        ));
        assert!(matches!(
            ensure_positive(dec!(-5)).unwrap_err(),
            Error::InvalidAmount { .. }
        ));
    }
}
