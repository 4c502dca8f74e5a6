//! Conversion between raw on-chain token amounts and decimals.

use alloy::primitives::{
    U256,
    utils::{ParseUnits, format_units, parse_units},
};
use fastnum::UD256;

use crate::error::SdkError;

/// Most decimals a token amount can be formatted with.
pub const MAX_DECIMALS: u8 = 77;

/// Converter between raw token units and human-readable decimal amounts,
/// for a token with the given number of decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Converter {
    decimals: u8,
}

impl Converter {
    pub const fn new(decimals: u8) -> Self { Self { decimals } }

    pub fn decimals(&self) -> u8 { self.decimals }

    /// Formats the raw amount as a plain decimal string, trimming trailing
    /// zeros of the fraction.
    ///
    /// With more than [`MAX_DECIMALS`] the raw amount is shown, marked as
    /// such.
    pub fn format(&self, amount: U256) -> String {
        let Ok(formatted) = format_units(amount, self.decimals) else {
            return format!("{amount} (raw units)");
        };
        if formatted.contains('.') {
            formatted.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            formatted
        }
    }

    /// Converts the raw amount into a decimal.
    pub fn from_unsigned(&self, amount: U256) -> UD256 {
        self.format(amount).parse::<UD256>().unwrap_or(UD256::MAX)
    }

    /// Parses user input into raw token units.
    ///
    /// Accepts digits with an optional fraction of at most
    /// [`Self::decimals`] digits.
    pub fn parse(&self, input: &str) -> Result<U256, SdkError> {
        let input = input.trim();
        let (whole, fraction) = match input.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (input, None),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SdkError::validation(format!("invalid amount: {input:?}")));
        }
        if let Some(fraction) = fraction {
            if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                return Err(SdkError::validation(format!("invalid amount: {input:?}")));
            }
            if fraction.len() > self.decimals as usize {
                return Err(SdkError::validation(format!(
                    "amount {input} has more than {} fractional digits",
                    self.decimals
                )));
            }
        }
        match parse_units(input, self.decimals)
            .map_err(|err| SdkError::validation(format!("invalid amount {input:?}: {err}")))?
        {
            ParseUnits::U256(value) => Ok(value),
            ParseUnits::I256(_) => Err(SdkError::validation("amount must not be negative")),
        }
    }

    /// Same as [`Self::parse`], rejecting zero amounts.
    pub fn parse_positive(&self, input: &str) -> Result<U256, SdkError> {
        let value = self.parse(input)?;
        if value.is_zero() {
            return Err(SdkError::validation("amount must be greater than zero"));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec256;

    use super::*;

    #[test]
    fn test_format_trims_fraction() {
        let usdc = Converter::new(6);
        assert_eq!(usdc.format(U256::from(1_500_000u64)), "1.5");
        assert_eq!(usdc.format(U256::from(2_000_000u64)), "2");
        assert_eq!(usdc.format(U256::from(1u64)), "0.000001");
        assert_eq!(Converter::new(0).format(U256::from(42u64)), "42");
    }

    #[test]
    fn test_format_too_many_decimals() {
        let max = Converter::new(MAX_DECIMALS);
        assert_eq!(max.format(U256::ZERO), "0");
        assert_eq!(Converter::new(80).format(U256::from(1000u64)), "1000 (raw units)");
    }

    #[test]
    fn test_from_unsigned() {
        let weth = Converter::new(18);
        assert_eq!(weth.from_unsigned(U256::from(1_250_000_000_000_000_000u128)), udec256!(1.25));
        assert_eq!(weth.from_unsigned(U256::ZERO), UD256::ZERO);
    }

    #[test]
    fn test_parse() {
        let usdc = Converter::new(6);
        assert_eq!(usdc.parse("1.5").unwrap(), U256::from(1_500_000u64));
        assert_eq!(usdc.parse(" 10 ").unwrap(), U256::from(10_000_000u64));
        assert_eq!(usdc.parse("0.000001").unwrap(), U256::from(1u64));
        assert!(matches!(usdc.parse("0.0000001"), Err(SdkError::Validation(_))));
        assert!(matches!(usdc.parse("1."), Err(SdkError::Validation(_))));
        assert!(matches!(usdc.parse(".5"), Err(SdkError::Validation(_))));
        assert!(matches!(usdc.parse("-1"), Err(SdkError::Validation(_))));
        assert!(matches!(usdc.parse("1e6"), Err(SdkError::Validation(_))));
        assert!(matches!(usdc.parse(""), Err(SdkError::Validation(_))));
        assert!(matches!(usdc.parse_positive("0.0"), Err(SdkError::Validation(_))));
    }
}
