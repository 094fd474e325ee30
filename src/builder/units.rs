//! Exact decimal text handling for token amounts and prices.
//!
//! Values are kept as digit strings until they are scaled into integers, so
//! no amount ever passes through floating point.

use crate::error::AssemblyError;
use alloy_primitives::U256;

/// A non-negative decimal `digits / 10^scale`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    pub digits: U256,
    pub scale: u32,
}

impl Decimal {
    pub fn is_zero(&self) -> bool {
        self.digits.is_zero()
    }
}

/// `10^exp` as a U256
pub fn pow10(exp: u32) -> U256 {
    U256::from(10u8).pow(U256::from(exp))
}

fn split(text: &str, field: &str) -> Result<(String, String), AssemblyError> {
    let invalid = |reason: &str| AssemblyError::InvalidAmount {
        field: field.to_string(),
        reason: reason.to_string(),
    };
    let text = text.trim();
    if text.is_empty() {
        return Err(invalid("empty value"));
    }
    if text.starts_with('-') {
        return Err(invalid("value must not be negative"));
    }
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(invalid(&format!("`{}` is not a decimal number", text)));
    }
    Ok((whole.to_string(), frac.to_string()))
}

fn digits_to_u256(digits: &str, field: &str) -> Result<U256, AssemblyError> {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(trimmed, 10).map_err(|_| AssemblyError::Overflow {
        field: field.to_string(),
        width: "uint256",
    })
}

/// Parse plain decimal notation (`"1"`, `"0.25"`, `".5"`)
pub fn parse_decimal(text: &str, field: &str) -> Result<Decimal, AssemblyError> {
    let (whole, frac) = split(text, field)?;
    let frac = frac.trim_end_matches('0');
    let scale = u32::try_from(frac.len()).map_err(|_| AssemblyError::InvalidAmount {
        field: field.to_string(),
        reason: "too many fractional digits".to_string(),
    })?;
    Ok(Decimal {
        digits: digits_to_u256(&format!("{}{}", whole, frac), field)?,
        scale,
    })
}

/// Scale a decimal amount into base units, e.g. `"1.5"` with 6 decimals is
/// `1500000`. More fractional digits than `decimals` is an error.
pub fn parse_units(text: &str, decimals: u8, field: &str) -> Result<U256, AssemblyError> {
    let (whole, frac) = split(text, field)?;
    let frac = frac.trim_end_matches('0');
    if frac.len() > decimals as usize {
        return Err(AssemblyError::InvalidAmount {
            field: field.to_string(),
            reason: format!("fractional component exceeds {} decimals", decimals),
        });
    }
    let padded = format!("{}{:0<width$}", whole, frac, width = decimals as usize);
    digits_to_u256(&padded, field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1000", 18, "1000000000000000000000")]
    #[case("1.5", 6, "1500000")]
    #[case("0.000001", 6, "1")]
    #[case("42", 0, "42")]
    #[case("1.10", 1, "11")]
    fn test_parse_units(#[case] text: &str, #[case] decimals: u8, #[case] expected: &str) {
        assert_eq!(parse_units(text, decimals, "amount").unwrap().to_string(), expected);
    }

    #[test]
    fn test_parse_units_keeps_precision_at_high_decimals() {
        // 123456789.123456789123456789 * 10^18 is not representable as f64
        let v = parse_units("123456789.123456789123456789", 18, "supply").unwrap();
        assert_eq!(v.to_string(), "123456789123456789123456789");
    }

    #[rstest]
    #[case("1.0000001", 6)]
    #[case("-1", 6)]
    #[case("1e18", 18)]
    #[case("", 6)]
    #[case(".", 6)]
    fn test_parse_units_rejects(#[case] text: &str, #[case] decimals: u8) {
        assert!(parse_units(text, decimals, "amount").is_err());
    }

    #[test]
    fn test_parse_decimal() {
        let d = parse_decimal("0.0250", "price").unwrap();
        assert_eq!(d.digits, U256::from(25u8));
        assert_eq!(d.scale, 3);
        assert_eq!(parse_decimal(".5", "price").unwrap().scale, 1);
    }
}
