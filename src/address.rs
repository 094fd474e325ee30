//! Address and object id parsing for both target chains.
//!
//! Object-chain ids are 32 bytes written as `0x` + up to 64 hex digits; short
//! forms such as `0x6` are left-padded with zeros. EVM addresses are 20 bytes.

use crate::error::AssemblyError;
use alloy_primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const SUI_ADDRESS_LENGTH: usize = 32;

/// Object-chain account address or object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiAddress([u8; SUI_ADDRESS_LENGTH]);

/// Object ids share the address representation.
pub type ObjectId = SuiAddress;

impl SuiAddress {
    pub const ZERO: SuiAddress = SuiAddress([0u8; SUI_ADDRESS_LENGTH]);

    pub fn as_bytes(&self) -> &[u8; SUI_ADDRESS_LENGTH] {
        &self.0
    }

    /// Parse and label failures with the field they came from
    pub fn parse_field(value: &str, field: &str) -> Result<Self, AssemblyError> {
        value.parse().map_err(|_| AssemblyError::InvalidObjectId {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    /// Full 64 digit lowercase form
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for SuiAddress {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AssemblyError::InvalidObjectId {
            field: "address".to_string(),
            value: s.to_string(),
        };
        let digits = s.strip_prefix("0x").ok_or_else(invalid)?;
        if digits.is_empty()
            || digits.len() > SUI_ADDRESS_LENGTH * 2
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(invalid());
        }
        let padded = format!("{:0>64}", digits);
        let mut bytes = [0u8; SUI_ADDRESS_LENGTH];
        hex::decode_to_slice(padded, &mut bytes).map_err(|_| invalid())?;
        Ok(SuiAddress(bytes))
    }
}

impl fmt::Display for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl Serialize for SuiAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_literal())
    }
}

impl<'de> Deserialize<'de> for SuiAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse an EVM address (`0x` + 40 hex digits). All-lowercase and
/// all-uppercase digits are accepted as is; mixed case must carry a valid
/// EIP-55 checksum.
pub fn parse_evm_address(value: &str, field: &str) -> Result<Address, AssemblyError> {
    let invalid = || AssemblyError::InvalidEvmAddress {
        field: field.to_string(),
        value: value.to_string(),
    };
    let digits = value.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.len() != 40 {
        return Err(invalid());
    }
    let mixed_case = digits.bytes().any(|b| b.is_ascii_lowercase())
        && digits.bytes().any(|b| b.is_ascii_uppercase());
    if mixed_case {
        Address::parse_checksummed(value, None).map_err(|_| invalid())
    } else {
        value.parse::<Address>().map_err(|_| invalid())
    }
}

/// Check that a type argument looks like `0xADDR::module::Name<...>`.
///
/// Only the outer shape is checked; generic parameters are validated
/// recursively.
pub fn validate_type_tag(tag: &str) -> Result<(), AssemblyError> {
    let invalid = || AssemblyError::InvalidTypeTag(tag.to_string());
    let (head, generics) = match tag.find('<') {
        Some(idx) => {
            let inner = tag[idx + 1..].strip_suffix('>').ok_or_else(invalid)?;
            (&tag[..idx], Some(inner))
        }
        None => (tag, None),
    };

    let parts: Vec<&str> = head.split("::").collect();
    if parts.len() != 3 {
        return Err(invalid());
    }
    SuiAddress::from_str(parts[0]).map_err(|_| invalid())?;
    for ident in &parts[1..] {
        let mut chars = ident.chars();
        let starts_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid());
        }
    }

    if let Some(inner) = generics {
        for arg in split_type_args(inner) {
            validate_type_tag(arg.trim()).map_err(|_| invalid())?;
        }
    }
    Ok(())
}

/// Split top-level comma separated type arguments
fn split_type_args(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_address_is_padded() {
        let clock: SuiAddress = "0x6".parse().unwrap();
        assert_eq!(clock.as_bytes()[31], 6);
        assert_eq!(
            clock.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000006"
        );
    }

    #[test]
    fn test_rejects_malformed_ids() {
        assert!("6".parse::<SuiAddress>().is_err());
        assert!("0x".parse::<SuiAddress>().is_err());
        assert!("0xtest_address".parse::<SuiAddress>().is_err());
        assert!(format!("0x{}", "a".repeat(65)).parse::<SuiAddress>().is_err());
    }

    #[test]
    fn test_parse_field_labels_error() {
        let err = SuiAddress::parse_field("abc", "treasury cap").unwrap_err();
        assert_eq!(err.to_string(), "Invalid treasury cap format: abc");
    }

    #[test]
    fn test_evm_address() {
        assert!(parse_evm_address("0x5FbDB2315678afecb367f032d93F642f64180aa3", "owner").is_ok());
        assert!(parse_evm_address("0x1234", "owner").is_err());
        assert!(parse_evm_address("0x5fbdb2315678afecb367f032d93f642f64180aa3", "owner").is_ok());
        assert!(parse_evm_address("0x5FBDB2315678AFECB367F032D93F642F64180AA3", "owner").is_ok());
        // one letter's case flipped breaks the checksum
        let err =
            parse_evm_address("0x5FbDB2315678afecb367f032d93F642f64180aA3", "owner").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid owner: 0x5FbDB2315678afecb367f032d93F642f64180aA3"
        );
        assert!(parse_evm_address("5FbDB2315678afecb367f032d93F642f64180aa3", "owner").is_err());
    }

    #[test]
    fn test_type_tags() {
        assert!(validate_type_tag("0x2::sui::SUI").is_ok());
        assert!(validate_type_tag("0x2::coin::Coin<0x2::sui::SUI>").is_ok());
        assert!(validate_type_tag("0x1::pair::Pair<0x2::sui::SUI, 0xabc::usdc::USDC>").is_ok());
        assert!(validate_type_tag("0xcustom::coin::TYPE").is_err());
        assert!(validate_type_tag("sui::SUI").is_err());
        assert!(validate_type_tag("0x2::coin::Coin<0x2::sui::SUI").is_err());
    }
}
