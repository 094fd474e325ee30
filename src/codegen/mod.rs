//! Move source generation for publish intents.
//!
//! Values are never pasted into the template as raw text. Strings become
//! byte-string literals (hex when they contain anything but printable ASCII
//! other than quote and backslash), ids are re-rendered from parsed
//! addresses and numbers from typed integers.

mod templates;

pub use templates::{render_pool_token_factory, render_token_factory};

use crate::address::SuiAddress;
use std::fmt::Write;

/// Directory of the token factory package under the packages root
pub const TOKEN_FACTORY_PACKAGE: &str = "token_factory";
/// Directory of the pool token factory package under the packages root
pub const POOL_TOKEN_FACTORY_PACKAGE: &str = "token_pool_factory";
/// Source file name (without extension) inside `sources/`
pub const TOKEN_FACTORY_MODULE: &str = "token_factory";

/// Rendered module source and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSource {
    /// Package directory name
    pub package: &'static str,
    /// Module file name inside `sources/`
    pub module: &'static str,
    pub source: String,
}

/// Token metadata baked into a generated module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTemplate {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub description: String,
}

/// Token metadata plus the pool the module creates for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolTokenTemplate {
    pub token: TokenTemplate,
    pub initial_supply: u64,
    pub protocol_config: SuiAddress,
    pub coin_b: SuiAddress,
    pub coin_b_symbol: String,
    pub coin_b_decimals: u8,
    pub tick_spacing: u32,
    pub fee_basis_points: u64,
    pub current_sqrt_price: u128,
}

/// Render bytes as a Move `vector<u8>` literal.
pub fn byte_literal(value: &str) -> String {
    let plain = value
        .bytes()
        .all(|b| (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\');
    if plain {
        format!("b\"{}\"", value)
    } else {
        let mut out = String::with_capacity(value.len() * 2 + 3);
        out.push_str("x\"");
        for b in value.bytes() {
            // writing to a String cannot fail
            let _ = write!(out, "{:02x}", b);
        }
        out.push('"');
        out
    }
}

/// Render an address literal (`@0x...`)
pub fn address_literal(address: &SuiAddress) -> String {
    format!("@{}", address.to_hex_literal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("TEST", "b\"TEST\"")]
    #[case("My Token 2.0", "b\"My Token 2.0\"")]
    #[case("", "b\"\"")]
    #[case("a\"b", "x\"612262\"")]
    #[case("a\\b", "x\"615c62\"")]
    #[case("line\nbreak", "x\"6c696e650a627265616b\"")]
    #[case("é", "x\"c3a9\"")]
    fn test_byte_literal(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(byte_literal(input), expected);
    }

    #[test]
    fn test_injection_stays_inside_literal() {
        let hostile = "X\", ctx); } public fun drain() { abort 0 } fun f() { (b\"";
        let literal = byte_literal(hostile);
        assert!(literal.starts_with("x\""));
        assert_eq!(literal.matches('"').count(), 2);
    }

    #[test]
    fn test_address_literal() {
        let addr: SuiAddress = "0x6".parse().unwrap();
        assert_eq!(
            address_literal(&addr),
            "@0x0000000000000000000000000000000000000000000000000000000000000006"
        );
    }
}
