//! Coin type -> display metadata.

use crate::network::MAINNET_USDC_TYPE;
use serde::{Deserialize, Serialize};

pub const SUI_TYPE: &str = "0x2::sui::SUI";
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";
/// Decimals assumed for unregistered coin types. A guess, not a guarantee.
pub const UNKNOWN_DECIMALS: u8 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinMetadata {
    #[serde(rename = "type")]
    pub type_identifier: String,
    pub symbol: String,
    pub decimals: u8,
}

impl CoinMetadata {
    fn new(type_identifier: &str, symbol: &str, decimals: u8) -> Self {
        CoinMetadata {
            type_identifier: type_identifier.to_string(),
            symbol: symbol.to_string(),
            decimals,
        }
    }

    /// Whether this is the synthetic record for an unregistered type
    pub fn is_unknown(&self) -> bool {
        self.symbol == UNKNOWN_SYMBOL
    }
}

/// Pre-registered coin types
pub fn registered() -> [CoinMetadata; 2] {
    [
        CoinMetadata::new(MAINNET_USDC_TYPE, "USDC", 6),
        CoinMetadata::new(SUI_TYPE, "SUI", 9),
    ]
}

/// Resolve metadata by exact type match, falling back to `UNKNOWN`/9.
pub fn coin_metadata(type_identifier: &str) -> CoinMetadata {
    registered()
        .into_iter()
        .find(|c| c.type_identifier == type_identifier)
        .unwrap_or_else(|| CoinMetadata::new(type_identifier, UNKNOWN_SYMBOL, UNKNOWN_DECIMALS))
}
