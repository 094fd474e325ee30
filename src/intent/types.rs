//! Intent tags and dispatch results.

use crate::error::{AssemblyError, IntentError};
use crate::transaction::{ContractTransaction, TransactionAccumulator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One named operation of a dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Publish a token factory package
    CreateToken,
    /// Pool from coins the sender already owns
    CreatePool,
    /// Executor call creating a token and its pool in one step
    CreateTokenAndPool,
    /// Publish a pool token factory package
    CreateTestTokenAndPool,
    MintToken,
    AddLiquidity,
    SetTokenMetadata,
    EvmCreateToken,
    EvmMintToken,
    EvmCreatePool,
}

impl Intent {
    pub const ALL: [Intent; 10] = [
        Intent::CreateToken,
        Intent::CreatePool,
        Intent::CreateTokenAndPool,
        Intent::CreateTestTokenAndPool,
        Intent::MintToken,
        Intent::AddLiquidity,
        Intent::SetTokenMetadata,
        Intent::EvmCreateToken,
        Intent::EvmMintToken,
        Intent::EvmCreatePool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CreateToken => "create_token",
            Intent::CreatePool => "create_pool",
            Intent::CreateTokenAndPool => "create_token_and_pool",
            Intent::CreateTestTokenAndPool => "create_test_token_and_pool",
            Intent::MintToken => "mint_token",
            Intent::AddLiquidity => "add_liquidity",
            Intent::SetTokenMetadata => "set_token_metadata",
            Intent::EvmCreateToken => "evm_create_token",
            Intent::EvmMintToken => "evm_mint_token",
            Intent::EvmCreatePool => "evm_create_pool",
        }
    }

    /// Terminal intents return their contract call immediately; intents
    /// after them in the list are not processed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Intent::EvmCreateToken | Intent::EvmCreatePool)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = IntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| IntentError::UnrecognizedIntent(s.to_string()))
    }
}

/// Parse every tag before any work starts
pub fn parse_intents<S: AsRef<str>>(tags: &[S]) -> Result<Vec<Intent>, IntentError> {
    tags.iter().map(|tag| tag.as_ref().parse()).collect()
}

/// What a dispatch call produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BuiltTransaction {
    /// Object-chain transaction (plus any collected EVM mint calls)
    Accumulated(TransactionAccumulator),
    /// Single EVM call returned by a terminal intent
    Contract(ContractTransaction),
}

impl BuiltTransaction {
    pub fn as_accumulated(&self) -> Option<&TransactionAccumulator> {
        match self {
            BuiltTransaction::Accumulated(tx) => Some(tx),
            BuiltTransaction::Contract(_) => None,
        }
    }

    pub fn as_contract(&self) -> Option<&ContractTransaction> {
        match self {
            BuiltTransaction::Contract(tx) => Some(tx),
            BuiltTransaction::Accumulated(_) => None,
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, AssemblyError> {
        serde_json::to_value(self).map_err(|e| AssemblyError::Encoding(e.to_string()))
    }
}
