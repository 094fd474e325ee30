//! wasm-intent-builder: compose blockchain transactions from named intents.
//!
//! A caller passes an ordered list of intents (`create_token`,
//! `create_pool`, `evm_create_pool`, ...) and one parameter bag. The builder
//! validates the params, assembles the calls each intent needs and returns
//! one unsigned transaction for the object chain, or a populated contract
//! call for the EVM chain.
//!
//! # Architecture
//!
//! The crate follows a two-layer architecture:
//!
//! 1. **Core** (`intent`, `builder`, `codegen`, `compiler`, ...) - Pure Rust
//!    dispatch, validation and call assembly
//! 2. **WASM bindings** (`wasm/`) - Thin wrappers that expose the dispatcher
//!    to JavaScript
//!
//! # Usage from Rust
//!
//! ```rust,no_run
//! use wasm_intent_builder::{build_transaction, NetworkRegistry, ParamBag, SuiCliCompiler};
//!
//! let params = ParamBag::from_value(serde_json::json!({
//!     "name": "Test Token",
//!     "symbol": "TEST",
//!     "decimal": 9,
//!     "description": "A token",
//!     "initialSupply": "1000000000",
//!     "iconUrl": "https://example.com/icon.png",
//!     "recipientAddress": "0xa11ce"
//! }))
//! .unwrap();
//! let compiler = SuiCliCompiler::new("contracts");
//! let tx = build_transaction(
//!     &["create_token"],
//!     &params,
//!     None,
//!     &NetworkRegistry::builtin(),
//!     &compiler,
//! )
//! .unwrap();
//! println!("{}", tx.to_json().unwrap());
//! ```

pub mod address;
pub mod builder;
pub mod codegen;
pub mod coin;
pub mod compiler;
mod error;
pub mod intent;
pub mod network;
pub mod params;
pub mod transaction;
pub mod validation;
pub mod wasm;

// Re-export core types at crate root
pub use address::{ObjectId, SuiAddress};
pub use builder::{calculate_pool_parameters, price_from_sqrt_price, PoolParameters};
pub use codegen::PackageSource;
pub use coin::{coin_metadata, CoinMetadata};
#[cfg(not(target_arch = "wasm32"))]
pub use compiler::SuiCliCompiler;
pub use compiler::{CompiledPackage, GeneratedContractArtifact, PackageCompiler};
pub use error::{AssemblyError, BuildError, IntentError, StepError, ValidationError};
pub use intent::{build_transaction, BuiltTransaction, Intent};
pub use network::{NetworkProfile, NetworkRegistry, DEFAULT_NETWORK};
pub use params::ParamBag;
pub use transaction::{ContractTransaction, TransactionAccumulator};

// Re-export WASM types
pub use wasm::IntentNamespace;
