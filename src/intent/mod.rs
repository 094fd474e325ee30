//! Intent-based transaction building.
//!
//! A dispatch call takes an ordered list of intent tags and one parameter
//! bag and produces either an object-chain transaction or, for terminal EVM
//! intents, a single populated contract call.
//!
//! # Usage from TypeScript
//!
//! ```typescript
//! const tx = IntentNamespace.buildTransaction(
//!   ['create_token', 'create_pool'],
//!   params,
//!   'MAINNET',
//!   compiler,
//! );
//! ```

mod build;
mod types;

pub use build::build_transaction;
pub use types::*;
