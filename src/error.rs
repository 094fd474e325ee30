//! Error types for wasm-intent-builder
//!
//! One enum per layer. Intent handlers fail with [`StepError`]; the dispatcher
//! wraps those in [`IntentError::TransactionBuildFailed`] together with the
//! intent list and params so the caller can diagnose the failing dispatch.

use crate::params::ParamBag;
use thiserror::Error;
use wasm_bindgen::prelude::*;

/// A parameter bag failed validation before any call was assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        ValidationError(msg.into())
    }
}

/// A value could not be turned into a call argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// Object id or address is not `0x`-prefixed hex of at most 32 bytes
    #[error("Invalid {field} format: {value}")]
    InvalidObjectId { field: String, value: String },
    /// EVM address is not a 20 byte hex string
    #[error("Invalid {field}: {value}")]
    InvalidEvmAddress { field: String, value: String },
    /// Fully-qualified type string is malformed
    #[error("Invalid type argument: {0}")]
    InvalidTypeTag(String),
    /// Value does not fit the destination parameter width
    #[error("{field} does not fit in {width}")]
    Overflow { field: String, width: &'static str },
    /// Decimal text could not be parsed or scaled
    #[error("Invalid amount for {field}: {reason}")]
    InvalidAmount { field: String, reason: String },
    /// Price is outside the range representable by the AMM
    #[error("Price out of range: {0}")]
    PriceOutOfRange(String),
    /// Selected network has no profile for the intent's chain
    #[error("Network {network} has no {chain} profile")]
    MissingChainProfile {
        network: String,
        chain: &'static str,
    },
    /// Pure value could not be BCS encoded
    #[error("Failed to encode pure argument: {0}")]
    Encoding(String),
}

/// The external build toolchain failed to produce bytecode.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Writing the generated source or changing directory failed
    #[error("Build I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Compiler exited with a non-zero status
    #[error("`{command}` failed (status: {status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    /// Bytecode dump was not the expected JSON shape
    #[error("Malformed build output: {0}")]
    MalformedOutput(String),
    /// A template value cannot be rendered safely
    #[error("Cannot render contract source: {0}")]
    Template(String),
    /// Host-provided compiler rejected the package
    #[error("Compiler callback failed: {0}")]
    Callback(String),
}

/// Failure of a single intent handler.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    BuildFailed(#[from] BuildError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// Dispatcher-level error returned from [`crate::build_transaction`].
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("Invalid network: {0}")]
    InvalidNetwork(String),
    #[error("Intent list is empty")]
    EmptyIntentList,
    #[error("{0} is not a recognised intent")]
    UnrecognizedIntent(String),
    /// Params were not a JSON object, or a network registry failed to load
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Failed to build transaction for [{}]: {source}", intents.join(", "))]
    TransactionBuildFailed {
        source: StepError,
        intents: Vec<String>,
        params: Box<ParamBag>,
    },
}

impl IntentError {
    /// The intent handler failure, if this error wraps one
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            IntentError::TransactionBuildFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

// REQUIRED: Converts to JS Error with stack trace
impl From<IntentError> for JsValue {
    fn from(err: IntentError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

impl From<AssemblyError> for JsValue {
    fn from(err: AssemblyError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
