//! Registry lookups exported via WASM.
//!
//! These let JavaScript callers resolve coin metadata and the default
//! network without duplicating the tables.

use crate::coin::coin_metadata;
use crate::intent::Intent;
use crate::network::DEFAULT_NETWORK;
use wasm_bindgen::prelude::*;

/// Network used when none is given
#[wasm_bindgen(js_name = "defaultNetwork")]
pub fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

/// Symbol and decimals for a coin type (`UNKNOWN`/9 when unregistered)
#[wasm_bindgen(js_name = "coinMetadata")]
pub fn coin_metadata_js(coin_type: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&coin_metadata(coin_type))
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize coin metadata: {}", e)))
}

/// Every intent tag the builder accepts
#[wasm_bindgen(js_name = "supportedIntents")]
pub fn supported_intents() -> Vec<String> {
    Intent::ALL.iter().map(|i| i.as_str().to_string()).collect()
}
