//! WASM bindings for intent-based transaction building.

use crate::builder::{calculate_pool_parameters, price_from_sqrt_price};
use crate::compiler::PackageCompiler;
use crate::error::IntentError;
use crate::intent::{self, BuiltTransaction};
use crate::network::NetworkRegistry;
use crate::params::ParamBag;
use crate::wasm::compiler::{JsPackageCompiler, MissingCompiler};
use crate::wasm::try_from_js_value::js_to_json;
use alloy_primitives::U256;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Namespace for intent-based building operations.
#[wasm_bindgen]
pub struct IntentNamespace;

#[wasm_bindgen]
impl IntentNamespace {
    /// Build a transaction from an ordered list of intents.
    ///
    /// # Arguments
    ///
    /// * `intents` - Intent tags, e.g. `['create_token', 'create_pool']`
    /// * `params` - The parameter bag shared by every intent. Pass wide
    ///   integers as `bigint`.
    /// * `network` - Network id (default `MAINNET`)
    /// * `compiler` - Synchronous callback building generated packages;
    ///   required only by publish intents
    /// * `networks` - Extra network profiles, overriding built-in ones
    ///
    /// # Returns
    ///
    /// An object with:
    /// * `chain` - `"move"` or `"evm"`
    /// * `transaction` - Transaction JSON (`{ version: 2, ... }`) or a
    ///   populated contract call (`{ to, data, value?, chainId? }`)
    ///
    /// # Example
    ///
    /// ```javascript
    /// const { chain, transaction } = IntentNamespace.buildTransaction(
    ///   ['create_token_and_pool'],
    ///   { name: 'Test', symbol: 'TST', decimal: 9, tick_spacing: 60n, ... },
    ///   'MAINNET',
    /// );
    /// const tx = Transaction.from(JSON.stringify(transaction));
    /// ```
    #[wasm_bindgen(js_name = "buildTransaction")]
    pub fn build_transaction(
        intents: JsValue,
        params: JsValue,
        network: Option<String>,
        compiler: Option<js_sys::Function>,
        networks: JsValue,
    ) -> Result<JsValue, JsValue> {
        let intents: Vec<String> = serde_wasm_bindgen::from_value(intents)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse intents: {}", e)))?;
        let params = ParamBag::from_value(js_to_json(&params)?)
            .map_err(|e| IntentError::InvalidInput(e.to_string()))?;
        let registry = registry(&networks)?;

        let js_compiler = compiler.map(JsPackageCompiler::new);
        let compiler: &dyn PackageCompiler = match &js_compiler {
            Some(c) => c,
            None => &MissingCompiler,
        };

        let built = intent::build_transaction(
            &intents,
            &params,
            network.as_deref(),
            &registry,
            compiler,
        )?;

        let chain = match built {
            BuiltTransaction::Accumulated(_) => "move",
            BuiltTransaction::Contract(_) => "evm",
        };
        let transaction = to_js(&built.to_json()?)?;

        let obj = js_sys::Object::new();
        js_sys::Reflect::set(&obj, &"chain".into(), &chain.into())
            .map_err(|_| JsValue::from_str("Failed to set chain"))?;
        js_sys::Reflect::set(&obj, &"transaction".into(), &transaction)
            .map_err(|_| JsValue::from_str("Failed to set transaction"))?;
        Ok(obj.into())
    }

    /// Sqrt price and tick range for an EVM pool.
    ///
    /// `params`: `{ price, tickSpacing, decimalsA?, decimalsB? }`; decimals
    /// default to 18.
    #[wasm_bindgen(js_name = "calculatePoolParameters")]
    pub fn calculate_pool_parameters(params: JsValue) -> Result<JsValue, JsValue> {
        let params = ParamBag::from_value(js_to_json(&params)?)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let price = params
            .decimal_text("price")
            .ok_or_else(|| JsValue::from_str("Price is required"))?;
        let tick_spacing = params
            .int("tickSpacing", "Tick spacing")
            .map_err(|e| JsValue::from_str(&e.to_string()))?
            .ok_or_else(|| JsValue::from_str("Tick spacing is required"))?;
        let tick_spacing = i32::try_from(tick_spacing)
            .map_err(|_| JsValue::from_str("Tick spacing does not fit in int24"))?;
        let pool = calculate_pool_parameters(
            &price,
            tick_spacing,
            small_uint(&params, "decimalsA", "Decimals A", 18)?,
            small_uint(&params, "decimalsB", "Decimals B", 18)?,
        )?;
        to_js(&pool)
    }

    /// Price of token A in token B for a Q64.96 sqrt price.
    ///
    /// `params`: `{ sqrtPriceX96, decimalsA?, decimalsB?, precision? }`;
    /// decimals default to 18 and precision to 18 fractional digits. The
    /// price is returned as decimal text.
    #[wasm_bindgen(js_name = "sqrtPriceToPrice")]
    pub fn sqrt_price_to_price(params: JsValue) -> Result<String, JsValue> {
        let params = ParamBag::from_value(js_to_json(&params)?)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let sqrt_price_x96: U256 = params
            .decimal_text("sqrtPriceX96")
            .ok_or_else(|| JsValue::from_str("sqrtPriceX96 is required"))?
            .parse()
            .map_err(|_| JsValue::from_str("sqrtPriceX96 must be an unsigned integer"))?;
        Ok(price_from_sqrt_price(
            sqrt_price_x96,
            small_uint(&params, "decimalsA", "Decimals A", 18)?,
            small_uint(&params, "decimalsB", "Decimals B", 18)?,
            small_uint(&params, "precision", "Precision", 18)?,
        )?)
    }
}

fn small_uint(params: &ParamBag, key: &str, label: &str, default: u8) -> Result<u8, JsValue> {
    Ok(params
        .uint::<u8>(key, label, "u8")
        .map_err(|e| JsValue::from_str(&e.to_string()))?
        .unwrap_or(default))
}

fn registry(networks: &JsValue) -> Result<NetworkRegistry, JsValue> {
    let builtin = NetworkRegistry::builtin();
    if networks.is_undefined() || networks.is_null() {
        return Ok(builtin);
    }
    let custom = NetworkRegistry::from_json(&js_to_json(networks)?.to_string())?;
    Ok(builtin.merge(custom))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize result: {}", e)))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_sqrt_price_to_price() {
        let params = js_sys::Object::new();
        js_sys::Reflect::set(
            &params,
            &"sqrtPriceX96".into(),
            &js_sys::BigInt::from(1u128 << 96).into(),
        )
        .unwrap();
        js_sys::Reflect::set(&params, &"precision".into(), &4.into()).unwrap();
        let price = IntentNamespace::sqrt_price_to_price(params.into()).unwrap();
        assert_eq!(price, "1.0000");
    }
}
