//! Conversion of JavaScript values into JSON.
//!
//! `serde_wasm_bindgen` cannot represent a `bigint` wider than 64 bits as a
//! `serde_json::Value`, and it would erase the difference between `10n` and
//! `10`. This walker keeps both: a `bigint` becomes a string of base-10
//! digits, a `number` stays a JSON number.

use serde_json::{Map, Number, Value};
use wasm_bindgen::{JsCast, JsValue};

/// Largest integer a JS number represents exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub(crate) fn js_to_json(value: &JsValue) -> Result<Value, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(Value::Null);
    }
    if let Some(b) = value.as_bool() {
        return Ok(Value::Bool(b));
    }
    if let Some(s) = value.as_string() {
        return Ok(Value::String(s));
    }
    if let Some(big) = value.dyn_ref::<js_sys::BigInt>() {
        let digits = big
            .to_string(10)
            .map_err(|_| JsValue::from_str("Failed to format bigint"))?;
        return Ok(Value::String(String::from(digits)));
    }
    if let Some(n) = value.as_f64() {
        return number(n);
    }
    if js_sys::Array::is_array(value) {
        let array = js_sys::Array::from(value);
        return array.iter().map(|item| js_to_json(&item)).collect();
    }
    if value.is_object() {
        let mut map = Map::new();
        let keys = js_sys::Object::keys(value.unchecked_ref::<js_sys::Object>());
        for key in keys.iter() {
            let key = JsValue::from(key);
            let name = key
                .as_string()
                .ok_or_else(|| JsValue::from_str("Object keys must be strings"))?;
            let field = js_sys::Reflect::get(value, &key)
                .map_err(|_| JsValue::from_str(&format!("Failed to read {} from object", name)))?;
            map.insert(name, js_to_json(&field)?);
        }
        return Ok(Value::Object(map));
    }
    Err(JsValue::from_str("Unsupported JavaScript value"))
}

fn number(n: f64) -> Result<Value, JsValue> {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Ok(Value::from(n as i64));
    }
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| JsValue::from_str("Numbers must be finite"))
}
