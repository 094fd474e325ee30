//! The parameter bag shared by every intent of one dispatch.
//!
//! Integers come in two representations, mirroring what a JavaScript caller
//! can send:
//! - a JSON string of base-10 digits is an arbitrary-precision integer (the
//!   wire form of a `bigint`)
//! - a JSON number is a machine number, which may already have lost precision
//!
//! Fields that the on-chain contract treats as wide integers can demand the
//! first form through [`ParamBag::big_uint`].

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named fields threaded through a dispatch call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamBag(Map<String, Value>);

impl ParamBag {
    pub fn new() -> Self {
        ParamBag(Map::new())
    }

    /// Wrap a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Ok(ParamBag(map)),
            Value::Null => Ok(ParamBag::new()),
            other => Err(ValidationError::new(format!(
                "Params must be an object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Builder-style insert, used by callers assembling a bag in code
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Fill a field only if the caller left it unset.
    ///
    /// Returns whether the value was written.
    pub fn set_if_absent(&mut self, key: &str, value: impl Into<Value>) -> bool {
        if self.contains(key) {
            return false;
        }
        self.0.insert(key.to_string(), value.into());
        true
    }

    /// Field value, treating `null` and `""` as absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.0.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(v) => Some(v),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// First present field among `keys`
    pub fn get_any(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// String field. Non-string values are treated as absent.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn require_str(&self, key: &str, message: &str) -> Result<&str, ValidationError> {
        self.str_field(key)
            .ok_or_else(|| ValidationError::new(message))
    }

    /// Nested object field, e.g. `tokenA: { address, decimals }`
    pub fn object(&self, key: &str) -> Option<ParamBag> {
        match self.get(key) {
            Some(Value::Object(map)) => Some(ParamBag(map.clone())),
            _ => None,
        }
    }

    /// Integer field accepting either representation.
    ///
    /// Fractional or non-numeric values are rejected; negative values are
    /// returned so callers can produce their own range message.
    pub fn int(&self, key: &str, label: &str) -> Result<Option<i128>, ValidationError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match value {
            Value::Number(n) => {
                if let Some(v) = n.as_u64() {
                    Ok(Some(v as i128))
                } else if let Some(v) = n.as_i64() {
                    Ok(Some(v as i128))
                } else {
                    Err(ValidationError::new(format!("{} must be an integer", label)))
                }
            }
            Value::String(s) => parse_signed_digits(s)
                .map(Some)
                .ok_or_else(|| ValidationError::new(format!("{} must be an integer", label))),
            _ => Err(ValidationError::new(format!("{} must be an integer", label))),
        }
    }

    /// Unsigned integer field accepting either representation, narrowed to
    /// the destination type.
    pub fn uint<T: TryFrom<u128>>(
        &self,
        key: &str,
        label: &str,
        width: &str,
    ) -> Result<Option<T>, ValidationError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let wide = match value {
            Value::String(s) if is_digits(s.trim()) => s.trim().parse::<u128>().ok(),
            Value::Number(n) if n.is_u64() => n.as_u64().map(u128::from),
            Value::Number(n) if n.is_i64() => {
                return Err(ValidationError::new(format!(
                    "{} must be a non-negative integer",
                    label
                )))
            }
            Value::String(s) if s.trim().starts_with('-') && is_digits(&s.trim()[1..]) => {
                return Err(ValidationError::new(format!(
                    "{} must be a non-negative integer",
                    label
                )))
            }
            _ => return Err(ValidationError::new(format!("{} must be an integer", label))),
        };
        wide.and_then(|v| T::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| ValidationError::new(format!("{} does not fit in {}", label, width)))
    }

    /// Unsigned integer field that must be presented as arbitrary precision.
    ///
    /// A JSON number fails with `"<label> must be a BigInt"` rather than being
    /// accepted at whatever precision survived parsing.
    pub fn big_uint(&self, key: &str, label: &str) -> Result<Option<u128>, ValidationError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match value {
            Value::String(s) if is_digits(s.trim()) => {
                s.trim().parse::<u128>().map(Some).map_err(|_| {
                    ValidationError::new(format!("{} exceeds the supported integer range", label))
                })
            }
            _ => Err(ValidationError::new(format!("{} must be a BigInt", label))),
        }
    }

    /// Decimal text of a numeric field, for values scaled later with exact
    /// arithmetic. JSON numbers use their shortest round-trip form.
    pub fn decimal_text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ParamBag {
    fn from(map: Map<String, Value>) -> Self {
        ParamBag(map)
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_signed_digits(s: &str) -> Option<i128> {
    let s = s.trim();
    let digits = s.strip_prefix('-').unwrap_or(s);
    if !is_digits(digits) {
        return None;
    }
    s.parse().ok()
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_string_is_absent() {
        let bag = ParamBag::new().with("name", "");
        assert!(bag.get("name").is_none());
        assert!(bag.require_str("name", "Token name is required").is_err());
    }

    #[test]
    fn test_big_uint_rejects_machine_numbers() {
        let bag = ParamBag::from_value(json!({ "tick_spacing": 1, "fee": "30" })).unwrap();
        let err = bag.big_uint("tick_spacing", "Tick spacing").unwrap_err();
        assert_eq!(err.to_string(), "Tick spacing must be a BigInt");
        assert_eq!(bag.big_uint("fee", "Fee").unwrap(), Some(30));
    }

    #[test]
    fn test_integer_getters_agree_on_whitespace() {
        let bag = ParamBag::new().with("tick_spacing", " 60 ");
        assert_eq!(bag.big_uint("tick_spacing", "Tick spacing").unwrap(), Some(60));
        assert_eq!(
            bag.uint::<u32>("tick_spacing", "Tick spacing", "u32").unwrap(),
            Some(60)
        );
    }

    #[test]
    fn test_big_uint_keeps_full_precision() {
        let bag = ParamBag::new().with("p", "340282366920938463463374607431768211455");
        assert_eq!(bag.big_uint("p", "P").unwrap(), Some(u128::MAX));
    }

    #[test]
    fn test_int_accepts_both_forms() {
        let bag = ParamBag::from_value(json!({ "a": 5, "b": "-7", "c": 1.5 })).unwrap();
        assert_eq!(bag.int("a", "A").unwrap(), Some(5));
        assert_eq!(bag.int("b", "B").unwrap(), Some(-7));
        assert!(bag.int("c", "C").is_err());
        assert_eq!(bag.int("missing", "M").unwrap(), None);
    }

    #[test]
    fn test_uint_narrows_to_width() {
        let bag = ParamBag::from_value(json!({ "d": 300, "a": "18446744073709551615", "n": -1 }))
            .unwrap();
        let err = bag.uint::<u8>("d", "Decimals", "u8").unwrap_err();
        assert_eq!(err.to_string(), "Decimals does not fit in u8");
        assert_eq!(bag.uint::<u64>("a", "Amount", "u64").unwrap(), Some(u64::MAX));
        let err = bag.uint::<u64>("n", "Amount", "u64").unwrap_err();
        assert_eq!(err.to_string(), "Amount must be a non-negative integer");
    }

    #[test]
    fn test_set_if_absent_does_not_overwrite() {
        let mut bag = ParamBag::new().with("coin_a_symbol", "ABC");
        assert!(!bag.set_if_absent("coin_a_symbol", "XYZ"));
        assert!(bag.set_if_absent("coin_a_decimals", 6));
        assert_eq!(bag.str_field("coin_a_symbol"), Some("ABC"));
    }

    #[test]
    fn test_from_value_rejects_arrays() {
        assert!(ParamBag::from_value(json!([1, 2])).is_err());
        assert!(ParamBag::from_value(Value::Null).unwrap().as_map().is_empty());
    }
}
