//! Bridge between parsed JSON and dynamically-typed values.
//!
//! `serde_json` (with `preserve_order`) is the parsed tree: objects keep
//! their insertion order, which matters for first-match mask patterns and
//! node order in connections. `GenericValue` is the dynamic bag used for
//! fields the typed DTOs do not model; `decode` and `encode` convert between
//! the two and are inverses for everything except `Opaque`, which encodes as
//! its display string.
//!
//! The `pub(crate)` accessors at the bottom are the vocabulary the
//! hand-written graph decoders use.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::error::DecodeError;

/// A JSON object with insertion-ordered keys.
pub type JsonObject = serde_json::Map<String, Value>;

/// Dynamically-typed value: map, list, primitive or explicit null.
#[derive(Clone)]
pub enum GenericValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<GenericValue>),
    Map(BTreeMap<String, GenericValue>),
    /// Anything else. Encoded as its `Display` output; the type is lost.
    Opaque(Arc<dyn fmt::Display + Send + Sync>),
}

impl GenericValue {
    pub fn opaque<T: fmt::Display + Send + Sync + 'static>(value: T) -> Self {
        GenericValue::Opaque(Arc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, GenericValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GenericValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for GenericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericValue::Null => write!(f, "Null"),
            GenericValue::Bool(b) => write!(f, "Bool({b})"),
            GenericValue::Number(n) => write!(f, "Number({n})"),
            GenericValue::String(s) => write!(f, "String({s:?})"),
            GenericValue::List(items) => f.debug_tuple("List").field(items).finish(),
            GenericValue::Map(map) => f.debug_tuple("Map").field(map).finish(),
            GenericValue::Opaque(v) => write!(f, "Opaque({v})"),
        }
    }
}

impl PartialEq for GenericValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (GenericValue::Null, GenericValue::Null) => true,
            (GenericValue::Bool(a), GenericValue::Bool(b)) => a == b,
            (GenericValue::Number(a), GenericValue::Number(b)) => a == b,
            (GenericValue::String(a), GenericValue::String(b)) => a == b,
            (GenericValue::List(a), GenericValue::List(b)) => a == b,
            (GenericValue::Map(a), GenericValue::Map(b)) => a == b,
            (GenericValue::Opaque(a), GenericValue::Opaque(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<&str> for GenericValue {
    fn from(value: &str) -> Self {
        GenericValue::String(value.to_string())
    }
}

impl From<String> for GenericValue {
    fn from(value: String) -> Self {
        GenericValue::String(value)
    }
}

impl From<bool> for GenericValue {
    fn from(value: bool) -> Self {
        GenericValue::Bool(value)
    }
}

impl From<i64> for GenericValue {
    fn from(value: i64) -> Self {
        GenericValue::Number(value.into())
    }
}

impl From<u64> for GenericValue {
    fn from(value: u64) -> Self {
        GenericValue::Number(value.into())
    }
}

/// Convert a parsed JSON value into a `GenericValue`. JSON null becomes
/// `GenericValue::Null`, never a missing entry.
pub fn decode(value: &Value) -> GenericValue {
    match value {
        Value::Null => GenericValue::Null,
        Value::Bool(b) => GenericValue::Bool(*b),
        Value::Number(n) => GenericValue::Number(n.clone()),
        Value::String(s) => GenericValue::String(s.clone()),
        Value::Array(items) => GenericValue::List(items.iter().map(decode).collect()),
        Value::Object(map) => GenericValue::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), decode(v)))
                .collect(),
        ),
    }
}

/// Inverse of [`decode`]. `Opaque` values are stringified.
pub fn encode(value: &GenericValue) -> Value {
    match value {
        GenericValue::Null => Value::Null,
        GenericValue::Bool(b) => Value::Bool(*b),
        GenericValue::Number(n) => Value::Number(n.clone()),
        GenericValue::String(s) => Value::String(s.clone()),
        GenericValue::List(items) => Value::Array(items.iter().map(encode).collect()),
        GenericValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), encode(v)))
                .collect(),
        ),
        GenericValue::Opaque(v) => Value::String(v.to_string()),
    }
}

impl Serialize for GenericValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GenericValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| decode(&v))
    }
}

/// Parse a response body that must be a JSON object.
pub fn parse_object(text: &str) -> Result<JsonObject, DecodeError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DecodeError::wrong_type("<root>", "an object")),
        Err(e) => Err(DecodeError::Syntax(e.to_string())),
    }
}

/// Decode a leaf entity through its serde derive.
pub fn from_object<T: DeserializeOwned>(obj: &JsonObject, context: &str) -> Result<T, DecodeError> {
    serde_json::from_value(Value::Object(obj.clone())).map_err(|e| DecodeError::invalid(context, e))
}

// ---------------------------------------------------------------------------
// Accessors used by the graph decoders
// ---------------------------------------------------------------------------

pub(crate) fn required_str(obj: &JsonObject, key: &str) -> Result<String, DecodeError> {
    optional_str(obj, key)?.ok_or_else(|| DecodeError::missing(key))
}

/// Absent and null both read as `None`.
pub(crate) fn optional_str(obj: &JsonObject, key: &str) -> Result<Option<String>, DecodeError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DecodeError::wrong_type(key, "a string")),
    }
}

pub(crate) fn optional_object<'a>(
    obj: &'a JsonObject,
    key: &str,
) -> Result<Option<&'a JsonObject>, DecodeError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(DecodeError::wrong_type(key, "an object")),
    }
}

pub(crate) fn optional_array<'a>(
    obj: &'a JsonObject,
    key: &str,
) -> Result<Option<&'a Vec<Value>>, DecodeError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(DecodeError::wrong_type(key, "an array")),
    }
}

/// Every element must be an object; `key` names the array in errors.
pub(crate) fn objects<'a>(items: &'a [Value], key: &str) -> Result<Vec<&'a JsonObject>, DecodeError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(DecodeError::wrong_type(&format!("{key}[{i}]"), "an object")),
        })
        .collect()
}

pub(crate) fn string_list(obj: &JsonObject, key: &str) -> Result<Vec<String>, DecodeError> {
    let Some(items) = optional_array(obj, key)? else {
        return Ok(Vec::new());
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err(DecodeError::wrong_type(&format!("{key}[{i}]"), "a string")),
        })
        .collect()
}

/// Integer field, `0` when absent or not an integer.
pub(crate) fn int_or_zero(obj: &JsonObject, key: &str) -> i64 {
    obj.get(key).and_then(Value::as_i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_then_encode_reproduces_document() {
        let original = json!({
            "token": "trm-123",
            "amount": 12.5,
            "count": 3,
            "isDefault": true,
            "notes": null,
            "nested": {"list": [1, "two", {"three": [false, null]}]},
            "empty": {}
        });
        assert_eq!(encode(&decode(&original)), original);
    }

    #[test]
    fn null_is_explicit_not_missing() {
        let decoded = decode(&json!({"notes": null}));
        let GenericValue::Map(map) = decoded else {
            panic!("expected map");
        };
        assert_eq!(map.get("notes"), Some(&GenericValue::Null));
    }

    #[test]
    fn opaque_values_encode_as_strings() {
        let id = uuid::Uuid::nil();
        let value = GenericValue::opaque(id);
        assert_eq!(encode(&value), json!("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn large_unsigned_numbers_survive() {
        let original = json!({"big": u64::MAX});
        assert_eq!(encode(&decode(&original)), original);
    }

    #[test]
    fn parse_object_rejects_arrays_and_garbage() {
        assert!(matches!(parse_object("[]"), Err(DecodeError::WrongType { .. })));
        assert!(matches!(parse_object("not json"), Err(DecodeError::Syntax(_))));
        assert!(parse_object(r#"{"a":1}"#).is_ok());
    }

    #[test]
    fn accessors_distinguish_missing_and_wrong_type() {
        let obj = parse_object(r#"{"code":"CA","count":"7","list":["A",1]}"#).unwrap();
        assert_eq!(required_str(&obj, "code").unwrap(), "CA");
        assert_eq!(
            required_str(&obj, "name"),
            Err(DecodeError::MissingField { field: "name".into() })
        );
        assert!(matches!(optional_object(&obj, "code"), Err(DecodeError::WrongType { .. })));
        assert_eq!(int_or_zero(&obj, "count"), 0);
        assert!(matches!(string_list(&obj, "list"), Err(DecodeError::WrongType { .. })));
    }

    #[test]
    fn generic_value_serde_round_trip() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), GenericValue::from("x"));
        map.insert("b".to_string(), GenericValue::from(2i64));
        let value = GenericValue::Map(map);
        let text = serde_json::to_string(&value).unwrap();
        let back: GenericValue = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }
}
