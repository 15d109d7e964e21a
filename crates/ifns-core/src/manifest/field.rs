//! Tri-state JSON field values.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A manifest field that may be missing, explicitly `null`, or set.
///
/// Use with `#[serde(default)]` so a missing key deserializes to
/// [`FieldValue::Absent`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    /// Key not present in the document
    #[default]
    Absent,
    /// Key present with JSON `null`
    Null,
    /// Key present with a non-null value
    Present(Value),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The value if present and non-null
    pub fn value(&self) -> Option<&Value> {
        match self {
            FieldValue::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value().and_then(Value::as_str)
    }

    /// JSON projection used for comparison and reporting.
    ///
    /// Absent and null both project to `null`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Present(v) => v.clone(),
            FieldValue::Absent | FieldValue::Null => Value::Null,
        }
    }

    /// Compare the JSON projections of two fields.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        json_equal(&self.to_json(), &other.to_json())
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => FieldValue::Null,
            other => FieldValue::Present(other),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FieldValue::from)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Present(v) => v.serialize(serializer),
            FieldValue::Absent | FieldValue::Null => serializer.serialize_unit(),
        }
    }
}

/// Deep JSON equality where numbers compare by value (`1 == 1.0`).
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| json_equal(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| json_equal(v, w)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &serde_json::Number, y: &serde_json::Number) -> bool {
    if let (Some(p), Some(q)) = (x.as_i64(), y.as_i64()) {
        return p == q;
    }
    if let (Some(p), Some(q)) = (x.as_u64(), y.as_u64()) {
        return p == q;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(p), Some(q)) => p == q,
        _ => false,
    }
}
