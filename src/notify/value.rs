//! Plain values decoded from D-Bus variants.
//!
//! Hints arrive as `a{sv}`: every value is a tagged variant. Before the engine
//! looks at them they are converted into [`HintValue`], which only knows about
//! booleans, integers, strings, byte strings, mappings and sequences. Anything
//! else (doubles, file descriptors) is kept as [`HintValue::Opaque`] so it can
//! still be handed on to the renderer.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;
use zbus::zvariant::{OwnedValue, Value};

/// Hint bag after normalization. Ordered so renderers see a stable key order.
pub type HintBag = BTreeMap<String, HintValue>;

/// A normalized hint value.
#[derive(Debug, PartialEq)]
pub enum HintValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
    Map(Vec<(HintValue, HintValue)>),
    /// Arrays and structures (the `image-data` tuple lands here)
    Seq(Vec<HintValue>),
    /// Wire value with no plain equivalent, passed through unchanged
    Opaque(OwnedValue),
}

impl HintValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HintValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            HintValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HintValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            HintValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[HintValue]> {
        match self {
            HintValue::Seq(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for HintValue {
    fn from(s: &str) -> Self {
        HintValue::Str(s.to_string())
    }
}

impl From<String> for HintValue {
    fn from(s: String) -> Self {
        HintValue::Str(s)
    }
}

impl From<i64> for HintValue {
    fn from(n: i64) -> Self {
        HintValue::Int(n)
    }
}

impl From<bool> for HintValue {
    fn from(b: bool) -> Self {
        HintValue::Bool(b)
    }
}

impl From<Vec<u8>> for HintValue {
    fn from(b: Vec<u8>) -> Self {
        HintValue::Bytes(b)
    }
}

/// Convert one wire value.
///
/// Returns `None` only when an opaque value cannot be copied out of the
/// message (a file descriptor that fails to duplicate).
pub fn normalize(value: &Value<'_>) -> Option<HintValue> {
    let plain = match value {
        Value::Bool(b) => HintValue::Bool(*b),
        Value::U8(n) => HintValue::Int(i64::from(*n)),
        Value::I16(n) => HintValue::Int(i64::from(*n)),
        Value::U16(n) => HintValue::Int(i64::from(*n)),
        Value::I32(n) => HintValue::Int(i64::from(*n)),
        Value::U32(n) => HintValue::Int(i64::from(*n)),
        Value::I64(n) => HintValue::Int(*n),
        Value::U64(n) => match i64::try_from(*n) {
            Ok(n) => HintValue::Int(n),
            Err(_) => return opaque(value),
        },
        Value::Str(s) => HintValue::Str(s.to_string()),
        Value::ObjectPath(p) => HintValue::Str(p.to_string()),
        Value::Signature(s) => HintValue::Str(s.to_string()),
        Value::Value(inner) => return normalize(inner),
        Value::Array(array) => {
            if array.element_signature().to_string() == "y" {
                HintValue::Bytes(
                    array
                        .iter()
                        .filter_map(|v| match v {
                            Value::U8(b) => Some(*b),
                            _ => None,
                        })
                        .collect(),
                )
            } else {
                HintValue::Seq(array.iter().filter_map(normalize).collect())
            }
        }
        Value::Dict(dict) => HintValue::Map(
            dict.iter()
                .filter_map(|(k, v)| Some((normalize(k)?, normalize(v)?)))
                .collect(),
        ),
        Value::Structure(s) => HintValue::Seq(s.fields().iter().filter_map(normalize).collect()),
        other => return opaque(other),
    };
    Some(plain)
}

fn opaque(value: &Value<'_>) -> Option<HintValue> {
    warn!("Passing through unrecognized hint value: {}", value.value_signature());
    match value.try_to_owned() {
        Ok(owned) => Some(HintValue::Opaque(owned)),
        Err(e) => {
            warn!("Dropping hint value that cannot be copied: {e}");
            None
        }
    }
}

/// Normalize a whole `a{sv}` hint dictionary.
pub fn normalize_hints(hints: &HashMap<String, OwnedValue>) -> HintBag {
    hints
        .iter()
        .filter_map(|(key, value)| Some((key.clone(), normalize(value)?)))
        .collect()
}
