//! Structured values and the codecs that turn them into bytes.
//!
//! The handles never interpret serialized bytes themselves: `File` hands a `Value`
//! to a `Codec` and writes whatever comes back. Two codecs ship with the crate:
//! - `XmlPlistCodec`: an XML property list document (`<plist version="1.0">`).
//! - `KeyedArchiveCodec`: a framed, keyed archive (magic header + JSON payload).

mod archive;
mod plist;

pub use archive::KeyedArchiveCodec;
pub use plist::XmlPlistCodec;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Plain-data value model shared by every codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Array(Vec<Value>),
    Dictionary(BTreeMap<String, Value>),
}

/// Encoding/decoding failure reported by a codec.
#[derive(Debug, Error)]
#[error("{codec}: {message}")]
pub struct CodecError {
    pub codec: &'static str,
    pub message: String,
}

impl CodecError {
    pub fn new(codec: &'static str, message: impl Into<String>) -> Self {
        Self {
            codec,
            message: message.into(),
        }
    }
}

/// A serialization format for `Value`s.
pub trait Codec {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}

impl Value {
    /// Name of the variant, as used in shape-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dictionary(_) => "dictionary",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Dictionary(v)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Dictionary(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
pub(crate) fn sample_composite() -> Value {
    let inner: Value = [("depth", Value::from(2)), ("label", Value::from("inner"))]
        .into_iter()
        .collect();
    [
        ("name", Value::from("report")),
        ("count", Value::from(3)),
        ("ratio", Value::from(0.25)),
        ("enabled", Value::from(true)),
        ("tags", Value::from(vec!["a", "b", "c"])),
        ("empty", Value::Array(Vec::new())),
        ("nested", inner),
    ]
    .into_iter()
    .collect()
}
