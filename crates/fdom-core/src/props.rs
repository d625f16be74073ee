#![forbid(unsafe_code)]

//! Prop bags.
//!
//! [`Props`] is the state shape every component instance carries: an ordered
//! map from prop name to a JSON value. Updates merge with `merge`, where keys
//! in the delta overwrite and every other key is left untouched.

use serde_json::{Map, Value};
use thiserror::Error;

/// A prop was absent, mistyped, or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropError {
    #[error("missing required prop `{prop}`")]
    Missing { prop: String },
    #[error("prop `{prop}` must be {expected}, found {found}")]
    WrongType {
        prop: String,
        expected: String,
        found: &'static str,
    },
    #[error("prop `{prop}` must be one of [{}], found {found}", .allowed.join(", "))]
    InvalidValue {
        prop: String,
        allowed: Vec<String>,
        found: String,
    },
    #[error("unknown prop `{prop}`; expected one of [{}]", .known.join(", "))]
    Unknown { prop: String, known: Vec<String> },
    #[error("prop `{prop}` is malformed: {reason}")]
    Malformed { prop: String, reason: String },
    #[error("props must be an object, found {found}")]
    NotAnObject { found: &'static str },
}

impl PropError {
    pub fn wrong_type(prop: &str, expected: impl Into<String>, found: &Value) -> Self {
        Self::WrongType {
            prop: prop.to_owned(),
            expected: expected.into(),
            found: value_kind(found),
        }
    }

    pub fn malformed(prop: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            prop: prop.to_owned(),
            reason: reason.into(),
        }
    }

    /// Name of the offending prop, if the error concerns one.
    #[must_use]
    pub fn prop(&self) -> Option<&str> {
        match self {
            Self::Missing { prop }
            | Self::WrongType { prop, .. }
            | Self::InvalidValue { prop, .. }
            | Self::Unknown { prop, .. }
            | Self::Malformed { prop, .. } => Some(prop),
            Self::NotAnObject { .. } => None,
        }
    }
}

/// Human-readable JSON type name.
#[must_use]
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props(Map<String, Value>);

impl Props {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. Any other JSON shape is rejected.
    pub fn from_value(value: Value) -> Result<Self, PropError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(PropError::NotAnObject {
                found: value_kind(&other),
            }),
        }
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_owned(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overwrite with every key of `delta`; keys absent from `delta` are kept.
    pub fn merge(&mut self, delta: &Props) {
        for (k, v) in &delta.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Whether applying `delta` would change any value.
    #[must_use]
    pub fn differs(&self, delta: &Props) -> bool {
        delta.iter().any(|(k, v)| self.get(k) != Some(v))
    }

    /// Whether `delta` carries `key` with a value different from ours.
    #[must_use]
    pub fn changes(&self, delta: &Props, key: &str) -> bool {
        delta.get(key).is_some_and(|v| self.get(key) != Some(v))
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    // ── Typed accessors ─────────────────────────────────────────────────
    //
    // `opt_*` accessors treat a missing key and an explicit null alike.

    fn present(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn required(&self, key: &str) -> Result<&Value, PropError> {
        self.present(key).ok_or_else(|| PropError::Missing {
            prop: key.to_owned(),
        })
    }

    pub fn str(&self, key: &str) -> Result<&str, PropError> {
        let v = self.required(key)?;
        v.as_str().ok_or_else(|| PropError::wrong_type(key, "a string", v))
    }

    pub fn opt_str(&self, key: &str) -> Result<Option<&str>, PropError> {
        self.present(key)
            .map(|v| v.as_str().ok_or_else(|| PropError::wrong_type(key, "a string", v)))
            .transpose()
    }

    pub fn bool(&self, key: &str) -> Result<bool, PropError> {
        let v = self.required(key)?;
        v.as_bool()
            .ok_or_else(|| PropError::wrong_type(key, "a boolean", v))
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, PropError> {
        match self.present(key) {
            Some(v) => v
                .as_bool()
                .ok_or_else(|| PropError::wrong_type(key, "a boolean", v)),
            None => Ok(default),
        }
    }

    pub fn u64(&self, key: &str) -> Result<u64, PropError> {
        let v = self.required(key)?;
        v.as_u64()
            .ok_or_else(|| PropError::wrong_type(key, "a non-negative integer", v))
    }

    pub fn f64(&self, key: &str) -> Result<f64, PropError> {
        let v = self.required(key)?;
        v.as_f64()
            .ok_or_else(|| PropError::wrong_type(key, "a number", v))
    }

    pub fn array(&self, key: &str) -> Result<&[Value], PropError> {
        let v = self.required(key)?;
        v.as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| PropError::wrong_type(key, "an array", v))
    }

    pub fn opt_array(&self, key: &str) -> Result<Option<&[Value]>, PropError> {
        self.present(key)
            .map(|v| {
                v.as_array()
                    .map(Vec::as_slice)
                    .ok_or_else(|| PropError::wrong_type(key, "an array", v))
            })
            .transpose()
    }
}

impl TryFrom<Value> for Props {
    type Error = PropError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Map<String, Value>> for Props {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Build [`Props`] from a JSON object literal.
///
/// ```
/// let props = fdom_core::props!({ "title": "Hello", "open": true });
/// assert_eq!(props.str("title").unwrap(), "Hello");
/// ```
#[macro_export]
macro_rules! props {
    ($($json:tt)+) => {
        match $crate::__private::serde_json::json!($($json)+) {
            $crate::__private::serde_json::Value::Object(map) => $crate::props::Props::from(map),
            _ => $crate::props::Props::new(),
        }
    };
}
