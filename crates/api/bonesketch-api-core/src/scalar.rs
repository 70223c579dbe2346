//! Scalar: terminal values stored in a [`ConstantNamespace`](crate::ConstantNamespace)
//! and produced by drawing-expression evaluation.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Lightweight kind enum, handy for error messages and quick dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    None,
    Bool,
    Number,
    Text,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::None => "None",
            ScalarKind::Bool => "bool",
            ScalarKind::Number => "number",
            ScalarKind::Text => "text",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON `null`
    #[default]
    None,

    Bool(bool),

    /// Every JSON number (integers included) is held as f64.
    Number(f64),

    Text(String),
}

impl Scalar {
    #[inline]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::None => ScalarKind::None,
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Number(_) => ScalarKind::Number,
            Scalar::Text(_) => ScalarKind::Text,
        }
    }

    /// Convert a terminal JSON value. Arrays and objects are not scalars.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => Some(Scalar::None),
            JsonValue::Bool(b) => Some(Scalar::Bool(*b)),
            JsonValue::Number(n) => n.as_f64().map(Scalar::Number),
            JsonValue::String(s) => Some(Scalar::Text(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    /// Numeric view: numbers as-is, booleans as 1/0.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::None | Scalar::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Scalar::None)
    }

    /// Truthiness: `None`, `false`, `0` and the empty string are false.
    pub fn truthy(&self) -> bool {
        match self {
            Scalar::None => false,
            Scalar::Bool(b) => *b,
            Scalar::Number(n) => *n != 0.0,
            Scalar::Text(s) => !s.is_empty(),
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Number(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::None => f.write_str("None"),
            Scalar::Bool(true) => f.write_str("True"),
            Scalar::Bool(false) => f.write_str("False"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => write!(f, "{s:?}"),
        }
    }
}
