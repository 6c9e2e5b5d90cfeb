// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value kinds and runtime values flowing through ports.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Data kind a port declares for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// Any value (generic ports, listener fan-in)
    Any,
    /// Boolean value
    Bool,
    /// Floating point number
    Number,
    /// String value
    String,
    /// Execution trigger; the payload is an opaque event value
    Trigger,
    /// Custom kind, matched by name
    Custom(String),
}

impl ValueKind {
    /// The declared zero value, returned by reads of ports that were
    /// never written and carry no literal default.
    pub fn zero(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Number => Value::Number(0.0),
            Self::String => Value::String(String::new()),
            Self::Any | Self::Trigger | Self::Custom(_) => Value::Null,
        }
    }

    /// Check whether a value may be stored in a port of this kind.
    ///
    /// `Null` is accepted everywhere (it models "absent"). `Any` and
    /// `Trigger` accept every payload; a trigger's value is an opaque
    /// event argument that rides along with the pulse.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Any | Self::Trigger | Self::Custom(_) => true,
            Self::Bool => matches!(value, Value::Null | Value::Bool(_)),
            Self::Number => matches!(value, Value::Null | Value::Number(_)),
            Self::String => matches!(value, Value::Null | Value::String(_)),
        }
    }
}

/// A value held by a port or carried through a cable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent / unit value
    Null,
    /// Boolean
    Bool(bool),
    /// Floating point number
    Number(f64),
    /// String
    String(String),
}

impl Value {
    /// Build a string value.
    pub fn string(text: impl Into<String>) -> Self {
        Self::String(text.into())
    }

    /// True if this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view: numbers pass through, booleans map to 0/1,
    /// numeric strings parse, everything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::String(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }

    /// String view, for string values only.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value's own kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }

    /// Convert a document literal into a runtime value.
    ///
    /// Graph documents persist scalar literals only; arrays and objects
    /// are rejected.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, GraphError> {
        match json {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => {
                let n = n
                    .as_f64()
                    .ok_or_else(|| GraphError::MalformedField(n.to_string()))?;
                Ok(Self::Number(n))
            }
            serde_json::Value::String(s) => Ok(Self::String(s.clone())),
            other => Err(GraphError::MalformedField(other.to_string())),
        }
    }

    /// Convert a runtime value into a document literal.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                write!(f, "{}", *n as i64)
            }
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values() {
        assert_eq!(ValueKind::Number.zero(), Value::Number(0.0));
        assert_eq!(ValueKind::String.zero(), Value::String(String::new()));
        assert_eq!(ValueKind::Bool.zero(), Value::Bool(false));
        assert_eq!(ValueKind::Trigger.zero(), Value::Null);
        assert_eq!(ValueKind::Any.zero(), Value::Null);
    }

    #[test]
    fn test_kind_accepts() {
        assert!(ValueKind::Number.accepts(&Value::Number(1.5)));
        assert!(ValueKind::Number.accepts(&Value::Null));
        assert!(!ValueKind::Number.accepts(&Value::string("x")));
        assert!(ValueKind::Trigger.accepts(&Value::string("clicked")));
        assert!(ValueKind::Any.accepts(&Value::Bool(true)));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::string("42").as_number(), Some(42.0));
        assert_eq!(Value::Bool(true).as_number(), Some(1.0));
        assert_eq!(Value::string("nope").as_number(), None);
        assert_eq!(Value::Null.as_number(), None);
    }

    #[test]
    fn test_json_round_trip() {
        let values = [
            Value::Null,
            Value::Bool(true),
            Value::Number(2.5),
            Value::string("saved input"),
        ];
        for value in values {
            assert_eq!(Value::from_json(&value.to_json()).unwrap(), value);
        }
    }

    #[test]
    fn test_json_rejects_compound() {
        assert!(Value::from_json(&serde_json::json!([1, 2])).is_err());
        assert!(Value::from_json(&serde_json::json!({"a": 1})).is_err());
    }

    #[test]
    fn test_display_trims_integral_numbers() {
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }
}
