//! Cell value types for sqlyard

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell value as edited in the result grid.
///
/// `Null` is a distinct state, never coalesced with the empty string. The
/// serialized form is plain JSON (`null`, `true`, `42`, `"text"`, `{..}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer or floating point number
    Number(serde_json::Number),
    /// UTF-8 string
    String(String),
    /// Structured JSON-like value (objects and arrays)
    Json(serde_json::Value),
}

/// How a column's values are entered in the editing UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Number,
    Text,
    Structured,
}

impl ValueKind {
    /// Map a database-specific data type name to an input kind.
    pub fn for_data_type(data_type: &str) -> Self {
        let lower = data_type.trim().to_ascii_lowercase();
        if lower.ends_with("[]") {
            return ValueKind::Structured;
        }
        let base = lower
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();

        match base {
            "bool" | "boolean" => ValueKind::Boolean,
            "json" | "jsonb" | "array" | "object" => ValueKind::Structured,
            "int" | "int2" | "int4" | "int8" | "integer" | "tinyint" | "smallint" | "mediumint"
            | "bigint" | "serial" | "smallserial" | "bigserial" | "real" | "float" | "float4"
            | "float8" | "double" | "decimal" | "numeric" | "number" | "money" => {
                ValueKind::Number
            }
            _ => ValueKind::Text,
        }
    }
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Build a number value from a float. Non-finite floats have no JSON form.
    pub fn from_f64(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Value::Number)
    }

    /// Convert editor input into a value.
    ///
    /// `None` is the explicit "set to NULL" toggle; `Some("")` stays an empty
    /// string. Input that does not parse as the column's kind is kept as text
    /// so the backend reports the mismatch instead of the value being lost.
    pub fn from_input(input: Option<&str>, kind: ValueKind) -> Self {
        let Some(text) = input else {
            return Value::Null;
        };

        match kind {
            ValueKind::Text => Value::String(text.to_string()),
            ValueKind::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "yes" | "y" => Value::Bool(true),
                "false" | "f" | "0" | "no" | "n" => Value::Bool(false),
                _ => Value::String(text.to_string()),
            },
            ValueKind::Number => {
                let trimmed = text.trim();
                if let Ok(int) = trimmed.parse::<i64>() {
                    Value::Number(int.into())
                } else if let Some(value) = trimmed.parse::<f64>().ok().and_then(Value::from_f64)
                {
                    value
                } else {
                    Value::String(text.to_string())
                }
            }
            ValueKind::Structured => match serde_json::from_str::<serde_json::Value>(text) {
                Ok(json) => Value::from(json),
                Err(_) => Value::String(text.to_string()),
            },
        }
    }

    /// Text shown in an input field, or `None` when the value is NULL.
    pub fn to_input(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(v) => Some(v.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Json(json) => Some(json.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Number(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(v) => Value::Bool(v),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            other => Value::Json(other),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(v),
            Value::Number(n) => serde_json::Value::Number(n),
            Value::String(s) => serde_json::Value::String(s),
            Value::Json(json) => json,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v.into())
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

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
