use crate::collections::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// A dynamically typed node or edge attribute value.
///
/// All coercions used by the condition evaluator live here as explicit
/// helpers so that every operator applies the same rules: truthiness via
/// [`Value::to_bool`], numeric coercion via [`Value::to_number`] (format,
/// then parse as a 64-bit float) and canonical string form via `Display`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness: booleans as-is, numbers true iff positive, strings are
    /// parsed as numbers first (then non-empty is true), `Null` is false,
    /// everything else is true.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i > 0,
            Value::Float(f) => *f > 0.0,
            Value::Str(s) => match s.parse::<f64>() {
                Ok(n) => n > 0.0,
                Err(_) => !s.is_empty(),
            },
            Value::List(_) | Value::Map(_) => true,
        }
    }

    /// Numeric coercion. Booleans, `Null`, lists and maps have no numeric
    /// form; strings must parse as a 64-bit float.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Str(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Equality: numeric when both sides coerce to numbers (so `"1"` equals
    /// `1.0`), element-wise for two lists, canonical string form otherwise.
    pub fn equals(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.to_number(), other.to_number()) {
            return a == b;
        }
        if let (Value::List(a), Value::List(b)) = (self, other) {
            return a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y));
        }
        self.to_string() == other.to_string()
    }

    /// Build a map value from key/value pairs, preserving insertion order.
    pub fn map_from(entries: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Map(entries.into_iter().collect())
    }

    /// Rendering for result rows: like `Display` except that `Null` becomes
    /// the literal `<not set>`.
    pub fn render(&self) -> String {
        if self.is_null() {
            "<not set>".to_string()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
