//! Tagged value representation for prototype members.
//!
//! Property values, constructor arguments, and annotation payloads are all
//! carried as [`Value`]. Equality is structural; this is the default
//! comparer used by bindable setters to decide whether a write is an
//! effective change.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Declared type of a property, parameter, or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// Boolean
    Bool,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 64-bit float
    F64,
    /// Immutable string
    Str,
}

impl TypeTag {
    /// Human-readable name of the tag
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Bool => "bool",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::F64 => "f64",
            TypeTag::Str => "string",
        }
    }

    /// Default value for a freshly allocated slot of this type
    pub fn default_value(&self) -> Value {
        match self {
            TypeTag::Bool => Value::Bool(false),
            TypeTag::I32 => Value::I32(0),
            TypeTag::I64 => Value::I64(0),
            TypeTag::F64 => Value::F64(0.0),
            TypeTag::Str => Value::Null,
        }
    }

    /// Cost of converting `value` into this type.
    ///
    /// `Some(0)` is an exact match, higher costs are widening conversions
    /// (i32 → i64 → f64, null → string). `None` means not assignable.
    /// Overload resolution prefers the candidate with the lowest total cost.
    pub fn conversion_cost(&self, value: &Value) -> Option<u32> {
        match (self, value) {
            (TypeTag::Bool, Value::Bool(_)) => Some(0),
            (TypeTag::I32, Value::I32(_)) => Some(0),
            (TypeTag::I64, Value::I64(_)) => Some(0),
            (TypeTag::I64, Value::I32(_)) => Some(1),
            (TypeTag::F64, Value::F64(_)) => Some(0),
            (TypeTag::F64, Value::I64(_)) => Some(1),
            (TypeTag::F64, Value::I32(_)) => Some(2),
            (TypeTag::Str, Value::Str(_)) => Some(0),
            (TypeTag::Str, Value::Null) => Some(1),
            _ => None,
        }
    }

    /// Whether `value` can be stored in a slot of this type
    pub fn accepts(&self, value: &Value) -> bool {
        self.conversion_cost(value).is_some()
    }

    /// Convert `value` into this type, applying widening where needed.
    ///
    /// Returns `None` when the value is not assignable. Stored values are
    /// always coerced first so that the changed-check compares like with
    /// like (writing `I32(3)` twice to an `F64` slot must be one change,
    /// not two).
    pub fn coerce(&self, value: Value) -> Option<Value> {
        match (self, &value) {
            (TypeTag::I64, Value::I32(i)) => Some(Value::I64(*i as i64)),
            (TypeTag::F64, Value::I32(i)) => Some(Value::F64(*i as f64)),
            (TypeTag::F64, Value::I64(i)) => Some(Value::F64(*i as f64)),
            _ => {
                if self.accepts(&value) {
                    Some(value)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A runtime value held in a property slot or passed as an argument.
///
/// Strings are reference-counted so cloning a value never copies the
/// character data. Equality is structural; `f64` follows IEEE semantics
/// (`NaN != NaN`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent reference value
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 64-bit float
    F64(f64),
    /// Immutable shared string
    Str(Arc<str>),
}

impl Value {
    /// Create a string value
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Whether this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's runtime type
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F64(_) => "f64",
            Value::Str(_) => "string",
        }
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i32
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as i64, widening from i32
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(i) => Some(*i as i64),
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64, widening from the integer types
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I32(i) => Some(*i as f64),
            Value::I64(i) => Some(*i as f64),
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(i) => write!(f, "{}", i),
            Value::I64(i) => write!(f, "{}", i),
            Value::F64(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::I32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::str(s)
    }
}
