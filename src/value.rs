//! The scalar value type stored in rows and produced by literals.

use crate::error::{EngineError, Result};
use crate::limits::MAX_TYPE_SIZE;
use std::fmt;

/// A single cell value.
///
/// `Integer` and `Float` interoperate for equality and ordering; `String` is
/// bounded to [`MAX_TYPE_SIZE`] bytes on construction. `Null` is not equal to
/// anything, including another `Null`.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(u32),
    Float(f32),
    String(String),
}

impl Value {
    pub fn null() -> Self {
        Value::Null
    }

    pub fn from_int(v: u32) -> Self {
        Value::Integer(v)
    }

    pub fn from_float(v: f32) -> Self {
        Value::Float(v)
    }

    /// Build a bounded string value. Fails if `s` is longer than [`MAX_TYPE_SIZE`].
    pub fn from_string(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.len() > MAX_TYPE_SIZE {
            return Err(EngineError::LimitReached);
        }
        Ok(Value::String(s))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INT",
            Value::Float(_) => "FLOAT",
            Value::String(_) => "VARCHAR",
        }
    }

    /// Numeric equality/ordering compares through `f64` so u32/f32 never lose
    /// precision against each other in either direction.
    fn numeric(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f as f64),
            _ => None,
        }
    }

    /// Equality used by WHERE/ON predicates and row comparisons.
    ///
    /// `Null` never matches anything, not even another `Null`.
    pub fn sql_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                matches!((self.numeric(), other.numeric()), (Some(a), Some(b)) if a == b)
            }
            _ => false,
        }
    }

    pub fn sql_ne(&self, other: &Value) -> bool {
        !self.sql_eq(other)
    }

    /// `>` is defined only when at least one side is a `Float`; `INT > INT`
    /// has no defined ordering and always returns `false`.
    pub fn sql_gt(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                matches!((self.numeric(), other.numeric()), (Some(a), Some(b)) if a > b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_never_equal() {
        assert!(!Value::Null.sql_eq(&Value::Null));
        assert!(!Value::Null.sql_eq(&Value::Integer(0)));
    }

    #[test]
    fn integer_float_cross_equality() {
        assert!(Value::Integer(4).sql_eq(&Value::Float(4.0)));
        assert!(Value::Float(4.0).sql_eq(&Value::Integer(4)));
    }

    #[test]
    fn int_gt_int_is_unsupported() {
        assert!(!Value::Integer(5).sql_gt(&Value::Integer(1)));
    }

    #[test]
    fn float_gt_int_converts() {
        assert!(Value::Float(5.5).sql_gt(&Value::Integer(5)));
        assert!(!Value::Float(4.5).sql_gt(&Value::Integer(5)));
    }

    #[test]
    fn bounded_string_rejects_overlong() {
        let long = "x".repeat(MAX_TYPE_SIZE + 1);
        assert!(Value::from_string(long).is_err());
    }
}
