//! Constant values
//!
//! Literals appearing in call patterns and rule expressions, and constants
//! resolved from the program graph.

use serde::{Deserialize, Serialize};

/// A constant literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConstValue {
    pub fn str(value: impl Into<String>) -> Self {
        ConstValue::Str(value.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ConstValue::Bool(_) => "bool",
            ConstValue::Int(_) => "int",
            ConstValue::Float(_) => "float",
            ConstValue::Str(_) => "string",
        }
    }

    /// Numeric view (ints widen to floats)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstValue::Int(i) => Some(*i as f64),
            ConstValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Equality with int/float widening
    pub fn loosely_equals(&self, other: &ConstValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl From<&str> for ConstValue {
    fn from(value: &str) -> Self {
        ConstValue::Str(value.to_string())
    }
}

impl From<i64> for ConstValue {
    fn from(value: i64) -> Self {
        ConstValue::Int(value)
    }
}

impl From<bool> for ConstValue {
    fn from(value: bool) -> Self {
        ConstValue::Bool(value)
    }
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Int(i) => write!(f, "{}", i),
            ConstValue::Float(x) => write!(f, "{}", x),
            ConstValue::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_numeric_equality() {
        assert!(ConstValue::Int(3).loosely_equals(&ConstValue::Float(3.0)));
        assert!(!ConstValue::Int(3).loosely_equals(&ConstValue::str("3")));
        assert!(ConstValue::str("AES").loosely_equals(&ConstValue::from("AES")));
    }

    #[test]
    fn test_untagged_yaml_scalars() {
        let values: Vec<ConstValue> = serde_yaml::from_str("[true, 12, 1.5, AES]").unwrap();
        assert_eq!(
            values,
            vec![
                ConstValue::Bool(true),
                ConstValue::Int(12),
                ConstValue::Float(1.5),
                ConstValue::str("AES"),
            ]
        );
    }
}
