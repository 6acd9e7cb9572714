//! Runtime values stored in the constant pool and on the VM stack.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Runtime value.
///
/// Only numbers exist for now. The enum shape is kept so booleans, nil and
/// heap references can be added without touching chunk or VM signatures.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// IEEE 754 double.
    Number(f64),
}

impl Value {
    /// Numeric payload.
    pub const fn as_number(self) -> f64 {
        match self {
            Value::Number(n) => n,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Number(v) }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self { Value::Number(f64::from(v)) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_shortest_form() {
        assert_eq!(Value::from(3.0).to_string(), "3");
        assert_eq!(Value::from(1.2).to_string(), "1.2");
        assert_eq!(Value::from(-0.5).to_string(), "-0.5");
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::from(7), Value::Number(7.0));
        assert_eq!(Value::from(2.5).as_number(), 2.5);
    }
}
