//! Scalar integer arithmetic used by the math transforms.

use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// A closed set of integer operations between a value `a` and a scalar `s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathOp {
    /// `a + s`
    Add,
    /// `a - s`
    Subtract,
    /// `a * s`
    Multiply,
    /// `a / s`, truncating toward zero
    Divide,
    /// `a % s`
    Modulus,
    /// `s - a`
    ReverseSubtract,
    /// `s / a`, truncating toward zero
    ReverseDivide,
    /// `min(a, s)`
    ScalarMin,
    /// `max(a, s)`
    ScalarMax,
}

impl MathOp {
    /// All operations, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Modulus,
        Self::ReverseSubtract,
        Self::ReverseDivide,
        Self::ScalarMin,
        Self::ScalarMax,
    ];

    /// Applies the operation to `a` and the scalar `s`.
    ///
    /// Arithmetic is checked: overflow, division by zero and modulus by zero
    /// return [`Error::Arithmetic`] instead of wrapping or panicking.
    ///
    /// # Example
    ///
    /// ```
    /// use tabform::MathOp;
    ///
    /// assert_eq!(MathOp::ReverseSubtract.apply(3, 10).unwrap(), 7);
    /// assert!(MathOp::Divide.apply(3, 0).is_err());
    /// ```
    pub fn apply(self, a: i64, s: i64) -> Result<i64> {
        let result = match self {
            Self::Add => a.checked_add(s),
            Self::Subtract => a.checked_sub(s),
            Self::Multiply => a.checked_mul(s),
            Self::Divide => a.checked_div(s),
            Self::Modulus => a.checked_rem(s),
            Self::ReverseSubtract => s.checked_sub(a),
            Self::ReverseDivide => s.checked_div(a),
            Self::ScalarMin => Some(a.min(s)),
            Self::ScalarMax => Some(a.max(s)),
        };
        result.ok_or(Error::Arithmetic {
            op: self,
            lhs: a,
            rhs: s,
        })
    }

    /// Returns true if the operation can fold any number of operands.
    pub fn is_associative(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Multiply | Self::ScalarMin | Self::ScalarMax
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Subtract => "Subtract",
            Self::Multiply => "Multiply",
            Self::Divide => "Divide",
            Self::Modulus => "Modulus",
            Self::ReverseSubtract => "ReverseSubtract",
            Self::ReverseDivide => "ReverseDivide",
            Self::ScalarMin => "ScalarMin",
            Self::ScalarMax => "ScalarMax",
        }
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MathOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_config(format!("Unknown or not implemented math op: {s}")))
    }
}
