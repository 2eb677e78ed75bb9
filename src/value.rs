//! Cell values and records.
//!
//! A [`Value`] is a single cell. Transforms only rely on its conversion
//! capabilities (`to_long`, `to_int`, `to_double`, `Display`), never on the
//! variant it is stored as.

use std::fmt;

use crate::error::{Error, Result};

/// One row of data, positionally aligned to a [`Schema`](crate::Schema).
pub type Record = Vec<Value>;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    /// 32-bit signed integer.
    Integer(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 text (also used for categorical states).
    Text(String),
}

impl Value {
    /// Converts the cell to a signed 64-bit integer.
    ///
    /// Text is parsed; doubles must hold an integral value in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueConversion`] if the cell has no integer reading.
    pub fn to_long(&self) -> Result<i64> {
        match self {
            Self::Long(v) => Ok(*v),
            Self::Integer(v) => Ok(i64::from(*v)),
            Self::Double(d) => integral_f64(*d)
                .ok_or_else(|| Error::value_conversion(self, "i64")),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::value_conversion(self, "i64")),
            Self::Null => Err(Error::value_conversion(self, "i64")),
        }
    }

    /// Converts the cell to a signed 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueConversion`] if the cell has no integer reading or
    /// the value does not fit in 32 bits.
    pub fn to_int(&self) -> Result<i32> {
        let long = self
            .to_long()
            .map_err(|_| Error::value_conversion(self, "i32"))?;
        i32::try_from(long).map_err(|_| Error::value_conversion(self, "i32"))
    }

    /// Converts the cell to a 64-bit float.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueConversion`] for `Null` or unparseable text.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_double(&self) -> Result<f64> {
        match self {
            Self::Double(d) => Ok(*d),
            Self::Long(v) => Ok(*v as f64),
            Self::Integer(v) => Ok(f64::from(*v)),
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::value_conversion(self, "f64")),
            Self::Null => Err(Error::value_conversion(self, "f64")),
        }
    }

    /// Returns true if the cell is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral_f64(d: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if d.is_finite() && d.fract() == 0.0 && d >= i64::MIN as f64 && d < i64::MAX as f64 {
        Some(d as i64)
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Renders a record as comma-separated cell values, for diagnostics.
pub fn render_record(record: &[Value]) -> String {
    record
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_long_from_each_variant() {
        assert_eq!(Value::Long(-3).to_long().unwrap(), -3);
        assert_eq!(Value::Integer(42).to_long().unwrap(), 42);
        assert_eq!(Value::Double(8.0).to_long().unwrap(), 8);
        assert_eq!(Value::from(" 17 ").to_long().unwrap(), 17);
    }

    #[test]
    fn test_to_long_rejects_fractional_and_null() {
        assert!(Value::Double(1.5).to_long().is_err());
        assert!(Value::Double(f64::NAN).to_long().is_err());
        assert!(Value::Null.to_long().is_err());
        assert!(Value::from("abc").to_long().is_err());
    }

    #[test]
    fn test_to_int_range() {
        assert_eq!(Value::Long(12).to_int().unwrap(), 12);
        let err = Value::Long(i64::from(i32::MAX) + 1).to_int().unwrap_err();
        assert!(err.to_string().contains("i32"));
    }

    #[test]
    fn test_to_double() {
        assert_eq!(Value::Long(2).to_double().unwrap(), 2.0);
        assert_eq!(Value::from("2.5").to_double().unwrap(), 2.5);
        assert!(Value::Null.to_double().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Long(7).to_string(), "7");
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Double(0.5).to_string(), "0.5");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(Some(3_i64)), Value::Long(3));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_render_record() {
        let record = vec![Value::Long(7), Value::from("x"), Value::Integer(3)];
        assert_eq!(render_record(&record), "7,x,3");
        assert_eq!(render_record(&[]), "");
    }
}
