//! Column metadata: the kind of each column plus its value constraints.

use std::fmt;

use crate::{
    error::{Error, Result},
    value::Value,
};

/// The kind tag of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// 64-bit integer column.
    Long,
    /// 32-bit integer column.
    Integer,
    /// 64-bit float column.
    Double,
    /// Free text column.
    String,
    /// Text column restricted to a fixed set of states.
    Categorical,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Long => "Long",
            Self::Integer => "Integer",
            Self::Double => "Double",
            Self::String => "String",
            Self::Categorical => "Categorical",
        };
        f.write_str(name)
    }
}

/// Typed descriptor for one column.
///
/// Numeric bounds are inclusive; `None` means unbounded on that side.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnMetaData {
    /// 64-bit integer column.
    Long {
        /// Column name.
        name: String,
        /// Smallest allowed value.
        min: Option<i64>,
        /// Largest allowed value.
        max: Option<i64>,
    },
    /// 32-bit integer column.
    Integer {
        /// Column name.
        name: String,
        /// Smallest allowed value.
        min: Option<i32>,
        /// Largest allowed value.
        max: Option<i32>,
    },
    /// 64-bit float column.
    Double {
        /// Column name.
        name: String,
        /// Smallest allowed value.
        min: Option<f64>,
        /// Largest allowed value.
        max: Option<f64>,
    },
    /// Free text column.
    String {
        /// Column name.
        name: String,
        /// Minimum length in characters.
        min_length: Option<usize>,
        /// Maximum length in characters.
        max_length: Option<usize>,
    },
    /// Categorical column with an ordered list of states.
    Categorical {
        /// Column name.
        name: String,
        /// Allowed states, in declaration order.
        states: Vec<String>,
    },
}

impl ColumnMetaData {
    /// Long column with optional bounds.
    pub fn long(name: impl Into<String>, min: Option<i64>, max: Option<i64>) -> Self {
        Self::Long {
            name: name.into(),
            min,
            max,
        }
    }

    /// Integer column with optional bounds.
    pub fn integer(name: impl Into<String>, min: Option<i32>, max: Option<i32>) -> Self {
        Self::Integer {
            name: name.into(),
            min,
            max,
        }
    }

    /// Double column with optional bounds.
    pub fn double(name: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::Double {
            name: name.into(),
            min,
            max,
        }
    }

    /// Unconstrained string column.
    pub fn string(name: impl Into<String>) -> Self {
        Self::String {
            name: name.into(),
            min_length: None,
            max_length: None,
        }
    }

    /// Categorical column.
    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        states: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Categorical {
            name: name.into(),
            states: states.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        match self {
            Self::Long { name, .. }
            | Self::Integer { name, .. }
            | Self::Double { name, .. }
            | Self::String { name, .. }
            | Self::Categorical { name, .. } => name,
        }
    }

    /// Returns the kind tag.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Long { .. } => ColumnType::Long,
            Self::Integer { .. } => ColumnType::Integer,
            Self::Double { .. } => ColumnType::Double,
            Self::String { .. } => ColumnType::String,
            Self::Categorical { .. } => ColumnType::Categorical,
        }
    }

    /// Returns a copy with a different name and identical constraints.
    #[must_use]
    pub fn with_name(&self, new_name: impl Into<String>) -> Self {
        let mut meta = self.clone();
        match &mut meta {
            Self::Long { name, .. }
            | Self::Integer { name, .. }
            | Self::Double { name, .. }
            | Self::String { name, .. }
            | Self::Categorical { name, .. } => *name = new_name.into(),
        }
        meta
    }

    /// Returns `(min, max)` for a long column, `None` for any other kind.
    pub fn long_bounds(&self) -> Option<(Option<i64>, Option<i64>)> {
        match self {
            Self::Long { min, max, .. } => Some((*min, *max)),
            _ => None,
        }
    }

    /// Checks that numeric bounds (or string length limits) are ordered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the column and both bounds if
    /// `min > max`.
    pub fn check_bounds(&self) -> Result<()> {
        let inverted = match self {
            Self::Long { min, max, .. } => inverted_pair(min.as_ref(), max.as_ref()),
            Self::Integer { min, max, .. } => inverted_pair(min.as_ref(), max.as_ref()),
            Self::Double { min, max, .. } => inverted_pair(min.as_ref(), max.as_ref()),
            Self::String {
                min_length,
                max_length,
                ..
            } => inverted_pair(min_length.as_ref(), max_length.as_ref()),
            Self::Categorical { .. } => None,
        };
        match inverted {
            Some((min, max)) => Err(Error::invalid_config(format!(
                "Column \"{}\" has min ({min}) greater than max ({max})",
                self.name()
            ))),
            None => Ok(()),
        }
    }

    /// Checks whether a cell is acceptable for this column.
    ///
    /// `Null` is never valid.
    pub fn is_valid(&self, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }
        match self {
            Self::Long { min, max, .. } => value
                .to_long()
                .is_ok_and(|v| in_bounds(v, *min, *max)),
            Self::Integer { min, max, .. } => value
                .to_int()
                .is_ok_and(|v| in_bounds(v, *min, *max)),
            Self::Double { min, max, .. } => value
                .to_double()
                .is_ok_and(|v| !v.is_nan() && in_bounds(v, *min, *max)),
            Self::String {
                min_length,
                max_length,
                ..
            } => match value {
                Value::Text(s) => in_bounds(s.chars().count(), *min_length, *max_length),
                _ => false,
            },
            Self::Categorical { states, .. } => match value {
                Value::Text(s) => states.iter().any(|state| state == s),
                _ => false,
            },
        }
    }
}

fn in_bounds<T: PartialOrd>(v: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m)
}

fn inverted_pair<T: PartialOrd + fmt::Display>(
    min: Option<&T>,
    max: Option<&T>,
) -> Option<(String, String)> {
    match (min, max) {
        (Some(lo), Some(hi)) if lo > hi => Some((lo.to_string(), hi.to_string())),
        _ => None,
    }
}

fn fmt_bound<T: fmt::Display>(bound: Option<&T>) -> String {
    bound.map_or_else(|| "none".to_string(), ToString::to_string)
}

impl fmt::Display for ColumnMetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long { name, min, max } => write!(
                f,
                "LongMetaData(name=\"{name}\",minAllowed={},maxAllowed={})",
                fmt_bound(min.as_ref()),
                fmt_bound(max.as_ref())
            ),
            Self::Integer { name, min, max } => write!(
                f,
                "IntegerMetaData(name=\"{name}\",minAllowed={},maxAllowed={})",
                fmt_bound(min.as_ref()),
                fmt_bound(max.as_ref())
            ),
            Self::Double { name, min, max } => write!(
                f,
                "DoubleMetaData(name=\"{name}\",minAllowed={},maxAllowed={})",
                fmt_bound(min.as_ref()),
                fmt_bound(max.as_ref())
            ),
            Self::String {
                name,
                min_length,
                max_length,
            } => write!(
                f,
                "StringMetaData(name=\"{name}\",minLength={},maxLength={})",
                fmt_bound(min_length.as_ref()),
                fmt_bound(max_length.as_ref())
            ),
            Self::Categorical { name, states } => write!(
                f,
                "CategoricalMetaData(name=\"{name}\",stateNames=[{}])",
                states.join(",")
            ),
        }
    }
}
