//! Error types for tabform.

use crate::{math::MathOp, metadata::ColumnType};

/// Result type alias for tabform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while binding, deriving schemas or mapping records.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Column not found in schema.
    #[error("Column \"{name}\" not found")]
    ColumnNotFound {
        /// The name of the missing column.
        name: String,
    },

    /// Column exists but has the wrong kind for the transform.
    #[error("Column \"{column}\" is not a {expected} column (found {actual})")]
    ColumnKind {
        /// The offending column.
        column: String,
        /// The kind the transform requires.
        expected: ColumnType,
        /// The kind found in the schema.
        actual: ColumnType,
    },

    /// The same column name appears twice in a schema.
    #[error("Duplicate column name \"{name}\" in schema")]
    DuplicateColumn {
        /// The repeated name.
        name: String,
    },

    /// Applying a transform's schema rule would produce an invalid schema.
    #[error("Schema derivation failed: {message}")]
    SchemaDerivation {
        /// Description of the derivation failure.
        message: String,
    },

    /// A record's length disagrees with the schema the transform was bound to.
    #[error(
        "Cannot execute transform: input record length ({actual}) does not match expected number \
         of elements (schema: {expected}). Transform = {transform} and record {record}"
    )]
    RecordShape {
        /// Column count of the bound schema.
        expected: usize,
        /// Length of the offending record.
        actual: usize,
        /// Description of the transform that rejected the record.
        transform: String,
        /// The offending record, rendered.
        record: String,
    },

    /// Integer arithmetic failed (division or modulus by zero, or overflow).
    #[error("Arithmetic error: {op} of {lhs} and {rhs} overflows or divides by zero")]
    Arithmetic {
        /// The operation that failed.
        op: MathOp,
        /// Left operand (the cell or bound value).
        lhs: i64,
        /// Right operand (the scalar or second column).
        rhs: i64,
    },

    /// A cell could not be converted to the requested native type.
    #[error("Cannot convert value \"{value}\" to {target}")]
    ValueConversion {
        /// The rendered value.
        value: String,
        /// Name of the target type.
        target: &'static str,
    },

    /// An output cell violates its column's metadata.
    #[error("Invalid value \"{value}\" for column \"{column}\"")]
    InvalidValue {
        /// The column whose constraints were violated.
        column: String,
        /// The rendered value.
        value: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Arrow error while converting to or from a columnar batch.
    #[cfg(feature = "arrow")]
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl Error {
    /// Create a column not found error.
    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::ColumnNotFound { name: name.into() }
    }

    /// Create a column kind error.
    pub fn column_kind(column: impl Into<String>, expected: ColumnType, actual: ColumnType) -> Self {
        Self::ColumnKind {
            column: column.into(),
            expected,
            actual,
        }
    }

    /// Create a schema derivation error.
    pub fn schema_derivation(message: impl Into<String>) -> Self {
        Self::SchemaDerivation {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a value conversion error.
    pub fn value_conversion(value: impl std::fmt::Display, target: &'static str) -> Self {
        Self::ValueConversion {
            value: value.to_string(),
            target,
        }
    }

    /// Returns true for errors raised while binding a transform to a schema.
    pub fn is_binding(&self) -> bool {
        matches!(self, Self::ColumnNotFound { .. } | Self::ColumnKind { .. })
    }

    /// Returns true for errors raised while deriving an output schema.
    pub fn is_schema_derivation(&self) -> bool {
        matches!(
            self,
            Self::SchemaDerivation { .. } | Self::DuplicateColumn { .. }
        )
    }
}
