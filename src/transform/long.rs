//! Integer math on long columns.

use std::fmt;

use super::{bind_typed_column, fmt_names, require_kind};
use crate::{
    error::{Error, Result},
    math::MathOp,
    metadata::{ColumnMetaData, ColumnType},
    schema::Schema,
    value::{Record, Value},
};

/// Applies `op` between every cell of a long column and a scalar.
///
/// The column's bounds are propagated through the same operation and
/// reordered when the operation flips them (for example `Multiply` by a
/// negative scalar, or `ReverseSubtract`).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use tabform::{ColumnMetaData, MathOp, Schema, Transform, Value};
///
/// let schema = Schema::builder().add_long("x", Some(0), Some(1)).build().unwrap();
/// let bound = Transform::long_math_op("x", MathOp::Multiply, -1)
///     .bind(Arc::new(schema))
///     .unwrap();
/// let out = bound.output_schema().unwrap();
/// assert_eq!(out.meta_data(0), Some(&ColumnMetaData::long("x", Some(-1), Some(0))));
/// assert_eq!(bound.map(&[Value::Long(1)]).unwrap(), vec![Value::Long(-1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LongMathOp {
    column: String,
    op: MathOp,
    scalar: i64,
}

impl LongMathOp {
    /// Creates a scalar math transform on `column`.
    pub fn new(column: impl Into<String>, op: MathOp, scalar: i64) -> Self {
        Self {
            column: column.into(),
            op,
            scalar,
        }
    }

    /// Returns the target column name.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the operation.
    pub fn op(&self) -> MathOp {
        self.op
    }

    /// Returns the scalar operand.
    pub fn scalar(&self) -> i64 {
        self.scalar
    }

    pub(super) fn bind(&self, schema: &Schema) -> Result<BoundLongMathOp> {
        let index = bind_typed_column(schema, &self.column, ColumnType::Long)?;
        Ok(BoundLongMathOp {
            index,
            op: self.op,
            scalar: self.scalar,
        })
    }

    pub(super) fn derive_schema(&self, schema: &Schema) -> Result<Schema> {
        let idx = schema.index_of_column(&self.column)?;
        let meta = require_kind(schema, idx, ColumnType::Long)?;
        let new_column = self.new_column_meta_data(meta)?;

        let mut new_meta = schema.column_meta_data().to_vec();
        new_meta[idx] = new_column;
        schema.new_schema(new_meta)
    }

    fn new_column_meta_data(&self, meta: &ColumnMetaData) -> Result<ColumnMetaData> {
        let Some((min, max)) = meta.long_bounds() else {
            return Err(Error::column_kind(
                meta.name(),
                ColumnType::Long,
                meta.column_type(),
            ));
        };
        let mut min = min.map(|v| self.op.apply(v, self.scalar)).transpose()?;
        let mut max = max.map(|v| self.op.apply(v, self.scalar)).transpose()?;
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                // rsub 1 over [0, 1] gives (1, 0); multiply by -1 gives (0, -1)
                std::mem::swap(&mut min, &mut max);
            }
        }
        Ok(ColumnMetaData::long(meta.name(), min, max))
    }
}

impl fmt::Display for LongMathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LongMathOpTransform(column={},mathOp={},scalar={})",
            self.column, self.op, self.scalar
        )
    }
}

#[derive(Debug, Clone)]
pub(super) struct BoundLongMathOp {
    index: usize,
    op: MathOp,
    scalar: i64,
}

impl BoundLongMathOp {
    pub(super) fn map(&self, record: &[Value]) -> Result<Record> {
        let mut out = record.to_vec();
        let value = out[self.index].to_long()?;
        out[self.index] = Value::Long(self.op.apply(value, self.scalar)?);
        Ok(out)
    }
}

/// Combines two or more long columns into a new long column appended at the
/// end of the record.
///
/// `Add`, `Multiply`, `ScalarMin` and `ScalarMax` fold any number of columns
/// left to right. `Subtract`, `Divide` and `Modulus` take exactly two columns
/// (`first op second`). The new column is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LongColumnsMathOp {
    new_column_name: String,
    op: MathOp,
    columns: Vec<String>,
}

impl LongColumnsMathOp {
    /// Creates a column-wise math transform.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if fewer than two columns are given,
    /// if a two-operand operation receives more than two, or if the operation
    /// has no column-wise meaning (`ReverseSubtract`, `ReverseDivide`).
    pub fn new<S: Into<String>>(
        new_column_name: impl Into<String>,
        op: MathOp,
        columns: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.len() < 2 {
            return Err(Error::invalid_config(format!(
                "{op} over columns needs at least 2 input columns, got {}",
                columns.len()
            )));
        }
        if matches!(op, MathOp::ReverseSubtract | MathOp::ReverseDivide) {
            return Err(Error::invalid_config(format!(
                "{op} is not supported across columns"
            )));
        }
        if !op.is_associative() && columns.len() != 2 {
            return Err(Error::invalid_config(format!(
                "{op} over columns needs exactly 2 input columns, got {}",
                columns.len()
            )));
        }
        Ok(Self {
            new_column_name: new_column_name.into(),
            op,
            columns,
        })
    }

    /// Returns the name of the appended column.
    pub fn new_column_name(&self) -> &str {
        &self.new_column_name
    }

    /// Returns the operation.
    pub fn op(&self) -> MathOp {
        self.op
    }

    /// Returns the input columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(super) fn bind(&self, schema: &Schema) -> Result<BoundLongColumnsMathOp> {
        let indices = self
            .columns
            .iter()
            .map(|name| bind_typed_column(schema, name, ColumnType::Long))
            .collect::<Result<Vec<_>>>()?;
        Ok(BoundLongColumnsMathOp {
            indices,
            op: self.op,
        })
    }

    pub(super) fn derive_schema(&self, schema: &Schema) -> Result<Schema> {
        for name in &self.columns {
            bind_typed_column(schema, name, ColumnType::Long)?;
        }
        let mut new_meta = schema.column_meta_data().to_vec();
        new_meta.push(ColumnMetaData::long(self.new_column_name.as_str(), None, None));
        schema.new_schema(new_meta)
    }
}

impl fmt::Display for LongColumnsMathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LongColumnsMathOpTransform(newColumnName=\"{}\",mathOp={},columns={})",
            self.new_column_name,
            self.op,
            fmt_names(&self.columns)
        )
    }
}

#[derive(Debug, Clone)]
pub(super) struct BoundLongColumnsMathOp {
    indices: Vec<usize>,
    op: MathOp,
}

impl BoundLongColumnsMathOp {
    pub(super) fn map(&self, record: &[Value]) -> Result<Record> {
        let mut operands = self.indices.iter().map(|&i| record[i].to_long());
        let first = operands
            .next()
            .ok_or_else(|| Error::invalid_config("no input columns"))??;
        let result = operands.try_fold(first, |acc, v| self.op.apply(acc, v?))?;

        let mut out = Vec::with_capacity(record.len() + 1);
        out.extend_from_slice(record);
        out.push(Value::Long(result));
        Ok(out)
    }
}
