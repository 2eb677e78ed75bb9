//! Transforms over records, with schema propagation.
//!
//! Every transform follows the same two-phase lifecycle:
//!
//! 1. A declarative [`Transform`] is built from plain parameters (column
//!    names, operations, scalars). It never sees a schema.
//! 2. [`Transform::bind`] resolves it against an input schema and returns a
//!    [`BoundTransform`] that owns the resolved indices. The bound value can
//!    then derive the output schema and map records, and may be shared across
//!    threads for concurrent `map` calls.
//!
//! Re-binding to another schema yields a new [`BoundTransform`]; earlier bound
//! values stay valid.

use std::{fmt, sync::Arc};

use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    math::MathOp,
    metadata::{ColumnMetaData, ColumnType},
    schema::Schema,
    value::{render_record, Record, Value},
};

mod column;
mod long;

pub use column::{RemoveAllColumnsExceptFor, RemoveColumns, RenameColumn};
pub use long::{LongColumnsMathOp, LongMathOp};

use column::{BoundRename, ColumnMask};
use long::{BoundLongColumnsMathOp, BoundLongMathOp};

/// A declarative transform, not yet bound to a schema.
///
/// Two transforms are equal when their parameters are equal; column lists
/// compare as ordered sequences.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Transform {
    /// Remove the named columns.
    RemoveColumns(RemoveColumns),
    /// Keep only the named columns.
    RemoveAllColumnsExceptFor(RemoveAllColumnsExceptFor),
    /// Rename one column.
    RenameColumn(RenameColumn),
    /// Scalar math on one long column.
    LongMathOp(LongMathOp),
    /// Math across several long columns into a new column.
    LongColumnsMathOp(LongColumnsMathOp),
}

impl Transform {
    /// Shorthand for [`RemoveColumns::new`].
    pub fn remove_columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::RemoveColumns(RemoveColumns::new(columns))
    }

    /// Shorthand for [`LongMathOp::new`].
    pub fn long_math_op(column: impl Into<String>, op: MathOp, scalar: i64) -> Self {
        Self::LongMathOp(LongMathOp::new(column, op, scalar))
    }

    /// Resolves this transform against an input schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if a referenced column is missing and
    /// [`Error::ColumnKind`] if it has the wrong kind. No partially bound value
    /// is ever returned.
    pub fn bind(&self, input_schema: Arc<Schema>) -> Result<BoundTransform> {
        let state = match self {
            Self::RemoveColumns(t) => Bound::RemoveColumns(t.bind(&input_schema)?),
            Self::RemoveAllColumnsExceptFor(t) => Bound::KeepColumns(t.bind(&input_schema)?),
            Self::RenameColumn(t) => Bound::RenameColumn(t.bind(&input_schema)?),
            Self::LongMathOp(t) => Bound::LongMathOp(t.bind(&input_schema)?),
            Self::LongColumnsMathOp(t) => Bound::LongColumnsMathOp(t.bind(&input_schema)?),
        };
        debug!(
            transform = %self,
            input_columns = input_schema.num_columns(),
            "bound transform"
        );
        Ok(BoundTransform {
            transform: self.clone(),
            input_schema,
            state,
        })
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoveColumns(t) => t.fmt(f),
            Self::RemoveAllColumnsExceptFor(t) => t.fmt(f),
            Self::RenameColumn(t) => t.fmt(f),
            Self::LongMathOp(t) => t.fmt(f),
            Self::LongColumnsMathOp(t) => t.fmt(f),
        }
    }
}

impl From<RemoveColumns> for Transform {
    fn from(t: RemoveColumns) -> Self {
        Self::RemoveColumns(t)
    }
}

impl From<RemoveAllColumnsExceptFor> for Transform {
    fn from(t: RemoveAllColumnsExceptFor) -> Self {
        Self::RemoveAllColumnsExceptFor(t)
    }
}

impl From<RenameColumn> for Transform {
    fn from(t: RenameColumn) -> Self {
        Self::RenameColumn(t)
    }
}

impl From<LongMathOp> for Transform {
    fn from(t: LongMathOp) -> Self {
        Self::LongMathOp(t)
    }
}

impl From<LongColumnsMathOp> for Transform {
    fn from(t: LongColumnsMathOp) -> Self {
        Self::LongColumnsMathOp(t)
    }
}

/// Bind-time state, one variant per transform kind.
#[derive(Debug, Clone)]
enum Bound {
    RemoveColumns(ColumnMask),
    KeepColumns(ColumnMask),
    RenameColumn(BoundRename),
    LongMathOp(BoundLongMathOp),
    LongColumnsMathOp(BoundLongColumnsMathOp),
}

/// A transform resolved against an input schema.
///
/// Holds the input schema and the derived state computed at bind time. All
/// methods take `&self`, so one bound transform can serve concurrent `map`
/// calls.
#[derive(Debug, Clone)]
pub struct BoundTransform {
    transform: Transform,
    input_schema: Arc<Schema>,
    state: Bound,
}

impl BoundTransform {
    /// Returns the declarative transform this was bound from.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Returns the schema this transform was bound to.
    pub fn input_schema(&self) -> &Arc<Schema> {
        &self.input_schema
    }

    /// Derives the output schema for `schema`.
    ///
    /// This is a pure function of `schema` and the bound state: calling it
    /// twice with the same input yields equal schemas.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaDerivation`] if the result would be invalid
    /// (for example no columns left), [`Error::ColumnKind`] or
    /// [`Error::ColumnNotFound`] if `schema` does not fit the transform, and
    /// [`Error::Arithmetic`] if a bound computation overflows.
    pub fn derive_schema(&self, schema: &Schema) -> Result<Schema> {
        match &self.transform {
            Transform::RemoveColumns(t) => t.derive_schema(schema),
            Transform::RemoveAllColumnsExceptFor(t) => t.derive_schema(schema),
            Transform::RenameColumn(t) => t.derive_schema(schema),
            Transform::LongMathOp(t) => t.derive_schema(schema),
            Transform::LongColumnsMathOp(t) => t.derive_schema(schema),
        }
    }

    /// Derives the output schema for the bound input schema.
    ///
    /// # Errors
    ///
    /// See [`BoundTransform::derive_schema`].
    pub fn output_schema(&self) -> Result<Schema> {
        self.derive_schema(&self.input_schema)
    }

    /// Maps one record to a new record shaped like the output schema.
    ///
    /// The input is never modified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordShape`] if the record length differs from the
    /// bound schema, plus any conversion or arithmetic error raised by the
    /// transform itself.
    pub fn map(&self, record: &[Value]) -> Result<Record> {
        check_record_len(&self.input_schema, record, &self.transform)?;
        trace!(transform = %self.transform, "mapping record");
        match &self.state {
            Bound::RemoveColumns(mask) | Bound::KeepColumns(mask) => Ok(mask.apply(record)),
            Bound::RenameColumn(b) => Ok(b.map(record)),
            Bound::LongMathOp(b) => b.map(record),
            Bound::LongColumnsMathOp(b) => b.map(record),
        }
    }
}

impl fmt::Display for BoundTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.transform.fmt(f)
    }
}

/// Guards against schema/data desynchronization.
fn check_record_len(schema: &Schema, record: &[Value], transform: &Transform) -> Result<()> {
    if record.len() == schema.num_columns() {
        return Ok(());
    }
    Err(Error::RecordShape {
        expected: schema.num_columns(),
        actual: record.len(),
        transform: transform.to_string(),
        record: render_record(record),
    })
}

/// Resolves a column that must be of a given kind.
fn bind_typed_column(schema: &Schema, name: &str, expected: ColumnType) -> Result<usize> {
    let idx = schema.index_of_column(name)?;
    require_kind(schema, idx, expected)?;
    Ok(idx)
}

fn require_kind(schema: &Schema, idx: usize, expected: ColumnType) -> Result<&ColumnMetaData> {
    let meta = schema
        .meta_data(idx)
        .ok_or_else(|| Error::schema_derivation(format!("no column at index {idx}")))?;
    if meta.column_type() != expected {
        return Err(Error::column_kind(
            meta.name(),
            expected,
            meta.column_type(),
        ));
    }
    Ok(meta)
}

/// Renders names the way diagnostics list them: `[a, b, c]`.
fn fmt_names<S: AsRef<str>>(names: &[S]) -> String {
    let joined = names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn create_test_schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder()
                .add_long("id", Some(0), Some(100))
                .add_string("name")
                .add_long("score", Some(0), Some(10))
                .build()
                .unwrap(),
        )
    }

    fn create_test_record() -> Record {
        vec![Value::Long(7), Value::from("x"), Value::Long(3)]
    }

    #[test]
    fn test_bind_then_map() {
        let bound = Transform::remove_columns(["name"])
            .bind(create_test_schema())
            .unwrap();
        let out = bound.map(&create_test_record()).unwrap();
        assert_eq!(out, vec![Value::Long(7), Value::Long(3)]);
        assert_eq!(bound.output_schema().unwrap().column_names(), vec!["id", "score"]);
    }

    #[test]
    fn test_map_rejects_wrong_length() {
        let bound = Transform::long_math_op("score", MathOp::Add, 1)
            .bind(create_test_schema())
            .unwrap();
        let err = bound.map(&[Value::Long(7), Value::from("x")]).unwrap_err();
        match err {
            Error::RecordShape {
                expected,
                actual,
                transform,
                record,
            } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
                assert!(transform.contains("LongMathOpTransform"));
                assert_eq!(record, "7,x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rebind_leaves_previous_binding_intact() {
        let transform = Transform::remove_columns(["name"]);
        let first = transform.bind(create_test_schema()).unwrap();

        let other = Arc::new(
            Schema::builder()
                .add_string("name")
                .add_long("id", None, None)
                .build()
                .unwrap(),
        );
        let second = transform.bind(other).unwrap();

        assert_eq!(first.input_schema().num_columns(), 3);
        assert_eq!(second.input_schema().num_columns(), 2);
        assert_eq!(
            first.map(&create_test_record()).unwrap(),
            vec![Value::Long(7), Value::Long(3)]
        );
        assert_eq!(
            second.map(&[Value::from("y"), Value::Long(1)]).unwrap(),
            vec![Value::Long(1)]
        );
    }

    #[test]
    fn test_failed_bind_then_corrected_schema() {
        let transform = Transform::long_math_op("score", MathOp::Add, 1);
        let broken = Arc::new(Schema::builder().add_long("id", None, None).build().unwrap());
        let err = transform.bind(broken).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { ref name } if name == "score"));

        let bound = transform.bind(create_test_schema()).unwrap();
        assert_eq!(
            bound.map(&create_test_record()).unwrap()[2],
            Value::Long(4)
        );
    }

    #[test]
    fn test_derive_schema_is_pure() {
        let bound = Transform::long_math_op("score", MathOp::Multiply, -1)
            .bind(create_test_schema())
            .unwrap();
        let a = bound.derive_schema(bound.input_schema()).unwrap();
        let b = bound.derive_schema(bound.input_schema()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_and_hash_follow_parameters() {
        let a = Transform::remove_columns(["a", "b"]);
        let b = Transform::remove_columns(["a", "b"]);
        let c = Transform::remove_columns(["b", "a"]);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Transform> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display() {
        let t = Transform::remove_columns(["a", "b"]);
        assert_eq!(t.to_string(), "RemoveColumnsTransform([a, b])");
        let bound = Transform::remove_columns(["name"])
            .bind(create_test_schema())
            .unwrap();
        assert_eq!(bound.to_string(), "RemoveColumnsTransform([name])");
    }

    #[test]
    fn test_bound_transform_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BoundTransform>();
        assert_send_sync::<Transform>();
    }

    #[test]
    fn test_fmt_names() {
        assert_eq!(fmt_names(&["a", "b"]), "[a, b]");
        assert_eq!(fmt_names::<&str>(&[]), "[]");
    }
}
