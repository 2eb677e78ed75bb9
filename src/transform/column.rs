//! Column selection transforms: remove, keep-only and rename.

use std::{collections::HashSet, fmt};

use super::fmt_names;
use crate::{
    error::{Error, Result},
    schema::Schema,
    value::{Record, Value},
};

/// Positions to keep, resolved at bind time.
#[derive(Debug, Clone)]
pub(super) struct ColumnMask {
    keep: Vec<bool>,
    kept: usize,
}

impl ColumnMask {
    fn new(keep: Vec<bool>) -> Self {
        let kept = keep.iter().filter(|&&k| k).count();
        Self { keep, kept }
    }

    pub(super) fn apply(&self, record: &[Value]) -> Record {
        let mut out = Vec::with_capacity(self.kept);
        out.extend(
            record
                .iter()
                .zip(&self.keep)
                .filter(|(_, keep)| **keep)
                .map(|(v, _)| v.clone()),
        );
        out
    }
}

/// Removes the named columns.
///
/// Names may repeat; removal has set semantics. Every name must exist in the
/// input schema.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use tabform::{RemoveColumns, Schema, Transform, Value};
///
/// let schema = Schema::builder()
///     .add_long("id", None, None)
///     .add_string("debug_info")
///     .build()
///     .unwrap();
/// let bound = Transform::from(RemoveColumns::new(["debug_info"]))
///     .bind(Arc::new(schema))
///     .unwrap();
/// let out = bound.map(&[Value::Long(1), Value::from("x")]).unwrap();
/// assert_eq!(out, vec![Value::Long(1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoveColumns {
    columns: Vec<String>,
}

impl RemoveColumns {
    /// Creates a RemoveColumns transform for the given column names.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the columns to be removed.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(super) fn bind(&self, schema: &Schema) -> Result<ColumnMask> {
        let mut keep = vec![true; schema.num_columns()];
        for name in &self.columns {
            keep[schema.index_of_column(name)?] = false;
        }
        Ok(ColumnMask::new(keep))
    }

    pub(super) fn derive_schema(&self, schema: &Schema) -> Result<Schema> {
        let to_remove: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        if let Some(missing) = to_remove.iter().find(|name| !schema.has_column(name)) {
            return Err(Error::column_not_found(*missing));
        }

        let new_num_columns = schema.num_columns() - to_remove.len();
        if new_num_columns == 0 {
            return Err(Error::schema_derivation(format!(
                "Number of columns after executing operation is {new_num_columns} (is <= 0). \
                 origColumns = {}, toRemove = {}",
                fmt_names(&schema.column_names()),
                fmt_names(&self.columns)
            )));
        }

        let new_meta = schema
            .column_meta_data()
            .iter()
            .filter(|meta| !to_remove.contains(meta.name()))
            .cloned()
            .collect();
        schema.new_schema(new_meta)
    }
}

impl fmt::Display for RemoveColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoveColumnsTransform({})", fmt_names(&self.columns))
    }
}

/// Keeps only the named columns, in their original schema order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoveAllColumnsExceptFor {
    columns: Vec<String>,
}

impl RemoveAllColumnsExceptFor {
    /// Creates a transform keeping only the given columns.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the columns to keep.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(super) fn bind(&self, schema: &Schema) -> Result<ColumnMask> {
        let mut keep = vec![false; schema.num_columns()];
        for name in &self.columns {
            keep[schema.index_of_column(name)?] = true;
        }
        Ok(ColumnMask::new(keep))
    }

    pub(super) fn derive_schema(&self, schema: &Schema) -> Result<Schema> {
        let to_keep: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        if let Some(missing) = to_keep.iter().find(|name| !schema.has_column(name)) {
            return Err(Error::column_not_found(*missing));
        }
        if to_keep.is_empty() {
            return Err(Error::schema_derivation(format!(
                "Number of columns after executing operation is 0 (is <= 0). origColumns = {}, \
                 toKeep = []",
                fmt_names(&schema.column_names())
            )));
        }

        let new_meta = schema
            .column_meta_data()
            .iter()
            .filter(|meta| to_keep.contains(meta.name()))
            .cloned()
            .collect();
        schema.new_schema(new_meta)
    }
}

impl fmt::Display for RemoveAllColumnsExceptFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RemoveAllColumnsExceptForTransform({})",
            fmt_names(&self.columns)
        )
    }
}

/// Renames one column, keeping its kind and constraints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenameColumn {
    old_name: String,
    new_name: String,
}

impl RenameColumn {
    /// Creates a rename from `old_name` to `new_name`.
    pub fn new(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    /// Returns the current column name.
    pub fn old_name(&self) -> &str {
        &self.old_name
    }

    /// Returns the new column name.
    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    pub(super) fn bind(&self, schema: &Schema) -> Result<BoundRename> {
        schema.index_of_column(&self.old_name)?;
        Ok(BoundRename)
    }

    pub(super) fn derive_schema(&self, schema: &Schema) -> Result<Schema> {
        let idx = schema.index_of_column(&self.old_name)?;
        if self.old_name != self.new_name && schema.has_column(&self.new_name) {
            return Err(Error::DuplicateColumn {
                name: self.new_name.clone(),
            });
        }
        let mut new_meta = schema.column_meta_data().to_vec();
        new_meta[idx] = new_meta[idx].with_name(self.new_name.as_str());
        schema.new_schema(new_meta)
    }
}

impl fmt::Display for RenameColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RenameColumnTransform(oldName={},newName={})",
            self.old_name, self.new_name
        )
    }
}

/// Renaming leaves cell values untouched.
#[derive(Debug, Clone)]
pub(super) struct BoundRename;

impl BoundRename {
    pub(super) fn map(&self, record: &[Value]) -> Record {
        record.to_vec()
    }
}
