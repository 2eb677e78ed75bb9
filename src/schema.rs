//! Ordered, named collections of column metadata.

use std::{collections::HashMap, fmt};

use crate::{
    error::{Error, Result},
    metadata::{ColumnMetaData, ColumnType},
    value::{render_record, Value},
};

/// An ordered sequence of [`ColumnMetaData`] with a name index.
///
/// Schemas are never mutated after construction. Transforms derive new ones
/// through [`Schema::new_schema`].
///
/// # Example
///
/// ```
/// use tabform::Schema;
///
/// let schema = Schema::builder()
///     .add_long("id", Some(0), Some(100))
///     .add_string("name")
///     .build()
///     .unwrap();
/// assert_eq!(schema.index_of_column("name").unwrap(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnMetaData>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Creates a schema from an ordered list of column metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateColumn`] if two columns share a name and
    /// [`Error::InvalidConfig`] if a numeric column has `min > max`.
    pub fn new(columns: Vec<ColumnMetaData>) -> Result<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, meta) in columns.iter().enumerate() {
            meta.check_bounds()?;
            if index.insert(meta.name().to_string(), i).is_some() {
                return Err(Error::DuplicateColumn {
                    name: meta.name().to_string(),
                });
            }
        }
        Ok(Self { columns, index })
    }

    /// Creates a new schema builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Builds a fresh schema from a new ordered metadata list.
    ///
    /// Categorical states and numeric bounds travel inside each
    /// [`ColumnMetaData`], so they carry over unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateColumn`] if the new list repeats a name.
    pub fn new_schema(&self, columns: Vec<ColumnMetaData>) -> Result<Self> {
        Self::new(columns)
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnMetaData::name).collect()
    }

    /// Returns the column metadata in order.
    pub fn column_meta_data(&self) -> &[ColumnMetaData] {
        &self.columns
    }

    /// Returns the position of a column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if no column has that name.
    pub fn index_of_column(&self, name: &str) -> Result<usize> {
        self.find_column(name)
            .ok_or_else(|| Error::column_not_found(name))
    }

    /// Returns the position of a column, if present.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns true if a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the metadata at a position.
    pub fn meta_data(&self, index: usize) -> Option<&ColumnMetaData> {
        self.columns.get(index)
    }

    /// Returns the metadata of a named column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if no column has that name.
    pub fn meta_data_of(&self, name: &str) -> Result<&ColumnMetaData> {
        let idx = self.index_of_column(name)?;
        Ok(&self.columns[idx])
    }

    /// Returns the kind of the column at a position.
    pub fn column_type(&self, index: usize) -> Option<ColumnType> {
        self.columns.get(index).map(ColumnMetaData::column_type)
    }

    /// Checks a record's length and every cell against this schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordShape`] on a length mismatch and
    /// [`Error::InvalidValue`] for the first cell its column rejects.
    pub fn validate_record(&self, record: &[Value]) -> Result<()> {
        if record.len() != self.num_columns() {
            return Err(Error::RecordShape {
                expected: self.num_columns(),
                actual: record.len(),
                transform: "SchemaValidation".to_string(),
                record: render_record(record),
            });
        }
        for (meta, value) in self.columns.iter().zip(record) {
            if !meta.is_valid(value) {
                return Err(Error::InvalidValue {
                    column: meta.name().to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schema():")?;
        writeln!(f, "{:<8}{:<24}{:<14}MetaData", "idx", "name", "type")?;
        for (i, meta) in self.columns.iter().enumerate() {
            writeln!(
                f,
                "{:<8}{:<24}{:<14}{}",
                i,
                format!("\"{}\"", meta.name()),
                meta.column_type().to_string(),
                meta
            )?;
        }
        Ok(())
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    columns: Vec<ColumnMetaData>,
}

impl SchemaBuilder {
    /// Adds a column with explicit metadata.
    #[must_use]
    pub fn add_column(mut self, meta: ColumnMetaData) -> Self {
        self.columns.push(meta);
        self
    }

    /// Adds a long column with optional bounds.
    #[must_use]
    pub fn add_long(self, name: impl Into<String>, min: Option<i64>, max: Option<i64>) -> Self {
        self.add_column(ColumnMetaData::long(name, min, max))
    }

    /// Adds several unbounded long columns.
    #[must_use]
    pub fn add_longs<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        names
            .into_iter()
            .fold(self, |b, name| b.add_long(name, None, None))
    }

    /// Adds an integer column with optional bounds.
    #[must_use]
    pub fn add_integer(self, name: impl Into<String>, min: Option<i32>, max: Option<i32>) -> Self {
        self.add_column(ColumnMetaData::integer(name, min, max))
    }

    /// Adds a double column with optional bounds.
    #[must_use]
    pub fn add_double(self, name: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        self.add_column(ColumnMetaData::double(name, min, max))
    }

    /// Adds an unconstrained string column.
    #[must_use]
    pub fn add_string(self, name: impl Into<String>) -> Self {
        self.add_column(ColumnMetaData::string(name))
    }

    /// Adds a categorical column.
    #[must_use]
    pub fn add_categorical<S: Into<String>>(
        self,
        name: impl Into<String>,
        states: impl IntoIterator<Item = S>,
    ) -> Self {
        self.add_column(ColumnMetaData::categorical(name, states))
    }

    /// Builds the schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateColumn`] if two columns share a name and
    /// [`Error::InvalidConfig`] for inverted bounds.
    pub fn build(self) -> Result<Schema> {
        Schema::new(self.columns)
    }
}
