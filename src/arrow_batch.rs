//! Conversion between row records and Arrow columnar batches.
//!
//! Long maps to `Int64`, Integer to `Int32`, Double to `Float64`, and both
//! String and Categorical to `Utf8`. [`Value::Null`] maps to an Arrow null.
//! Column bounds and categorical states have no Arrow counterpart and are
//! dropped on the way out; [`schema_from_arrow`] produces unbounded columns.

use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, Float64Array, Int32Array, Int64Array, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema as ArrowSchema},
};

use crate::{
    error::{Error, Result},
    metadata::{ColumnMetaData, ColumnType},
    schema::Schema,
    value::{render_record, Record, Value},
};

/// Returns the Arrow schema matching `schema`. Every field is nullable.
pub fn to_arrow_schema(schema: &Schema) -> ArrowSchema {
    let fields: Vec<Field> = schema
        .column_meta_data()
        .iter()
        .map(|meta| Field::new(meta.name(), arrow_type(meta.column_type()), true))
        .collect();
    ArrowSchema::new(fields)
}

/// Builds a schema of unbounded columns from an Arrow schema.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for Arrow types with no column kind, and
/// [`Error::DuplicateColumn`] for repeated field names.
pub fn schema_from_arrow(arrow_schema: &ArrowSchema) -> Result<Schema> {
    let columns = arrow_schema
        .fields()
        .iter()
        .map(|field| {
            let name = field.name().as_str();
            match field.data_type() {
                DataType::Int64 => Ok(ColumnMetaData::long(name, None, None)),
                DataType::Int32 => Ok(ColumnMetaData::integer(name, None, None)),
                DataType::Float64 => Ok(ColumnMetaData::double(name, None, None)),
                DataType::Utf8 => Ok(ColumnMetaData::string(name)),
                other => Err(unsupported(name, other)),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Schema::new(columns)
}

/// Packs records into one columnar batch.
///
/// # Errors
///
/// Returns [`Error::RecordShape`] if a record does not match `schema`,
/// [`Error::ValueConversion`] if a cell cannot be read as its column's type,
/// and [`Error::Arrow`] if Arrow rejects the batch.
pub fn records_to_batch(schema: &Schema, records: &[Record]) -> Result<RecordBatch> {
    if let Some(bad) = records.iter().find(|r| r.len() != schema.num_columns()) {
        return Err(Error::RecordShape {
            expected: schema.num_columns(),
            actual: bad.len(),
            transform: "RecordBatchConversion".to_string(),
            record: render_record(bad),
        });
    }

    let columns = schema
        .column_meta_data()
        .iter()
        .enumerate()
        .map(|(i, meta)| build_column(meta.column_type(), records.iter().map(|r| &r[i])))
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordBatch::try_new(
        Arc::new(to_arrow_schema(schema)),
        columns,
    )?)
}

/// Unpacks a columnar batch into row records.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for columns of an unsupported Arrow type.
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<Record>> {
    let schema = batch.schema();
    let mut records: Vec<Record> = (0..batch.num_rows())
        .map(|_| Vec::with_capacity(batch.num_columns()))
        .collect();

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        for (record, value) in records.iter_mut().zip(column_values(field, column)?) {
            record.push(value);
        }
    }
    Ok(records)
}

fn arrow_type(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Long => DataType::Int64,
        ColumnType::Integer => DataType::Int32,
        ColumnType::Double => DataType::Float64,
        ColumnType::String | ColumnType::Categorical => DataType::Utf8,
    }
}

fn unsupported(column: &str, data_type: &DataType) -> Error {
    Error::invalid_config(format!(
        "Unsupported Arrow type {data_type} for column \"{column}\""
    ))
}

fn build_column<'a>(
    column_type: ColumnType,
    cells: impl Iterator<Item = &'a Value>,
) -> Result<ArrayRef> {
    fn nullable<T>(v: &Value, f: impl Fn(&Value) -> Result<T>) -> Result<Option<T>> {
        if v.is_null() {
            Ok(None)
        } else {
            f(v).map(Some)
        }
    }

    let array: ArrayRef = match column_type {
        ColumnType::Long => Arc::new(Int64Array::from(
            cells
                .map(|v| nullable(v, Value::to_long))
                .collect::<Result<Vec<_>>>()?,
        )),
        ColumnType::Integer => Arc::new(Int32Array::from(
            cells
                .map(|v| nullable(v, Value::to_int))
                .collect::<Result<Vec<_>>>()?,
        )),
        ColumnType::Double => Arc::new(Float64Array::from(
            cells
                .map(|v| nullable(v, Value::to_double))
                .collect::<Result<Vec<_>>>()?,
        )),
        ColumnType::String | ColumnType::Categorical => Arc::new(StringArray::from(
            cells
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect::<Vec<Option<String>>>(),
        )),
    };
    Ok(array)
}

fn column_values(field: &Field, column: &ArrayRef) -> Result<Vec<Value>> {
    fn downcast<'a, A: 'static>(field: &Field, column: &'a ArrayRef) -> Result<&'a A> {
        column
            .as_any()
            .downcast_ref::<A>()
            .ok_or_else(|| unsupported(field.name(), column.data_type()))
    }

    let values = match column.data_type() {
        DataType::Int64 => {
            let array = downcast::<Int64Array>(field, column)?;
            (0..array.len())
                .map(|i| Value::from(array.is_valid(i).then(|| array.value(i))))
                .collect()
        }
        DataType::Int32 => {
            let array = downcast::<Int32Array>(field, column)?;
            (0..array.len())
                .map(|i| Value::from(array.is_valid(i).then(|| array.value(i))))
                .collect()
        }
        DataType::Float64 => {
            let array = downcast::<Float64Array>(field, column)?;
            (0..array.len())
                .map(|i| Value::from(array.is_valid(i).then(|| array.value(i))))
                .collect()
        }
        DataType::Utf8 => {
            let array = downcast::<StringArray>(field, column)?;
            (0..array.len())
                .map(|i| Value::from(array.is_valid(i).then(|| array.value(i))))
                .collect()
        }
        other => return Err(unsupported(field.name(), other)),
    };
    Ok(values)
}
