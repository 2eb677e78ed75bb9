//! tabform - Schema-driven record transforms in pure Rust
//!
//! Applies a declared sequence of typed transforms to tabular records while
//! propagating the schema (column names, kinds and value constraints such as
//! numeric bounds) in lockstep with the data.
//!
//! # Design Principles
//!
//! 1. **Bind, then map** - transforms are declared without a schema, bound
//!    once to an input schema, then map any number of records
//! 2. **Schema and data agree** - every transform derives its output schema
//!    and checks record length on the way in
//! 3. **Immutable schemas** - each step produces a new [`Schema`]; bound
//!    transforms are `Send + Sync` and can map records concurrently
//!
//! # Quick Start
//!
//! ```
//! use tabform::{MathOp, Schema, TransformProcess, Value};
//!
//! let schema = Schema::builder()
//!     .add_long("id", Some(0), Some(100))
//!     .add_string("name")
//!     .add_long("score", Some(0), Some(10))
//!     .build()
//!     .unwrap();
//!
//! let process = TransformProcess::builder(schema)
//!     .remove_columns(["name"])
//!     .long_math_op("score", MathOp::Add, 5)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(process.final_schema().column_names(), vec!["id", "score"]);
//! let out = process
//!     .execute(&[Value::Long(7), Value::from("x"), Value::Long(3)])
//!     .unwrap();
//! assert_eq!(out, vec![Value::Long(7), Value::Long(8)]);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::float_cmp,
        clippy::too_many_lines
    )
)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "arrow")]
pub mod arrow_batch;
pub mod error;
pub mod math;
pub mod metadata;
pub mod process;
pub mod schema;
pub mod transform;
pub mod value;

pub use error::{Error, Result};
pub use math::MathOp;
pub use metadata::{ColumnMetaData, ColumnType};
pub use process::{
    ErrorPolicy, ExecutionOptions, ExecutionReport, SkippedRecord, TransformProcess,
    TransformProcessBuilder,
};
pub use schema::{Schema, SchemaBuilder};
pub use transform::{
    BoundTransform, LongColumnsMathOp, LongMathOp, RemoveAllColumnsExceptFor, RemoveColumns,
    RenameColumn, Transform,
};
pub use value::{render_record, Record, Value};
