//! Pipeline driver: binds a chain of transforms and runs records through it.
//!
//! Assembly happens once, on the calling thread: each transform is bound to
//! the schema produced by the one before it. Any binding or derivation error
//! aborts assembly before a single record is touched. Afterwards records are
//! mapped independently, optionally on a rayon thread pool.
//!
//! # Example
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
//! let process = TransformProcess::builder(schema)
//!     .remove_columns(["name"])
//!     .long_math_op("score", MathOp::Add, 5)
//!     .build()
//!     .unwrap();
//!
//! let out = process
//!     .execute(&[Value::Long(7), Value::from("x"), Value::Long(3)])
//!     .unwrap();
//! assert_eq!(out, vec![Value::Long(7), Value::Long(8)]);
//! ```

#[cfg(feature = "parallel")]
use std::sync::OnceLock;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    math::MathOp,
    schema::Schema,
    transform::{
        BoundTransform, LongColumnsMathOp, RemoveAllColumnsExceptFor, RemoveColumns,
        RenameColumn, Transform,
    },
    value::{Record, Value},
};

/// What to do when a single record fails to map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop and return the first failing record's error.
    #[default]
    Abort,
    /// Log the failure, drop the record and continue.
    Skip,
}

/// Options for [`TransformProcess::execute_batch`].
///
/// With the `parallel` feature the worker pool is created on first use and
/// reused by every later batch run with the same options (clones share it).
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    error_policy: ErrorPolicy,
    validate_output: bool,
    num_threads: usize,
    #[cfg(feature = "parallel")]
    pool: OnceLock<Arc<rayon::ThreadPool>>,
}

impl ExecutionOptions {
    /// Creates options with defaults: abort on error, no output validation,
    /// current thread only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-record error policy.
    #[must_use]
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Checks every output record against the final schema's constraints.
    ///
    /// Derived bounds come from applying an operation to the input bounds
    /// only. That is exact for monotonic operations (`Add`, `Subtract`,
    /// `Multiply`, `ReverseSubtract`, `ScalarMin`, `ScalarMax`) but not for
    /// `Modulus`, or `Divide`/`ReverseDivide` over a range crossing zero: for
    /// example `[0, 10] % 3` derives `[0, 1]`, so an output of `2` is rejected
    /// with [`Error::InvalidValue`]. Leave validation off for such chains.
    #[must_use]
    pub fn validate_output(mut self, enable: bool) -> Self {
        self.validate_output = enable;
        self
    }

    /// Sets the number of worker threads (0 = current thread only).
    ///
    /// Ignored unless the `parallel` feature is enabled.
    #[must_use]
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        #[cfg(feature = "parallel")]
        {
            self.pool = OnceLock::new();
        }
        self
    }

    /// Returns the error policy.
    pub fn get_error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// Returns whether output validation is enabled.
    pub fn get_validate_output(&self) -> bool {
        self.validate_output
    }

    /// Returns the number of worker threads.
    pub fn get_num_threads(&self) -> usize {
        self.num_threads
    }

    /// Returns the worker pool, building it on first call.
    #[cfg(feature = "parallel")]
    fn worker_pool(&self) -> Result<&Arc<rayon::ThreadPool>> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .map_err(|e| Error::invalid_config(format!("Failed to build worker pool: {e}")))?;
        debug!(num_threads = self.num_threads, "built worker pool");
        // A concurrent caller may have won the race; either pool is usable.
        Ok(self.pool.get_or_init(|| Arc::new(pool)))
    }
}

/// A record dropped under [`ErrorPolicy::Skip`].
#[derive(Debug)]
pub struct SkippedRecord {
    /// Position of the record in the input batch.
    pub index: usize,
    /// Why it was dropped.
    pub error: Error,
}

/// Result of [`TransformProcess::execute_batch`].
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Output records, in input order.
    pub records: Vec<Record>,
    /// Records dropped under [`ErrorPolicy::Skip`].
    pub skipped: Vec<SkippedRecord>,
}

/// A bound chain of transforms over a known initial schema.
#[derive(Debug, Clone)]
pub struct TransformProcess {
    steps: Vec<BoundTransform>,
    /// `schemas[0]` is the initial schema, `schemas[i + 1]` the output of step `i`.
    schemas: Vec<Arc<Schema>>,
}

impl TransformProcess {
    /// Creates a builder starting from `initial_schema`.
    pub fn builder(initial_schema: Schema) -> TransformProcessBuilder {
        TransformProcessBuilder {
            initial_schema,
            transforms: Vec::new(),
            pending_error: None,
        }
    }

    /// Binds `transforms` in order, starting from `initial_schema`.
    ///
    /// # Errors
    ///
    /// Returns the first binding or schema derivation error in the chain.
    pub fn new(
        initial_schema: Schema,
        transforms: impl IntoIterator<Item = Transform>,
    ) -> Result<Self> {
        let mut current = Arc::new(initial_schema);
        let mut schemas = vec![Arc::clone(&current)];
        let mut steps = Vec::new();

        for (step, transform) in transforms.into_iter().enumerate() {
            let bound = transform.bind(Arc::clone(&current))?;
            let next = Arc::new(bound.derive_schema(&current)?);
            debug!(
                step,
                transform = %bound,
                input_columns = current.num_columns(),
                output_columns = next.num_columns(),
                "derived schema"
            );
            steps.push(bound);
            schemas.push(Arc::clone(&next));
            current = next;
        }

        Ok(Self { steps, schemas })
    }

    /// Returns the schema records must match before the first transform.
    pub fn initial_schema(&self) -> &Schema {
        &self.schemas[0]
    }

    /// Returns the schema produced by the last transform.
    pub fn final_schema(&self) -> &Schema {
        &self.schemas[self.schemas.len() - 1]
    }

    /// Returns the schema produced by transform `step`, if it exists.
    pub fn schema_after(&self, step: usize) -> Option<&Schema> {
        self.schemas.get(step + 1).map(|s| &**s)
    }

    /// Returns the declarative transforms in order.
    pub fn transforms(&self) -> impl Iterator<Item = &Transform> {
        self.steps.iter().map(BoundTransform::transform)
    }

    /// Returns the number of transforms.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the chain has no transforms.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Maps one record through every transform.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any step; no partial output is
    /// returned.
    pub fn execute(&self, record: &[Value]) -> Result<Record> {
        let Some((first, rest)) = self.steps.split_first() else {
            return Ok(record.to_vec());
        };
        let mut current = first.map(record)?;
        for step in rest {
            current = step.map(&current)?;
        }
        Ok(current)
    }

    /// Maps a batch of records, each independently.
    ///
    /// # Errors
    ///
    /// Under [`ErrorPolicy::Abort`], returns the error of the first failing
    /// record (by input position). Also fails if the worker pool cannot be
    /// created.
    pub fn execute_batch(
        &self,
        records: &[Record],
        options: &ExecutionOptions,
    ) -> Result<ExecutionReport> {
        let results = self.map_all(records, options)?;

        let mut report = ExecutionReport {
            records: Vec::with_capacity(results.len()),
            skipped: Vec::new(),
        };
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(record) => report.records.push(record),
                Err(error) => match options.error_policy {
                    ErrorPolicy::Abort => return Err(error),
                    ErrorPolicy::Skip => {
                        warn!(index, %error, "skipping record");
                        report.skipped.push(SkippedRecord { index, error });
                    }
                },
            }
        }
        Ok(report)
    }

    fn execute_checked(&self, record: &[Value], validate: bool) -> Result<Record> {
        let out = self.execute(record)?;
        if validate {
            self.final_schema().validate_record(&out)?;
        }
        Ok(out)
    }

    #[cfg(feature = "parallel")]
    fn map_all(
        &self,
        records: &[Record],
        options: &ExecutionOptions,
    ) -> Result<Vec<Result<Record>>> {
        use rayon::prelude::*;

        if options.num_threads == 0 {
            return Ok(self.map_sequential(records, options));
        }
        let pool = options.worker_pool()?;
        Ok(pool.install(|| {
            records
                .par_iter()
                .map(|record| self.execute_checked(record, options.validate_output))
                .collect()
        }))
    }

    #[cfg(not(feature = "parallel"))]
    fn map_all(
        &self,
        records: &[Record],
        options: &ExecutionOptions,
    ) -> Result<Vec<Result<Record>>> {
        Ok(self.map_sequential(records, options))
    }

    fn map_sequential(
        &self,
        records: &[Record],
        options: &ExecutionOptions,
    ) -> Vec<Result<Record>> {
        records
            .iter()
            .map(|record| self.execute_checked(record, options.validate_output))
            .collect()
    }
}

/// Builder for [`TransformProcess`].
///
/// Transforms are collected declaratively; nothing is bound until
/// [`TransformProcessBuilder::build`].
#[derive(Debug)]
pub struct TransformProcessBuilder {
    initial_schema: Schema,
    transforms: Vec<Transform>,
    pending_error: Option<Error>,
}

impl TransformProcessBuilder {
    /// Appends any transform.
    #[must_use]
    pub fn transform(mut self, transform: impl Into<Transform>) -> Self {
        self.transforms.push(transform.into());
        self
    }

    /// Appends a [`RemoveColumns`] transform.
    #[must_use]
    pub fn remove_columns<S: Into<String>>(self, columns: impl IntoIterator<Item = S>) -> Self {
        self.transform(RemoveColumns::new(columns))
    }

    /// Appends a [`RemoveAllColumnsExceptFor`] transform.
    #[must_use]
    pub fn remove_all_columns_except_for<S: Into<String>>(
        self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.transform(RemoveAllColumnsExceptFor::new(columns))
    }

    /// Appends a [`RenameColumn`] transform.
    #[must_use]
    pub fn rename_column(self, old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        self.transform(RenameColumn::new(old_name, new_name))
    }

    /// Appends a [`LongMathOp`](crate::LongMathOp) transform.
    #[must_use]
    pub fn long_math_op(self, column: impl Into<String>, op: MathOp, scalar: i64) -> Self {
        self.transform(Transform::long_math_op(column, op, scalar))
    }

    /// Appends a [`LongColumnsMathOp`] transform.
    ///
    /// An invalid configuration is reported by [`TransformProcessBuilder::build`].
    #[must_use]
    pub fn long_columns_math_op<S: Into<String>>(
        mut self,
        new_column_name: impl Into<String>,
        op: MathOp,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        match LongColumnsMathOp::new(new_column_name, op, columns) {
            Ok(t) => self.transform(t),
            Err(e) => {
                self.pending_error.get_or_insert(e);
                self
            }
        }
    }

    /// Returns the number of transforms added so far.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Returns true if no transforms were added.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Binds every transform in order.
    ///
    /// # Errors
    ///
    /// Returns the first configuration, binding or schema derivation error.
    pub fn build(self) -> Result<TransformProcess> {
        if let Some(e) = self.pending_error {
            return Err(e);
        }
        TransformProcess::new(self.initial_schema, self.transforms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ColumnMetaData;

    fn create_test_schema() -> Schema {
        Schema::builder()
            .add_long("id", Some(0), Some(100))
            .add_string("name")
            .add_long("score", Some(0), Some(10))
            .build()
            .unwrap()
    }

    fn create_test_process() -> TransformProcess {
        TransformProcess::builder(create_test_schema())
            .remove_columns(["name"])
            .long_math_op("score", MathOp::Add, 5)
            .build()
            .unwrap()
    }

    fn record(id: i64, name: &str, score: i64) -> Record {
        vec![Value::Long(id), Value::from(name), Value::Long(score)]
    }

    #[test]
    fn test_schemas_follow_chain() {
        let process = create_test_process();
        assert_eq!(process.len(), 2);
        assert_eq!(process.initial_schema(), &create_test_schema());
        assert_eq!(
            process.schema_after(0).unwrap().column_names(),
            vec!["id", "score"]
        );
        assert_eq!(
            process.final_schema().column_meta_data(),
            &[
                ColumnMetaData::long("id", Some(0), Some(100)),
                ColumnMetaData::long("score", Some(5), Some(15)),
            ]
        );
        assert!(process.schema_after(2).is_none());
    }

    #[test]
    fn test_empty_process_is_identity() {
        let process = TransformProcess::builder(create_test_schema()).build().unwrap();
        assert!(process.is_empty());
        assert_eq!(process.final_schema(), process.initial_schema());
        assert_eq!(process.execute(&record(1, "a", 2)).unwrap(), record(1, "a", 2));
    }

    #[test]
    fn test_assembly_failure_aborts_build() {
        let err = TransformProcess::builder(create_test_schema())
            .remove_columns(["name"])
            .long_math_op("name", MathOp::Add, 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { ref name } if name == "name"));
    }

    #[test]
    fn test_builder_reports_invalid_config() {
        let err = TransformProcess::builder(create_test_schema())
            .long_columns_math_op("total", MathOp::Add, ["id"])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_transforms_listed_in_order() {
        let process = create_test_process();
        let names: Vec<String> = process.transforms().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "RemoveColumnsTransform([name])",
                "LongMathOpTransform(column=score,mathOp=Add,scalar=5)"
            ]
        );
    }

    #[test]
    fn test_execute_batch_abort() {
        let process = create_test_process();
        let records = vec![record(1, "a", 2), vec![Value::Long(1)], record(3, "c", 4)];
        let err = process
            .execute_batch(&records, &ExecutionOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::RecordShape { .. }));
    }

    #[test]
    fn test_execute_batch_skip() {
        let process = create_test_process();
        let records = vec![record(1, "a", 2), vec![Value::Long(1)], record(3, "c", 4)];
        let options = ExecutionOptions::new().error_policy(ErrorPolicy::Skip);
        let report = process.execute_batch(&records, &options).unwrap();
        assert_eq!(
            report.records,
            vec![
                vec![Value::Long(1), Value::Long(7)],
                vec![Value::Long(3), Value::Long(9)],
            ]
        );
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 1);
    }

    #[test]
    fn test_validate_output() {
        let process = create_test_process();
        // score 20 maps to 25, outside [5, 15]
        let records = vec![record(1, "a", 20)];
        let lenient = process
            .execute_batch(&records, &ExecutionOptions::new())
            .unwrap();
        assert_eq!(lenient.records.len(), 1);

        let strict = ExecutionOptions::new().validate_output(true);
        let err = process.execute_batch(&records, &strict).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref column, .. } if column == "score"));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_execute_batch_parallel_preserves_order() {
        let process = create_test_process();
        let records: Vec<Record> = (0..200).map(|i| record(i % 100, "n", i % 10)).collect();
        let options = ExecutionOptions::new().num_threads(4);
        let report = process.execute_batch(&records, &options).unwrap();
        assert_eq!(report.records.len(), 200);
        for (i, out) in report.records.iter().enumerate() {
            let i = i as i64;
            assert_eq!(out, &vec![Value::Long(i % 100), Value::Long(i % 10 + 5)]);
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_worker_pool_reused_across_batches() {
        let process = create_test_process();
        let records: Vec<Record> = (0..20).map(|i| record(i, "n", i % 10)).collect();
        let options = ExecutionOptions::new().num_threads(2);

        process.execute_batch(&records, &options).unwrap();
        let first = Arc::clone(options.worker_pool().unwrap());
        process.execute_batch(&records, &options).unwrap();
        assert!(Arc::ptr_eq(&first, options.worker_pool().unwrap()));
        assert_eq!(first.current_num_threads(), 2);

        // Clones share the pool; changing the thread count drops it.
        let cloned = options.clone();
        assert!(Arc::ptr_eq(&first, cloned.worker_pool().unwrap()));
        let resized = cloned.num_threads(3);
        assert!(!Arc::ptr_eq(&first, resized.worker_pool().unwrap()));
    }

    #[test]
    fn test_validate_output_rejects_modulus_outside_endpoint_bounds() {
        let schema = Schema::builder()
            .add_long("x", Some(0), Some(10))
            .build()
            .unwrap();
        let process = TransformProcess::builder(schema)
            .long_math_op("x", MathOp::Modulus, 3)
            .build()
            .unwrap();
        assert_eq!(
            process.final_schema().column_meta_data(),
            &[ColumnMetaData::long("x", Some(0), Some(1))]
        );

        let records = vec![vec![Value::Long(5)]];
        let report = process
            .execute_batch(&records, &ExecutionOptions::new())
            .unwrap();
        assert_eq!(report.records, vec![vec![Value::Long(2)]]);

        let strict = ExecutionOptions::new().validate_output(true);
        let err = process.execute_batch(&records, &strict).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref column, .. } if column == "x"));
    }

    #[test]
    fn test_shared_across_threads() {
        let process = create_test_process();
        std::thread::scope(|s| {
            for t in 0..4_i64 {
                let process = &process;
                s.spawn(move || {
                    let out = process.execute(&record(t, "x", t)).unwrap();
                    assert_eq!(out, vec![Value::Long(t), Value::Long(t + 5)]);
                });
            }
        });
    }

    #[test]
    fn test_options_getters() {
        let options = ExecutionOptions::new()
            .error_policy(ErrorPolicy::Skip)
            .validate_output(true)
            .num_threads(3);
        assert_eq!(options.get_error_policy(), ErrorPolicy::Skip);
        assert!(options.get_validate_output());
        assert_eq!(options.get_num_threads(), 3);
    }
}
