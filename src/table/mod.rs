//! In-memory typed tables.
//!
//! A [`Table`] is a named Arrow [`RecordBatch`]. Every source extract is read
//! into one table (all row groups concatenated) and every pipeline stage
//! produces a new table rather than mutating its input. The table name is
//! carried along so that schema errors say which dataset is missing a column.

pub mod sort;

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray, UInt32Array, new_null_array};
use arrow::compute::{cast, concat_batches, take};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::pretty::pretty_format_batches;
use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::error::{ReconError, Result};

pub use sort::SortKey;

/// A named, fully materialized table
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    batch: RecordBatch,
}

impl Table {
    /// Wrap a record batch
    #[must_use]
    pub fn new(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            batch,
        }
    }

    /// An empty table with the given schema
    #[must_use]
    pub fn empty(name: impl Into<String>, schema: SchemaRef) -> Self {
        Self::new(name, RecordBatch::new_empty(schema))
    }

    /// Build a table from named columns of equal length
    pub fn from_columns(name: impl Into<String>, columns: Vec<(String, ArrayRef)>) -> Result<Self> {
        let name = name.into();
        let num_rows = columns.first().map_or(0, |(_, c)| c.len());
        let fields = columns
            .iter()
            .map(|(n, c)| Field::new(n, c.data_type().clone(), true))
            .collect_vec();
        let arrays = columns.into_iter().map(|(_, c)| c).collect_vec();
        let batch = build_batch(&name, Arc::new(Schema::new(fields)), arrays, num_rows)?;
        Ok(Self::new(name, batch))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the table itself (not its columns)
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    #[must_use]
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    /// Look up a column, failing with a schema error if it is absent
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| ReconError::missing_column(&self.name, name))
    }

    /// A column cast to Utf8
    pub fn string_column(&self, name: &str) -> Result<StringArray> {
        let column = self.column(name)?;
        let casted = cast(column, &DataType::Utf8).map_err(|e| {
            ReconError::schema(&self.name, format!("column '{name}' cannot be read as text: {e}"))
        })?;
        casted
            .as_any()
            .downcast_ref::<StringArray>()
            .cloned()
            .ok_or_else(|| {
                ReconError::schema(&self.name, format!("column '{name}' is not a string array"))
            })
    }

    /// Validate that all named columns exist, reporting every missing one
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        let missing = names.iter().filter(|n| !self.has_column(n)).collect_vec();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReconError::schema(
                &self.name,
                format!("expected column(s) absent: {}", missing.iter().join(", ")),
            ))
        }
    }

    /// Keep only the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        self.require_columns(names)?;
        let schema = self.batch.schema();
        let mut fields = Vec::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let idx = schema
                .index_of(name)
                .map_err(|_| ReconError::missing_column(&self.name, name))?;
            fields.push(schema.field(idx).clone());
            columns.push(Arc::clone(self.batch.column(idx)));
        }
        self.rebuild(fields, columns)
    }

    /// Remove the named columns; names that are absent are ignored
    pub fn drop(&self, names: &[&str]) -> Result<Self> {
        let keep = self
            .column_names()
            .into_iter()
            .filter(|c| !names.contains(&c.as_str()))
            .collect_vec();
        self.select(&keep.iter().map(String::as_str).collect_vec())
    }

    /// Rename columns; every source name must exist
    pub fn rename(&self, pairs: &[(&str, &str)]) -> Result<Self> {
        let sources = pairs.iter().map(|(from, _)| *from).collect_vec();
        self.require_columns(&sources)?;
        let schema = self.batch.schema();
        let fields = schema
            .fields()
            .iter()
            .map(|f| {
                match pairs.iter().find(|(from, _)| *from == f.name().as_str()) {
                    Some((_, to)) => f.as_ref().clone().with_name(*to),
                    None => f.as_ref().clone(),
                }
            })
            .collect_vec();
        self.rebuild(fields, self.batch.columns().to_vec())
    }

    /// Replace a column of the same name or append a new one
    pub fn with_column(&self, name: &str, array: ArrayRef) -> Result<Self> {
        if array.len() != self.num_rows() {
            return Err(ReconError::schema(
                &self.name,
                format!(
                    "column '{name}' has {} rows, table has {}",
                    array.len(),
                    self.num_rows()
                ),
            ));
        }
        let schema = self.batch.schema();
        let mut fields = schema.fields().iter().map(|f| f.as_ref().clone()).collect_vec();
        let mut columns = self.batch.columns().to_vec();
        let field = Field::new(name, array.data_type().clone(), true);
        match schema.index_of(name) {
            Ok(idx) => {
                fields[idx] = field;
                columns[idx] = array;
            }
            Err(_) => {
                fields.push(field);
                columns.push(array);
            }
        }
        self.rebuild(fields, columns)
    }

    /// The first `n` rows
    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        let len = n.min(self.num_rows());
        Self::new(self.name.clone(), self.batch.slice(0, len))
    }

    /// Gather rows by position; null indices produce all-null rows
    pub fn take_rows(&self, indices: &UInt32Array) -> Result<Self> {
        let columns = self
            .batch
            .columns()
            .iter()
            .map(|c| take(c.as_ref(), indices, None))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let fields = self
            .batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone().with_nullable(true))
            .collect_vec();
        let batch = build_batch(&self.name, Arc::new(Schema::new(fields)), columns, indices.len())?;
        Ok(Self::new(self.name.clone(), batch))
    }

    /// Vertical union aligned by column name
    ///
    /// The output schema is the ordered union of all column names. Columns a
    /// table lacks are null-filled. An all-null column takes the type of the
    /// other inputs; any other type difference casts the column to Utf8.
    pub fn concat(name: &str, tables: &[Self]) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        let mut types: FxHashMap<String, DataType> = FxHashMap::default();
        for table in tables {
            for field in table.schema().fields() {
                match types.get(field.name()) {
                    None => {
                        names.push(field.name().clone());
                        types.insert(field.name().clone(), field.data_type().clone());
                    }
                    Some(DataType::Null) => {
                        types.insert(field.name().clone(), field.data_type().clone());
                    }
                    Some(existing)
                        if existing != field.data_type() && field.data_type() != &DataType::Null =>
                    {
                        types.insert(field.name().clone(), DataType::Utf8);
                    }
                    Some(_) => {}
                }
            }
        }

        let schema = Arc::new(Schema::new(
            names
                .iter()
                .map(|n| Field::new(n, types[n].clone(), true))
                .collect_vec(),
        ));

        let aligned = tables
            .iter()
            .map(|table| {
                let columns = names
                    .iter()
                    .map(|n| match table.batch.column_by_name(n) {
                        Some(column) => Ok(cast(column, &types[n])?),
                        None => Ok(new_null_array(&types[n], table.num_rows())),
                    })
                    .collect::<Result<Vec<_>>>()?;
                build_batch(name, Arc::clone(&schema), columns, table.num_rows())
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = concat_batches(&schema, &aligned)?;
        Ok(Self::new(name, batch))
    }

    /// Pretty-printed first `n` rows
    #[must_use]
    pub fn preview(&self, n: usize) -> String {
        let head = self.head(n);
        match pretty_format_batches(&[head.batch]) {
            Ok(formatted) => formatted.to_string(),
            Err(e) => format!("<unprintable table {}: {e}>", self.name),
        }
    }

    /// Log row count and, at debug level, a preview
    pub fn log_preview(&self, label: &str, rows: usize) {
        log::info!("{label}: {} rows", self.num_rows());
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("{label}:\n{}", self.preview(rows));
        }
    }

    fn rebuild(&self, fields: Vec<Field>, columns: Vec<ArrayRef>) -> Result<Self> {
        let batch = build_batch(
            &self.name,
            Arc::new(Schema::new(fields)),
            columns,
            self.num_rows(),
        )?;
        Ok(Self::new(self.name.clone(), batch))
    }
}

/// Build a record batch that may have zero columns
pub(crate) fn build_batch(
    table: &str,
    schema: SchemaRef,
    columns: Vec<ArrayRef>,
    num_rows: usize,
) -> Result<RecordBatch> {
    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    RecordBatch::try_new_with_options(schema, columns, &options)
        .map_err(|e| ReconError::schema(table, e.to_string()))
}
