//! Loading Parquet extracts into tables.
//!
//! Each named source dataset lives either in `<input_dir>/<NAME>.parquet` or in
//! a directory `<input_dir>/<NAME>/` of part files. Everything is read eagerly
//! and concatenated into a single [`Table`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use arrow::compute::concat_batches;
use arrow::datatypes::Schema;
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use itertools::Itertools;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::error::util::{safe_open_file, validate_directory};
use crate::error::{PathContext, ReconError, Result};
use crate::table::Table;
use crate::utils::{log_operation_complete, log_operation_start, log_warning};

/// Read a single Parquet file into record batches
///
/// When `columns` is given only those columns are decoded; a requested
/// column that the file does not contain is a schema error.
pub fn read_parquet_batches(
    path: &Path,
    columns: Option<&[&str]>,
    batch_size: usize,
) -> Result<(Schema, Vec<RecordBatch>)> {
    let file = safe_open_file(path, "reading a parquet extract")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).with_path(path)?;

    let builder = match columns {
        Some(columns) => {
            let mask = create_projection(
                columns,
                builder.schema(),
                builder.parquet_schema(),
                &path.display().to_string(),
            )?;
            builder.with_projection(mask)
        }
        None => builder,
    };

    let reader = builder.with_batch_size(batch_size).build().with_path(path)?;
    let schema = reader.schema().as_ref().clone();
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_path(path)?;
    Ok((schema, batches))
}

/// Build a projection mask for the requested root columns
fn create_projection(
    columns: &[&str],
    file_schema: &Schema,
    parquet_schema: &parquet::schema::types::SchemaDescriptor,
    source: &str,
) -> Result<ProjectionMask> {
    let missing = columns
        .iter()
        .filter(|c| file_schema.index_of(c).is_err())
        .collect_vec();
    if !missing.is_empty() {
        return Err(ReconError::schema(
            source,
            format!("expected column(s) absent: {}", missing.iter().join(", ")),
        ));
    }

    let roots = columns
        .iter()
        .filter_map(|c| file_schema.index_of(c).ok())
        .sorted()
        .dedup()
        .collect_vec();
    Ok(ProjectionMask::roots(parquet_schema, roots))
}

/// Read a Parquet file, or a directory of part files, into one table
pub fn read_parquet(
    name: &str,
    path: &Path,
    columns: Option<&[&str]>,
    batch_size: usize,
) -> Result<Table> {
    let start = Instant::now();
    log_operation_start("Reading", path);

    let files = if path.is_dir() {
        find_parquet_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    let mut schema = None;
    let mut batches = Vec::new();
    for file in &files {
        let (file_schema, file_batches) = read_parquet_batches(file, columns, batch_size)?;
        match &schema {
            None => schema = Some(file_schema),
            Some(first) if first.fields() != file_schema.fields() => {
                return Err(ReconError::schema(
                    name,
                    format!("part file schema differs from the first part: {}", file.display()),
                ));
            }
            Some(_) => {}
        }
        batches.extend(file_batches);
    }

    let schema = std::sync::Arc::new(schema.ok_or_else(|| {
        ReconError::schema(name, "no parquet files found for input")
    })?);
    let batch = concat_batches(&schema, &batches)?;

    // Column order follows the request, not the file
    let table = Table::new(name, batch);
    let table = match columns {
        Some(columns) => table.select(columns)?,
        None => table,
    };

    log_operation_complete("read", path, table.num_rows(), Some(start.elapsed()));
    Ok(table)
}

/// Find all Parquet files in a directory, sorted by file name
pub fn find_parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    validate_directory(dir, "loading parquet part files")?;

    let files = std::fs::read_dir(dir)
        .with_path(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => {
                let path = entry.path();
                (path.is_file() && path.extension().is_some_and(|ext| ext == "parquet"))
                    .then_some(Ok(path))
            }
            Err(e) => Some(Err(ReconError::from(e).with_path(dir))),
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .sorted()
        .collect_vec();

    if files.is_empty() {
        log_warning("No Parquet files found in directory", Some(dir));
    }
    Ok(files)
}

/// A named input with an optional column projection
#[derive(Debug, Clone, Copy)]
pub struct InputSpec<'a> {
    pub name: &'a str,
    pub columns: Option<&'a [&'a str]>,
}

impl<'a> InputSpec<'a> {
    #[must_use]
    pub fn all(name: &'a str) -> Self {
        Self { name, columns: None }
    }

    #[must_use]
    pub fn columns(name: &'a str, columns: &'a [&'a str]) -> Self {
        Self {
            name,
            columns: Some(columns),
        }
    }
}

/// Resolve the on-disk location of a named input
#[must_use]
pub fn resolve_input(config: &PipelineConfig, name: &str) -> PathBuf {
    let dir = config.input_dir.join(name);
    if dir.is_dir() {
        dir
    } else {
        config.input_path(name)
    }
}

/// Load one named input extract
pub fn load_input(config: &PipelineConfig, spec: InputSpec<'_>) -> Result<Table> {
    let path = resolve_input(config, spec.name);
    read_parquet(spec.name, &path, spec.columns, config.batch_size)
}

/// Load several named inputs; the result order follows `specs`
pub fn load_inputs(config: &PipelineConfig, specs: &[InputSpec<'_>]) -> Result<Vec<Table>> {
    if config.parallel_loads && specs.len() > 1 {
        specs
            .par_iter()
            .map(|spec| load_input(config, *spec))
            .collect()
    } else {
        specs.iter().map(|spec| load_input(config, *spec)).collect()
    }
}
