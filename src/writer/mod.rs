//! Output writers.
//!
//! Every writer produces its file under a temporary name and renames it into
//! place once complete, so a failed run never leaves a truncated output that
//! looks finished.

pub mod delimited;
pub mod fixed_width;
pub mod parquet_file;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, Float32Array, Float64Array};
use arrow::datatypes::DataType;
use arrow::util::display::{ArrayFormatter, FormatOptions};

use crate::config::PipelineConfig;
use crate::error::util::ensure_parent_dir;
use crate::error::{PathContext, Result};
use crate::table::Table;

pub use delimited::{DelimitedOptions, QuoteMode, write_delimited};
pub use fixed_width::{Align, FieldSource, FieldSpec, FixedWidthLayout, write_fixed_width};
pub use parquet_file::write_parquet;

/// A file written by a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// Temporary sibling of an output path
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write a text file through a buffered writer, then move it into place
pub(crate) fn write_atomically(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<()>,
) -> Result<()> {
    ensure_parent_dir(path)?;
    let tmp = temp_path(path);
    let file = File::create(&tmp).with_path(&tmp)?;
    let mut out = BufWriter::new(file);
    let result = write(&mut out).and_then(|()| out.flush().with_path(&tmp));
    if let Err(e) = result {
        // Best effort; the write error is what matters
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    drop(out);
    std::fs::rename(&tmp, path).with_path(path)
}

/// Text rendering of one column for flat-file output
pub(crate) struct ColumnText<'a> {
    array: &'a ArrayRef,
    formatter: ArrayFormatter<'a>,
    float_precision: Option<usize>,
}

impl<'a> ColumnText<'a> {
    pub(crate) fn new(array: &'a ArrayRef, float_precision: Option<usize>) -> Result<Self> {
        let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
        Ok(Self {
            array,
            formatter,
            float_precision,
        })
    }

    /// Rendered value, or `None` for null
    pub(crate) fn get(&self, row: usize) -> Option<String> {
        if self.array.is_null(row) {
            return None;
        }
        if let Some(precision) = self.float_precision {
            match self.array.data_type() {
                DataType::Float64 => {
                    let values = self.array.as_any().downcast_ref::<Float64Array>()?;
                    return Some(format!("{:.precision$}", values.value(row)));
                }
                DataType::Float32 => {
                    let values = self.array.as_any().downcast_ref::<Float32Array>()?;
                    return Some(format!("{:.precision$}", values.value(row)));
                }
                _ => {}
            }
        }
        Some(self.formatter.value(row).to_string())
    }
}

/// Writes a job's tables according to the configured output formats
#[derive(Debug)]
pub struct OutputSet<'a> {
    config: &'a PipelineConfig,
    written: Vec<OutputFile>,
}

impl<'a> OutputSet<'a> {
    #[must_use]
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            written: Vec::new(),
        }
    }

    /// Write `<stem>.parquet` and/or `<stem>.csv` as configured
    pub fn write(&mut self, table: &Table, stem: &str) -> Result<()> {
        if self.config.write_parquet {
            self.parquet(table, &format!("{stem}.parquet"))?;
        }
        if self.config.write_csv {
            let options = DelimitedOptions {
                null_token: self.config.null_token.clone(),
                ..DelimitedOptions::default()
            };
            self.delimited(table, &format!("{stem}.csv"), &options)?;
        }
        Ok(())
    }

    /// Always write a Parquet file
    pub fn parquet(&mut self, table: &Table, file_name: &str) -> Result<()> {
        let path = self.config.output_path(file_name);
        let rows = write_parquet(table, &path)?;
        self.written.push(OutputFile { path, rows });
        Ok(())
    }

    /// Always write a delimited file
    pub fn delimited(&mut self, table: &Table, file_name: &str, options: &DelimitedOptions) -> Result<()> {
        let path = self.config.output_path(file_name);
        let rows = write_delimited(table, &path, options)?;
        self.written.push(OutputFile { path, rows });
        Ok(())
    }

    /// Always write a fixed-width file
    pub fn fixed_width(&mut self, table: &Table, file_name: &str, layout: &FixedWidthLayout) -> Result<()> {
        let path = self.config.output_path(file_name);
        let rows = write_fixed_width(table, &path, layout)?;
        self.written.push(OutputFile { path, rows });
        Ok(())
    }

    #[must_use]
    pub fn written(&self) -> &[OutputFile] {
        &self.written
    }

    #[must_use]
    pub fn finish(self) -> Vec<OutputFile> {
        self.written
    }
}
