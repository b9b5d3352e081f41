use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use chrono::NaiveDate;
use cis_recon::writer::write_parquet;
use cis_recon::{PipelineConfig, Table};
use tempfile::TempDir;

/// Text column from optional values
#[must_use]
pub fn strings(values: &[Option<&str>]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

/// Text column without nulls
#[must_use]
pub fn texts(values: &[&str]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

#[must_use]
pub fn ints(values: &[Option<i64>]) -> ArrayRef {
    Arc::new(Int64Array::from(values.to_vec()))
}

/// Build a named table from `(column, values)` pairs
#[must_use]
pub fn table(name: &str, columns: Vec<(&str, ArrayRef)>) -> Table {
    Table::from_columns(
        name,
        columns.into_iter().map(|(n, c)| (n.to_string(), c)).collect(),
    )
    .unwrap()
}

/// Column values rendered as text, nulls as `None`
#[must_use]
pub fn column_values(table: &Table, column: &str) -> Vec<Option<String>> {
    let values = table.string_column(column).unwrap();
    (0..values.len())
        .map(|i| (!values.is_null(i)).then(|| values.value(i).to_string()))
        .collect()
}

/// Multiset of rows rendered as text, for order-independent comparisons
#[must_use]
pub fn sorted_rows(table: &Table) -> Vec<Vec<Option<String>>> {
    let columns = table
        .column_names()
        .iter()
        .map(|c| column_values(table, c))
        .collect::<Vec<_>>();
    let mut rows = (0..table.num_rows())
        .map(|r| columns.iter().map(|c| c[r].clone()).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    rows.sort();
    rows
}

#[must_use]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Temporary input and output directories with a config pointing at them
pub struct Workspace {
    pub dir: TempDir,
    pub config: PipelineConfig,
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            input_dir: dir.path().join("input"),
            output_dir: dir.path().join("output"),
            preview_rows: 0,
            ..PipelineConfig::default()
        };
        Self { dir, config }
    }

    /// Write a fixture extract as `<input_dir>/<name>.parquet`
    pub fn add_input(&self, name: &str, table: &Table) {
        write_parquet(table, &self.config.input_path(name)).unwrap();
    }

    #[must_use]
    pub fn output(&self, file_name: &str) -> std::path::PathBuf {
        self.config.output_path(file_name)
    }

    #[must_use]
    pub fn read_output(&self, file_name: &str) -> String {
        std::fs::read_to_string(self.output(file_name)).unwrap()
    }

    /// Whether any `*.tmp` file was left behind in the output directory
    #[must_use]
    pub fn has_temp_files(&self) -> bool {
        leftover_temp_files(&self.config.output_dir)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

fn leftover_temp_files(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(std::result::Result::ok)
                .any(|e| e.path().extension().is_some_and(|x| x == "tmp"))
        })
        .unwrap_or(false)
}
