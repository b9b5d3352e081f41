//! Configuration for pipeline runs.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::util::safe_open_file;
use crate::error::{ReconError, Result};

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Width that customer and account numbers are zero-padded to
pub const DEFAULT_KEY_WIDTH: usize = 11;

/// Configuration shared by every job
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the `<NAME>.parquet` source extracts
    pub input_dir: PathBuf,
    /// Directory the job outputs are written to
    pub output_dir: PathBuf,
    /// Date that expiry fields are compared against (defaults to today)
    pub control_date: Option<NaiveDate>,
    /// Fixed width of padded customer/account numbers
    pub key_width: usize,
    /// Fail instead of warn when a join key does not have the padded representation
    pub strict_keys: bool,
    /// Load independent input tables on the rayon pool
    pub parallel_loads: bool,
    /// Rows per record batch when reading Parquet
    pub batch_size: usize,
    /// Rows shown in debug previews of intermediate tables
    pub preview_rows: usize,
    /// Write the Parquet rendition of each output
    pub write_parquet: bool,
    /// Write the delimited text rendition of each output
    pub write_csv: bool,
    /// Token written for nulls in delimited output
    pub null_token: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            control_date: None,
            key_width: DEFAULT_KEY_WIDTH,
            strict_keys: false,
            parallel_loads: true,
            batch_size: DEFAULT_BATCH_SIZE,
            preview_rows: 5,
            write_parquet: true,
            write_csv: true,
            null_token: String::new(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = safe_open_file(path, "pipeline configuration")?;
        let config: Self =
            serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| {
                ReconError::from(e).with_path(path)
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CIS_*` environment variable overrides
    pub fn apply_env_overrides(mut self) -> Result<Self> {
        if let Ok(dir) = std::env::var("CIS_INPUT_DIR") {
            self.input_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("CIS_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Ok(date) = std::env::var("CIS_CONTROL_DATE") {
            self.control_date = Some(parse_control_date(&date)?);
        }
        if let Some(size) = get_batch_size() {
            self.batch_size = size;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values no job can run with
    pub fn validate(&self) -> Result<()> {
        if self.key_width == 0 {
            return Err(ReconError::ConfigError("key_width must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(ReconError::ConfigError("batch_size must be positive".into()));
        }
        if !self.write_parquet && !self.write_csv {
            log::warn!("Both write_parquet and write_csv are disabled; only fixed-width outputs will be written");
        }
        Ok(())
    }

    /// Path of a named input extract
    #[must_use]
    pub fn input_path(&self, name: &str) -> PathBuf {
        self.input_dir.join(format!("{name}.parquet"))
    }

    /// Path of an output file
    #[must_use]
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

/// Helper function to get batch size from environment
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var("CIS_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Parse a control date given as `YYYY-MM-DD` or `YYYYMMDD`
pub fn parse_control_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .map_err(|e| ReconError::ConfigError(format!("Invalid control date '{value}': {e}")))
}
