//! Parquet output.

use std::fs::{self, File};
use std::path::Path;
use std::time::Instant;

use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

use super::temp_path;
use crate::error::util::ensure_parent_dir;
use crate::error::{PathContext, Result};
use crate::table::Table;
use crate::utils::log_operation_complete;

/// Write a table as a ZSTD-compressed Parquet file, returning the row count
pub fn write_parquet(table: &Table, path: &Path) -> Result<usize> {
    let start = Instant::now();
    ensure_parent_dir(path)?;

    let tmp = temp_path(path);
    let file = File::create(&tmp).with_path(&tmp)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .build();

    let written = (|| -> Result<()> {
        let mut writer = ArrowWriter::try_new(file, table.schema(), Some(props))?;
        writer.write(table.batch())?;
        writer.close()?;
        Ok(())
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.with_path(path));
    }
    fs::rename(&tmp, path).with_path(path)?;

    log_operation_complete("wrote", path, table.num_rows(), Some(start.elapsed()));
    Ok(table.num_rows())
}
