//! Utility functions for error handling
//!
//! Helpers that turn filesystem failures into errors carrying the path and
//! the purpose of the access.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{ReconError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(not_found(format!("File not found (needed for: {purpose})")).with_path(path));
    }

    if !path.is_file() {
        return Err(
            not_found(format!("Path is not a file (expected a file for: {purpose})"))
                .with_path(path),
        );
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "Permission denied - check file permissions".to_string(),
            _ => format!("Failed to open file for {purpose}: {e}"),
        };
        ReconError::IoError(io::Error::new(e.kind(), context)).with_path(path)
    })
}

/// Check that a directory exists and is readable
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.exists() {
        return Err(
            not_found(format!("Directory not found (needed for: {purpose})")).with_path(path),
        );
    }

    if !path.is_dir() {
        return Err(
            not_found(format!("Path is not a directory (expected for: {purpose})"))
                .with_path(path),
        );
    }

    match fs::read_dir(path) {
        Ok(_) => Ok(()),
        Err(e) => Err(ReconError::IoError(io::Error::new(
            e.kind(),
            format!("Failed to access directory for {purpose}: {e}"),
        ))
        .with_path(path)),
    }
}

/// Create the parent directory of an output file if it does not exist yet
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| ReconError::from(e).with_path(parent))?;
        }
    }
    Ok(())
}

fn not_found(message: String) -> ReconError {
    ReconError::IoError(io::Error::new(io::ErrorKind::NotFound, message))
}
