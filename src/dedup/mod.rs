//! Key-based deduplication.
//!
//! Rows are grouped by the row encoding of their key columns. Null key values
//! compare equal to each other, so rows with null keys deduplicate together.
//! Retained rows keep their relative input order.

use arrow::array::{ArrayRef, UInt32Array};
use arrow::row::{RowConverter, SortField};
use itertools::Itertools;
use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::table::{SortKey, Table};

/// Which row of a duplicate group is kept
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Retention {
    /// First row in input order
    #[default]
    First,
    /// Last row in input order
    Last,
    /// Row with the greatest value of the given columns; ties keep the first
    LatestBy(Vec<String>),
}

/// Result of a deduplication that also reports what was removed
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    /// One row per distinct key
    pub unique: Table,
    /// Every input row that was not retained, in input order
    pub duplicates: Table,
}

/// One row per distinct key
pub fn unique(table: &Table, keys: &[&str], retention: &Retention) -> Result<Table> {
    let (retained, _) = partition(table, keys, retention)?;
    table.take_rows(&UInt32Array::from(retained))
}

/// Deduplicate and return both the retained and the removed rows
pub fn dedup_with_diff(table: &Table, keys: &[&str], retention: &Retention) -> Result<DedupOutcome> {
    let (retained, removed) = partition(table, keys, retention)?;
    let outcome = DedupOutcome {
        unique: table.take_rows(&UInt32Array::from(retained))?,
        duplicates: table.take_rows(&UInt32Array::from(removed))?,
    };
    log::info!(
        "{}: {} unique and {} duplicate rows on {}",
        table.name(),
        outcome.unique.num_rows(),
        outcome.duplicates.num_rows(),
        if keys.is_empty() { "all columns".to_string() } else { keys.join(",") }
    );
    Ok(outcome)
}

/// Split row positions into retained and removed, both ascending
fn partition(table: &Table, keys: &[&str], retention: &Retention) -> Result<(Vec<u32>, Vec<u32>)> {
    let rows = table.num_rows();
    if rows == 0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let key_names = if keys.is_empty() {
        table.column_names()
    } else {
        keys.iter().map(ToString::to_string).collect_vec()
    };
    if key_names.is_empty() {
        // No columns at all: every row is identical
        return Ok((vec![0], (1..rows as u32).collect()));
    }

    let columns: Vec<ArrayRef> = key_names
        .iter()
        .map(|k| table.column(k).cloned())
        .collect::<Result<_>>()?;
    let fields = columns
        .iter()
        .map(|c| SortField::new(c.data_type().clone()))
        .collect_vec();
    let converter = RowConverter::new(fields)?;
    let encoded = converter.convert_columns(&columns)?;

    // Visiting order decides which member of a group is seen first
    let order: Vec<u32> = match retention {
        Retention::First => (0..rows as u32).collect(),
        Retention::Last => (0..rows as u32).rev().collect(),
        Retention::LatestBy(columns) => {
            let sort_keys = columns.iter().map(|c| SortKey::desc(c)).collect_vec();
            table.sorted_indices(&sort_keys)?
        }
    };

    let mut seen = FxHashSet::default();
    let mut keep = vec![false; rows];
    for &row in &order {
        if seen.insert(encoded.row(row as usize)) {
            keep[row as usize] = true;
        }
    }

    let (retained, removed): (Vec<u32>, Vec<u32>) =
        (0..rows as u32).partition(|&row| keep[row as usize]);
    Ok((retained, removed))
}
