//! Core filtering functionality
//!
//! Defines the [`BatchFilter`] trait implemented by every row filter and the
//! mask application shared by all of them.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray};
use arrow::compute::filter as arrow_filter;
use arrow::record_batch::RecordBatch;

use crate::error::{ReconError, Result};
use crate::filter::expr::{Expr, definite};
use crate::table::{Table, build_batch};

/// Filter a record batch based on a boolean mask
///
/// Rows whose mask entry is false or null are dropped.
///
/// # Errors
/// Returns an error if the mask length differs from the batch row count
pub fn filter_record_batch(
    table: &str,
    batch: &RecordBatch,
    mask: &BooleanArray,
) -> Result<RecordBatch> {
    if batch.num_rows() != mask.len() {
        return Err(ReconError::schema(
            table,
            format!(
                "mask length ({}) doesn't match batch row count ({})",
                mask.len(),
                batch.num_rows()
            ),
        ));
    }

    let mask = definite(mask);
    let filtered_columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|col| arrow_filter(col, &mask))
        .collect::<std::result::Result<_, _>>()?;

    build_batch(table, batch.schema(), filtered_columns, mask.true_count())
}

/// Keep the rows of a table selected by a mask
pub fn filter_table_with_mask(table: &Table, mask: &BooleanArray) -> Result<Table> {
    let batch = filter_record_batch(table.name(), table.batch(), mask)?;
    Ok(Table::new(table.name(), batch))
}

/// Keep the rows of a table for which `expr` is true
pub fn filter_table(table: &Table, expr: &Expr) -> Result<Table> {
    let mask = expr.evaluate(table)?;
    filter_table_with_mask(table, &mask)
}

/// Trait for objects that can filter tables
pub trait BatchFilter: std::fmt::Debug {
    /// Filter a table, returning the kept rows in input order
    ///
    /// # Errors
    /// Returns an error if a required column is absent or evaluation fails
    fn filter(&self, table: &Table) -> Result<Table>;

    /// Returns the set of column names required by this filter
    fn required_columns(&self) -> HashSet<String>;
}

/// Apply multiple filters to a table in sequence
pub fn apply_filters(table: &Table, filters: &[Arc<dyn BatchFilter + Send + Sync>]) -> Result<Table> {
    let mut result = table.clone();
    for filter in filters {
        if result.num_rows() == 0 {
            break;
        }
        result = filter.filter(&result)?;
    }
    Ok(result)
}
