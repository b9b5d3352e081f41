//! Stable multi-column sorting.

use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::SortOptions;
use arrow::row::{RowConverter, SortField};

use super::Table;
use crate::error::Result;

/// One column of a sort order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    #[must_use]
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            descending: false,
        }
    }

    #[must_use]
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            descending: true,
        }
    }
}

impl Table {
    /// Sort rows by the given keys, nulls last; equal keys keep input order
    pub fn sort_by(&self, keys: &[SortKey]) -> Result<Self> {
        if keys.is_empty() || self.num_rows() < 2 {
            return Ok(self.clone());
        }
        let indices = self.sorted_indices(keys)?;
        self.take_rows(&UInt32Array::from(indices))
    }

    /// Shorthand for an ascending sort on column names
    pub fn sort_asc(&self, columns: &[&str]) -> Result<Self> {
        let keys: Vec<SortKey> = columns.iter().map(|c| SortKey::asc(c)).collect();
        self.sort_by(&keys)
    }

    /// Row positions in sorted order
    pub(crate) fn sorted_indices(&self, keys: &[SortKey]) -> Result<Vec<u32>> {
        let mut fields = Vec::with_capacity(keys.len());
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(keys.len());
        for key in keys {
            let column = self.column(&key.column)?;
            fields.push(SortField::new_with_options(
                column.data_type().clone(),
                SortOptions {
                    descending: key.descending,
                    nulls_first: false,
                },
            ));
            columns.push(column.clone());
        }

        let converter = RowConverter::new(fields)?;
        let rows = converter.convert_columns(&columns)?;

        let mut indices: Vec<u32> = (0..self.num_rows() as u32).collect();
        // `sort_by` is stable, so ties keep their input order
        indices.sort_by(|&a, &b| rows.row(a as usize).cmp(&rows.row(b as usize)));
        Ok(indices)
    }
}
