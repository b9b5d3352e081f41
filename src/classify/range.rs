//! Inclusive numeric range lookup tables.

use std::sync::Arc;

use arrow::array::{Array, StringArray};
use itertools::Itertools;

use crate::error::{ReconError, Result};
use crate::table::Table;

/// One inclusive range and the label it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub low: u64,
    pub high: u64,
    pub label: String,
}

/// Ordered, pairwise-disjoint ranges mapping a number to a label
#[derive(Debug, Clone)]
pub struct RangeTable {
    name: String,
    ranges: Vec<Range>,
}

impl RangeTable {
    /// Build a table, rejecting inverted or overlapping ranges
    pub fn new(name: &str, ranges: &[(u64, u64, &str)]) -> Result<Self> {
        let ranges = ranges
            .iter()
            .map(|&(low, high, label)| Range {
                low,
                high,
                label: label.to_string(),
            })
            .collect_vec();

        if let Some(bad) = ranges.iter().find(|r| r.low > r.high) {
            return Err(ReconError::RuleError(format!(
                "range table {name}: range {}..={} for {} has low > high",
                bad.low, bad.high, bad.label
            )));
        }

        let sorted = ranges.iter().sorted_by_key(|r| r.low).collect_vec();
        for (a, b) in sorted.iter().tuple_windows() {
            if b.low <= a.high {
                return Err(ReconError::RuleError(format!(
                    "range table {name}: {}..={} ({}) overlaps {}..={} ({})",
                    a.low, a.high, a.label, b.low, b.high, b.label
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            ranges,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// Label of the range containing a number
    #[must_use]
    pub fn lookup(&self, value: u64) -> Option<&str> {
        self.ranges
            .iter()
            .find(|r| r.low <= value && value <= r.high)
            .map(|r| r.label.as_str())
    }

    /// Classify a text value; non-numeric text has no label
    #[must_use]
    pub fn classify(&self, value: &str) -> Option<&str> {
        let digits = value.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u64>().ok().and_then(|n| self.lookup(n))
    }

    /// Add `target` with the label of each `source` value
    ///
    /// Unmatched rows take the value of `fallback` when given, else null.
    pub fn classify_column(
        &self,
        table: &Table,
        source: &str,
        target: &str,
        fallback: Option<&str>,
    ) -> Result<Table> {
        let values = table.string_column(source)?;
        let fallback = fallback.map(|c| table.string_column(c)).transpose()?;

        let labels: StringArray = (0..values.len())
            .map(|row| {
                let label = (!values.is_null(row))
                    .then(|| self.classify(values.value(row)))
                    .flatten();
                match (label, &fallback) {
                    (Some(label), _) => Some(label.to_string()),
                    (None, Some(fb)) if !fb.is_null(row) => Some(fb.value(row).to_string()),
                    (None, _) => None,
                }
            })
            .collect();

        let matched = labels.len() - labels.null_count();
        log::debug!(
            "{}: classified {} of {} {} values into {}",
            table.name(),
            matched,
            values.len(),
            source,
            self.name
        );
        table.with_column(target, Arc::new(labels))
    }
}
