//! Two-sided match classification.
//!
//! Given whether a record matched a reference set on each of two keys, the
//! pair `(MATCHID, RHOLD_IND)` records which sides matched.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, StringArray};

use crate::error::Result;
use crate::table::Table;

/// Which sides of a two-key lookup matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchClass {
    Both,
    LeftOnly,
    RightOnly,
    Neither,
}

impl MatchClass {
    /// Classify a pair of match flags; `None` and `Some(false)` both mean no match
    #[must_use]
    pub fn of(left: Option<bool>, right: Option<bool>) -> Self {
        match (left == Some(true), right == Some(true)) {
            (true, true) => Self::Both,
            (true, false) => Self::LeftOnly,
            (false, true) => Self::RightOnly,
            (false, false) => Self::Neither,
        }
    }

    /// Match identifier code
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Both => "B",
            Self::LeftOnly => "N",
            Self::RightOnly => "O",
            Self::Neither => "X",
        }
    }

    /// Indicator flag: `Y` when either side matched
    #[must_use]
    pub fn indicator(self) -> &'static str {
        match self {
            Self::Neither => "N",
            _ => "Y",
        }
    }
}

/// `(match id, indicator)` for a pair of match flags
#[must_use]
pub fn match_type(left: Option<bool>, right: Option<bool>) -> (&'static str, &'static str) {
    let class = MatchClass::of(left, right);
    (class.id(), class.indicator())
}

/// Read a flag column: booleans as-is, any other type matches when non-null
fn flags(column: &ArrayRef) -> Vec<Option<bool>> {
    match column.as_any().downcast_ref::<BooleanArray>() {
        Some(bools) => bools.iter().collect(),
        None => (0..column.len())
            .map(|row| column.is_valid(row).then_some(true))
            .collect(),
    }
}

/// Add `MATCHID` and `RHOLD_IND` from two flag columns
pub fn add_match_columns(table: &Table, left_flag: &str, right_flag: &str) -> Result<Table> {
    let left = flags(table.column(left_flag)?);
    let right = flags(table.column(right_flag)?);

    let (ids, indicators): (Vec<&str>, Vec<&str>) = left
        .iter()
        .zip(&right)
        .map(|(l, r)| match_type(*l, *r))
        .unzip();

    table
        .with_column("MATCHID", Arc::new(StringArray::from(ids)))?
        .with_column("RHOLD_IND", Arc::new(StringArray::from(indicators)))
}
