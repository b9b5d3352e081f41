//! Keyed joins between tables.
//!
//! Joins are hash joins on the row-encoded key columns. The right side is
//! indexed; the left side is scanned in order, so output rows follow left
//! order and, for each left row, the order of its matches on the right.
//! Null key values never match anything.

pub mod keys;

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::compute::{cast, concat, take};
use arrow::datatypes::{Field, Schema};
use arrow::row::{RowConverter, Rows, SortField};
use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::{ReconError, Result};
use crate::table::{Table, build_batch};

pub use keys::KeyFormat;

/// Default suffix for right columns whose name collides with a left column
pub const DEFAULT_SUFFIX: &str = "_right";

/// Kind of join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Every left row; unmatched rows get nulls on the right
    Left,
    /// Only matched pairs
    Inner,
    /// Left rows without a match
    Anti,
    /// Left rows with at least one match, once each
    Semi,
    /// Left join plus the unmatched right rows
    Full,
}

/// How two tables are joined
#[derive(Debug, Clone)]
pub struct JoinSpec {
    pub how: JoinType,
    pub left_on: Vec<String>,
    pub right_on: Vec<String>,
    pub suffix: String,
    pub key_format: Option<KeyFormat>,
    pub strict_keys: bool,
}

impl JoinSpec {
    /// Join on columns with the same name on both sides
    #[must_use]
    pub fn on(columns: &[&str], how: JoinType) -> Self {
        let keys = columns.iter().map(ToString::to_string).collect_vec();
        Self {
            how,
            left_on: keys.clone(),
            right_on: keys,
            suffix: DEFAULT_SUFFIX.to_string(),
            key_format: None,
            strict_keys: false,
        }
    }

    /// Join on differently named key columns
    #[must_use]
    pub fn left_right(left_on: &[&str], right_on: &[&str], how: JoinType) -> Self {
        Self {
            left_on: left_on.iter().map(ToString::to_string).collect(),
            right_on: right_on.iter().map(ToString::to_string).collect(),
            ..Self::on(&[], how)
        }
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = suffix.to_string();
        self
    }

    /// Audit text keys against a format before joining
    #[must_use]
    pub fn with_key_format(mut self, format: KeyFormat, strict: bool) -> Self {
        self.key_format = Some(format);
        self.strict_keys = strict;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.left_on.is_empty() || self.left_on.len() != self.right_on.len() {
            return Err(ReconError::RuleError(format!(
                "join needs the same non-zero number of keys on each side, got {:?} and {:?}",
                self.left_on, self.right_on
            )));
        }
        Ok(())
    }
}

/// Join two tables
pub fn join(left: &Table, right: &Table, spec: &JoinSpec) -> Result<Table> {
    spec.validate()?;
    let keys = keys::unify_keys(left, right, &spec.left_on, &spec.right_on)?;
    if let Some(format) = spec.key_format {
        keys::check_key_format(left, &spec.left_on, &keys.left, format, spec.strict_keys)?;
        keys::check_key_format(right, &spec.right_on, &keys.right, format, spec.strict_keys)?;
    }

    let fields = keys
        .left
        .iter()
        .map(|k| SortField::new(k.data_type().clone()))
        .collect_vec();
    let converter = RowConverter::new(fields)?;
    let left_rows = converter.convert_columns(&keys.left)?;
    let right_rows = converter.convert_columns(&keys.right)?;
    let left_valid = valid_key_rows(&keys.left, left.num_rows());
    let right_valid = valid_key_rows(&keys.right, right.num_rows());

    let index = build_index(&right_rows, &right_valid);
    let matches_of = |row: usize| -> Option<&SmallVec<[u32; 1]>> {
        if left_valid[row] {
            index.get(&left_rows.row(row))
        } else {
            None
        }
    };

    let result = match spec.how {
        JoinType::Semi | JoinType::Anti => {
            let keep_matched = spec.how == JoinType::Semi;
            let indices: UInt32Array = (0..left.num_rows())
                .filter(|&row| matches_of(row).is_some() == keep_matched)
                .map(|row| row as u32)
                .collect();
            left.take_rows(&indices)?
        }
        JoinType::Inner | JoinType::Left | JoinType::Full => {
            let keep_unmatched = spec.how != JoinType::Inner;
            let mut left_idx: Vec<Option<u32>> = Vec::with_capacity(left.num_rows());
            let mut right_idx: Vec<Option<u32>> = Vec::with_capacity(left.num_rows());
            let mut matched_right = FxHashSet::default();
            for row in 0..left.num_rows() {
                match matches_of(row) {
                    Some(matches) => {
                        for &r in matches {
                            left_idx.push(Some(row as u32));
                            right_idx.push(Some(r));
                            matched_right.insert(r);
                        }
                    }
                    None if keep_unmatched => {
                        left_idx.push(Some(row as u32));
                        right_idx.push(None);
                    }
                    None => {}
                }
            }

            let mut right_only = Vec::new();
            if spec.how == JoinType::Full {
                right_only = (0..right.num_rows() as u32)
                    .filter(|r| !matched_right.contains(r))
                    .collect_vec();
                left_idx.extend(std::iter::repeat_n(None, right_only.len()));
                right_idx.extend(right_only.iter().map(|&r| Some(r)));
            }

            assemble(left, right, spec, &left_idx, &right_idx, &right_only)?
        }
    };

    log::debug!(
        "{:?} join {} ({} rows) with {} ({} rows) on {:?}: {} rows",
        spec.how,
        left.name(),
        left.num_rows(),
        right.name(),
        right.num_rows(),
        spec.left_on,
        result.num_rows()
    );
    Ok(result)
}

/// Rows whose key columns are all non-null
fn valid_key_rows(keys: &[ArrayRef], rows: usize) -> Vec<bool> {
    (0..rows)
        .map(|row| keys.iter().all(|k| k.is_valid(row)))
        .collect()
}

fn build_index<'a>(rows: &'a Rows, valid: &[bool]) -> FxHashMap<arrow::row::Row<'a>, SmallVec<[u32; 1]>> {
    let mut index: FxHashMap<_, SmallVec<[u32; 1]>> = FxHashMap::default();
    for (i, row) in rows.iter().enumerate() {
        if valid[i] {
            index.entry(row).or_default().push(i as u32);
        }
    }
    index
}

/// Build the joined table from paired row positions
fn assemble(
    left: &Table,
    right: &Table,
    spec: &JoinSpec,
    left_idx: &[Option<u32>],
    right_idx: &[Option<u32>],
    right_only: &[u32],
) -> Result<Table> {
    let left_take = UInt32Array::from(left_idx.to_vec());
    let right_take = UInt32Array::from(right_idx.to_vec());
    let matched_len = left_idx.len() - right_only.len();

    let left_schema = left.schema();
    let right_schema = right.schema();
    let mut fields: Vec<Field> = Vec::with_capacity(left.num_columns() + right.num_columns());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());
    let mut names: FxHashSet<String> = FxHashSet::default();

    for (field, column) in left_schema.fields().iter().zip(left.batch().columns()) {
        let key_pos = spec.left_on.iter().position(|k| k == field.name());
        let array = match key_pos {
            // Unmatched right rows of a full join carry their own key values
            Some(pos) if !right_only.is_empty() => {
                let head = take(column.as_ref(), &left_take.slice(0, matched_len), None)?;
                let right_key = right.column(&spec.right_on[pos])?;
                let tail = take(right_key.as_ref(), &UInt32Array::from(right_only.to_vec()), None)?;
                let tail = cast(&tail, column.data_type())?;
                concat(&[head.as_ref(), tail.as_ref()])?
            }
            _ => take(column.as_ref(), &left_take, None)?,
        };
        names.insert(field.name().clone());
        fields.push(field.as_ref().clone().with_nullable(true));
        columns.push(array);
    }

    for (field, column) in right_schema.fields().iter().zip(right.batch().columns()) {
        if spec.right_on.contains(field.name()) {
            continue;
        }
        let mut name = field.name().clone();
        if names.contains(&name) {
            name = format!("{name}{}", spec.suffix);
        }
        if !names.insert(name.clone()) {
            return Err(ReconError::schema(
                right.name(),
                format!("joined column '{name}' already exists after applying suffix"),
            ));
        }
        fields.push(Field::new(name, field.data_type().clone(), true));
        columns.push(take(column.as_ref(), &right_take, None)?);
    }

    let batch = build_batch(left.name(), Arc::new(Schema::new(fields)), columns, left_idx.len())?;
    Ok(Table::new(left.name(), batch))
}

/// A sequence of joins onto a base table, logging row counts per step
#[derive(Debug)]
pub struct JoinChain {
    label: String,
    table: Table,
    step: usize,
}

impl JoinChain {
    #[must_use]
    pub fn new(label: &str, base: Table) -> Self {
        Self {
            label: label.to_string(),
            table: base,
            step: 0,
        }
    }

    /// Join the current table with `right`
    pub fn join(mut self, right: &Table, spec: &JoinSpec) -> Result<Self> {
        let before = self.table.num_rows();
        self.table = join(&self.table, right, spec)?;
        self.step += 1;
        log::info!(
            "{}{:02}: {:?} join with {} on {:?}: {} -> {} rows",
            self.label,
            self.step,
            spec.how,
            right.name(),
            spec.left_on,
            before,
            self.table.num_rows()
        );
        Ok(self)
    }

    /// Apply a non-join step to the current table
    pub fn then(mut self, f: impl FnOnce(&Table) -> Result<Table>) -> Result<Self> {
        self.table = f(&self.table)?;
        Ok(self)
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn finish(self) -> Table {
        self.table
    }
}
