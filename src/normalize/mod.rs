//! Column normalization
//!
//! A normalization is an ordered list of [`ColumnOp`]s applied to a table,
//! each producing a new table. This is where identifiers are zero-padded to
//! their fixed width, codes are cast and trimmed, and derived columns such as
//! the expiry date parts are added.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Date32Array, Int32Array, Int64Array, StringArray, new_null_array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use chrono::{Datelike, NaiveDate};
use itertools::Itertools;

use crate::error::{ReconError, Result};
use crate::filter::LiteralValue;
use crate::filter::expr::EPOCH_DAYS_FROM_CE;
use crate::table::Table;

/// One normalization step
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOp {
    /// Keep only these columns, in this order
    Select(Vec<String>),
    /// Rename `(from, to)` pairs
    Rename(Vec<(String, String)>),
    /// Remove columns; absent names are ignored
    Drop(Vec<String>),
    /// Cast to text
    CastUtf8(String),
    /// Cast to a 64-bit integer; text is trimmed and unparsable values become null
    CastInt64(String),
    /// Trim and left-pad with zeros to `width`
    ZeroPad {
        column: String,
        width: usize,
        alias: Option<String>,
    },
    /// Strip surrounding whitespace
    Trim(String),
    /// Upper-case text
    Upper(String),
    /// Replace nulls with a value
    FillNull { column: String, value: LiteralValue },
    /// Character substring; `len: None` runs to the end
    Slice {
        column: String,
        start: usize,
        len: Option<usize>,
        alias: String,
    },
    /// Concatenate text columns, each optionally left-padded to `(width, pad)`
    Concat {
        columns: Vec<String>,
        alias: String,
        pad: Option<(usize, char)>,
    },
    /// Constant column
    Literal { alias: String, value: LiteralValue },
    /// Duplicate a column under a new name
    Copy { from: String, alias: String },
    /// Parse text into a date; blank or unparsable values become null
    ParseDate {
        column: String,
        format: String,
        alias: String,
    },
    /// Add `<prefix>YY`, `<prefix>MM` and `<prefix>DD` from a date column
    DateParts { column: String, prefix: String },
}

impl ColumnOp {
    #[must_use]
    pub fn select(columns: &[&str]) -> Self {
        Self::Select(columns.iter().map(ToString::to_string).collect())
    }

    #[must_use]
    pub fn rename(pairs: &[(&str, &str)]) -> Self {
        Self::Rename(
            pairs
                .iter()
                .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
                .collect(),
        )
    }

    #[must_use]
    pub fn drop(columns: &[&str]) -> Self {
        Self::Drop(columns.iter().map(ToString::to_string).collect())
    }

    /// Zero-pad a column in place
    #[must_use]
    pub fn zero_pad(column: &str, width: usize) -> Self {
        Self::ZeroPad {
            column: column.to_string(),
            width,
            alias: None,
        }
    }

    #[must_use]
    pub fn literal(alias: &str, value: &str) -> Self {
        Self::Literal {
            alias: alias.to_string(),
            value: LiteralValue::str(value),
        }
    }

    /// Apply this step to a table
    pub fn apply(&self, table: &Table) -> Result<Table> {
        match self {
            Self::Select(columns) => table.select(&as_strs(columns)),
            Self::Rename(pairs) => {
                let pairs = pairs.iter().map(|(f, t)| (f.as_str(), t.as_str())).collect_vec();
                table.rename(&pairs)
            }
            Self::Drop(columns) => table.drop(&as_strs(columns)),
            Self::CastUtf8(column) => {
                let values = table.string_column(column)?;
                table.with_column(column, Arc::new(values))
            }
            Self::CastInt64(column) => {
                let values = to_int64(table, column)?;
                table.with_column(column, Arc::new(values))
            }
            Self::ZeroPad { column, width, alias } => {
                let values = table.string_column(column)?;
                let padded = map_strings(&values, |s| Some(zfill(s.trim(), *width)));
                table.with_column(alias.as_deref().unwrap_or(column), Arc::new(padded))
            }
            Self::Trim(column) => {
                let values = table.string_column(column)?;
                table.with_column(column, Arc::new(map_strings(&values, |s| Some(s.trim().to_string()))))
            }
            Self::Upper(column) => {
                let values = table.string_column(column)?;
                table.with_column(column, Arc::new(map_strings(&values, |s| Some(s.to_uppercase()))))
            }
            Self::FillNull { column, value } => fill_null(table, column, value),
            Self::Slice {
                column,
                start,
                len,
                alias,
            } => {
                let values = table.string_column(column)?;
                let sliced = map_strings(&values, |s| {
                    let chars = s.chars().skip(*start);
                    Some(match len {
                        Some(n) => chars.take(*n).collect(),
                        None => chars.collect(),
                    })
                });
                table.with_column(alias, Arc::new(sliced))
            }
            Self::Concat { columns, alias, pad } => concat_columns(table, columns, alias, *pad),
            Self::Literal { alias, value } => {
                let array = literal_array(value, table.num_rows());
                table.with_column(alias, array)
            }
            Self::Copy { from, alias } => {
                let array = Arc::clone(table.column(from)?);
                table.with_column(alias, array)
            }
            Self::ParseDate { column, format, alias } => {
                let values = table.string_column(column)?;
                let dates: Date32Array = values
                    .iter()
                    .map(|v| {
                        v.map(str::trim)
                            .filter(|s| !s.is_empty())
                            .and_then(|s| NaiveDate::parse_from_str(s, format).ok())
                            .map(|d| d.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
                    })
                    .collect();
                table.with_column(alias, Arc::new(dates))
            }
            Self::DateParts { column, prefix } => date_parts(table, column, prefix),
        }
    }
}

/// Apply normalization steps in order
pub fn normalize(table: &Table, ops: &[ColumnOp]) -> Result<Table> {
    ops.iter().try_fold(table.clone(), |acc, op| op.apply(&acc))
}

/// Left-pad with zeros to `width`; longer values are unchanged
///
/// A leading sign stays in front of the padding.
#[must_use]
pub fn zfill(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    let zeros = "0".repeat(width - len);
    match value.strip_prefix(['-', '+']) {
        Some(rest) => format!("{}{zeros}{rest}", &value[..1]),
        None => format!("{zeros}{value}"),
    }
}

fn as_strs(columns: &[String]) -> Vec<&str> {
    columns.iter().map(String::as_str).collect()
}

/// Map each non-null string; nulls stay null
fn map_strings(values: &StringArray, f: impl Fn(&str) -> Option<String>) -> StringArray {
    values.iter().map(|v| v.and_then(&f)).collect()
}

fn to_int64(table: &Table, column: &str) -> Result<Int64Array> {
    let array = table.column(column)?;
    if matches!(array.data_type(), DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View) {
        let values = table.string_column(column)?;
        return Ok(values
            .iter()
            .map(|v| v.and_then(|s| s.trim().parse::<i64>().ok()))
            .collect());
    }
    let casted = cast(array, &DataType::Int64).map_err(|e| {
        ReconError::schema(table.name(), format!("column '{column}' cannot be cast to Int64: {e}"))
    })?;
    casted
        .as_any()
        .downcast_ref::<Int64Array>()
        .cloned()
        .ok_or_else(|| ReconError::schema(table.name(), format!("column '{column}' is not Int64")))
}

fn fill_null(table: &Table, column: &str, value: &LiteralValue) -> Result<Table> {
    let filled: ArrayRef = match value {
        LiteralValue::String(fill) => {
            let values = table.string_column(column)?;
            Arc::new(
                values
                    .iter()
                    .map(|v| Some(v.unwrap_or(fill.as_str())))
                    .collect::<StringArray>(),
            )
        }
        LiteralValue::Int(fill) => {
            let values = to_int64(table, column)?;
            Arc::new(values.iter().map(|v| Some(v.unwrap_or(*fill))).collect::<Int64Array>())
        }
        LiteralValue::Null => return Ok(table.clone()),
        other => {
            return Err(ReconError::RuleError(format!(
                "fill value {other:?} is not supported for column '{column}'"
            )));
        }
    };
    table.with_column(column, filled)
}

fn concat_columns(
    table: &Table,
    columns: &[String],
    alias: &str,
    pad: Option<(usize, char)>,
) -> Result<Table> {
    let parts = columns
        .iter()
        .map(|c| table.string_column(c))
        .collect::<Result<Vec<_>>>()?;

    let joined: StringArray = (0..table.num_rows())
        .map(|row| {
            let mut out = String::new();
            for part in &parts {
                if part.is_null(row) {
                    return None;
                }
                let value = part.value(row).trim();
                match pad {
                    Some((width, ch)) => {
                        let len = value.chars().count();
                        out.extend(std::iter::repeat_n(ch, width.saturating_sub(len)));
                        out.push_str(value);
                    }
                    None => out.push_str(value),
                }
            }
            Some(out)
        })
        .collect();
    table.with_column(alias, Arc::new(joined))
}

/// A constant column of `rows` values
pub fn literal_array(value: &LiteralValue, rows: usize) -> ArrayRef {
    match value {
        LiteralValue::String(s) => Arc::new(StringArray::from(vec![s.as_str(); rows])),
        LiteralValue::Int(n) => Arc::new(Int64Array::from(vec![*n; rows])),
        LiteralValue::Float(f) => Arc::new(arrow::array::Float64Array::from(vec![*f; rows])),
        LiteralValue::Boolean(b) => Arc::new(arrow::array::BooleanArray::from(vec![*b; rows])),
        LiteralValue::Date(d) => Arc::new(Date32Array::from(vec![*d; rows])),
        LiteralValue::Null => new_null_array(&DataType::Utf8, rows),
    }
}

fn date_parts(table: &Table, column: &str, prefix: &str) -> Result<Table> {
    let array = table.column(column)?;
    let dates = cast(array, &DataType::Date32).map_err(|e| {
        ReconError::schema(table.name(), format!("column '{column}' is not a date: {e}"))
    })?;
    let dates = dates
        .as_any()
        .downcast_ref::<Date32Array>()
        .ok_or_else(|| ReconError::schema(table.name(), format!("column '{column}' is not a date")))?;

    let as_date = |days: i32| NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE);
    let part = |f: fn(&NaiveDate) -> i32| -> Int32Array {
        dates.iter().map(|d| d.and_then(as_date).map(|d| f(&d))).collect()
    };

    let years = part(|d| d.year());
    let months = part(|d| d.month() as i32);
    let days = part(|d| d.day() as i32);

    table
        .with_column(&format!("{prefix}YY"), Arc::new(years))?
        .with_column(&format!("{prefix}MM"), Arc::new(months))?
        .with_column(&format!("{prefix}DD"), Arc::new(days))
}
