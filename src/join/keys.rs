//! Join key validation.
//!
//! Keys on the two sides must belong to the same type family. Text keys may
//! additionally be audited for the fixed-width digit representation that
//! customer and account numbers are normalized to.

use arrow::array::{Array, ArrayRef};
use arrow::compute::cast;
use arrow::datatypes::DataType;

use crate::error::{ReconError, Result};
use crate::table::Table;

/// Expected representation of text join keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    /// Exactly this many ASCII digits
    Digits(usize),
}

impl KeyFormat {
    /// Whether a key value has this representation
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Digits(width) => value.len() == *width && value.bytes().all(|b| b.is_ascii_digit()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Digits(width) => format!("not {width} digits"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Text,
    Integer,
    Float,
    Date,
    Boolean,
}

impl KeyFamily {
    fn of(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Some(Self::Text),
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => Some(Self::Integer),
            DataType::Float32 | DataType::Float64 => Some(Self::Float),
            DataType::Date32 | DataType::Date64 => Some(Self::Date),
            DataType::Boolean => Some(Self::Boolean),
            _ => None,
        }
    }

    fn canonical(self) -> DataType {
        match self {
            Self::Text => DataType::Utf8,
            Self::Integer => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::Date => DataType::Date32,
            Self::Boolean => DataType::Boolean,
        }
    }
}

/// Key columns of both sides cast to a common type per key pair
#[derive(Debug)]
pub(crate) struct UnifiedKeys {
    pub left: Vec<ArrayRef>,
    pub right: Vec<ArrayRef>,
}

/// Check that each key pair has compatible types and cast both sides alike
pub(crate) fn unify_keys(
    left: &Table,
    right: &Table,
    left_on: &[String],
    right_on: &[String],
) -> Result<UnifiedKeys> {
    let mut unified = UnifiedKeys {
        left: Vec::with_capacity(left_on.len()),
        right: Vec::with_capacity(right_on.len()),
    };

    for (l, r) in left_on.iter().zip(right_on) {
        let left_col = left.column(l)?;
        let right_col = right.column(r)?;
        let mismatch = || ReconError::KeyTypeMismatch {
            left: format!("{}.{l}", left.name()),
            right: format!("{}.{r}", right.name()),
            left_type: left_col.data_type().to_string(),
            right_type: right_col.data_type().to_string(),
        };

        let left_family = KeyFamily::of(left_col.data_type());
        let right_family = KeyFamily::of(right_col.data_type());
        let family = match (left_family, right_family) {
            (Some(a), Some(b)) if a == b => a,
            // An all-null side carries no type information
            _ if right_col.data_type() == &DataType::Null => left_family.ok_or_else(mismatch)?,
            _ if left_col.data_type() == &DataType::Null => right_family.ok_or_else(mismatch)?,
            _ => return Err(mismatch()),
        };

        let target = family.canonical();
        unified.left.push(cast(left_col, &target)?);
        unified.right.push(cast(right_col, &target)?);
    }
    Ok(unified)
}

/// Audit text keys against a format
///
/// Returns the number of non-null values that do not match. In strict mode
/// any violation is an error; otherwise it is logged.
pub(crate) fn check_key_format(
    table: &Table,
    columns: &[String],
    keys: &[ArrayRef],
    format: KeyFormat,
    strict: bool,
) -> Result<usize> {
    let mut total = 0;
    for (column, key) in columns.iter().zip(keys) {
        let Some(values) = key.as_any().downcast_ref::<arrow::array::StringArray>() else {
            continue;
        };
        let mut invalid = 0usize;
        let mut sample = None;
        for value in values.iter().flatten() {
            if !format.matches(value) {
                invalid += 1;
                sample.get_or_insert(value);
            }
        }
        if invalid == 0 {
            continue;
        }
        let error = ReconError::KeyFormatError {
            table: table.name().to_string(),
            column: column.clone(),
            expected: format.describe(),
            invalid,
            sample: sample.unwrap_or_default().to_string(),
        };
        if strict {
            return Err(error);
        }
        log::warn!("{error}");
        total += invalid;
    }
    Ok(total)
}
