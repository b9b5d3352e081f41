//! Expression-based row predicates
//!
//! An [`Expr`] is evaluated against a [`Table`] into a [`BooleanArray`] using
//! Arrow compute kernels. Comparisons follow SQL null semantics: a comparison
//! against a null value yields null, and a null result never selects a row.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, Scalar, StringArray,
};
use arrow::compute::kernels::cmp;
use arrow::compute::{and_kleene, cast, is_null, not, or_kleene};
use arrow::datatypes::DataType;
use chrono::{Datelike, NaiveDate};
use rustc_hash::FxHashSet;

use crate::error::{ReconError, Result};
use crate::filter::core::{BatchFilter, filter_table_with_mask};
use crate::table::Table;

/// Days between 0001-01-01 and the Unix epoch
pub(crate) const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Represents a predicate over the columns of a table
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column equals a literal value
    Eq(String, LiteralValue),

    /// Column not equals a literal value
    NotEq(String, LiteralValue),

    /// Column is greater than a literal value
    Gt(String, LiteralValue),

    /// Column is greater than or equal to a literal value
    GtEq(String, LiteralValue),

    /// Column is less than a literal value
    Lt(String, LiteralValue),

    /// Column is less than or equal to a literal value
    LtEq(String, LiteralValue),

    /// Column is in a set of values
    In(String, Vec<LiteralValue>),

    /// Column is not in a set of values
    NotIn(String, Vec<LiteralValue>),

    /// Column is null
    IsNull(String),

    /// Column is not null
    IsNotNull(String),

    /// Column is null or contains only whitespace
    IsBlank(String),

    /// Column value contains a substring
    Contains(String, String),

    /// Column value contains at least one of the substrings
    ContainsAny(String, Vec<String>),

    /// Column value starts with a prefix
    StartsWith(String, String),

    /// Column value ends with a suffix
    EndsWith(String, String),

    /// Logical AND of expressions
    And(Vec<Expr>),

    /// Logical OR of expressions
    Or(Vec<Expr>),

    /// Logical NOT of an expression
    Not(Box<Expr>),

    /// Always evaluates to true
    AlwaysTrue,

    /// Always evaluates to false
    AlwaysFalse,
}

/// Represents a literal value that can be used in filter expressions
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Boolean value
    Boolean(bool),

    /// Integer value
    Int(i64),

    /// Floating point value
    Float(f64),

    /// String value
    String(String),

    /// Date value (days since epoch)
    Date(i32),

    /// Null value
    Null,
}

impl LiteralValue {
    /// A string literal
    #[must_use]
    pub fn str(value: &str) -> Self {
        Self::String(value.to_string())
    }

    /// A date literal
    #[must_use]
    pub fn date(date: NaiveDate) -> Self {
        Self::Date(date.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
    }

    /// String literals for each value
    #[must_use]
    pub fn strs(values: &[&str]) -> Vec<Self> {
        values.iter().map(|v| Self::str(v)).collect()
    }

    /// Integer literals for each value
    #[must_use]
    pub fn ints(values: &[i64]) -> Vec<Self> {
        values.iter().map(|v| Self::Int(*v)).collect()
    }

    /// The column type this literal is compared in, with its one-element array
    fn as_scalar_array(&self) -> Option<(DataType, ArrayRef)> {
        let pair: (DataType, ArrayRef) = match self {
            Self::Boolean(b) => (DataType::Boolean, Arc::new(BooleanArray::from(vec![*b]))),
            Self::Int(n) => (DataType::Int64, Arc::new(Int64Array::from(vec![*n]))),
            Self::Float(f) => (DataType::Float64, Arc::new(Float64Array::from(vec![*f]))),
            Self::String(s) => (DataType::Utf8, Arc::new(StringArray::from(vec![s.as_str()]))),
            Self::Date(d) => (DataType::Date32, Arc::new(Date32Array::from(vec![*d]))),
            Self::Null => return None,
        };
        Some(pair)
    }
}

#[derive(Debug, Clone, Copy)]
enum CmpOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl Expr {
    /// `column == value`
    #[must_use]
    pub fn eq(column: &str, value: LiteralValue) -> Self {
        Self::Eq(column.to_string(), value)
    }

    /// `column == "value"`
    #[must_use]
    pub fn eq_str(column: &str, value: &str) -> Self {
        Self::Eq(column.to_string(), LiteralValue::str(value))
    }

    /// `column in values`
    #[must_use]
    pub fn in_strs(column: &str, values: &[&str]) -> Self {
        Self::In(column.to_string(), LiteralValue::strs(values))
    }

    #[must_use]
    pub fn is_blank(column: &str) -> Self {
        Self::IsBlank(column.to_string())
    }

    #[must_use]
    pub fn is_null(column: &str) -> Self {
        Self::IsNull(column.to_string())
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Returns a set of all column names required by this expression
    #[must_use]
    pub fn required_columns(&self) -> HashSet<String> {
        let mut columns = HashSet::new();
        self.collect_required_columns(&mut columns);
        columns
    }

    fn collect_required_columns(&self, columns: &mut HashSet<String>) {
        match self {
            Self::Eq(col, _)
            | Self::NotEq(col, _)
            | Self::Gt(col, _)
            | Self::GtEq(col, _)
            | Self::Lt(col, _)
            | Self::LtEq(col, _)
            | Self::In(col, _)
            | Self::NotIn(col, _)
            | Self::IsNull(col)
            | Self::IsNotNull(col)
            | Self::IsBlank(col)
            | Self::Contains(col, _)
            | Self::ContainsAny(col, _)
            | Self::StartsWith(col, _)
            | Self::EndsWith(col, _) => {
                columns.insert(col.clone());
            }
            Self::And(exprs) | Self::Or(exprs) => {
                for expr in exprs {
                    expr.collect_required_columns(columns);
                }
            }
            Self::Not(expr) => expr.collect_required_columns(columns),
            Self::AlwaysTrue | Self::AlwaysFalse => {}
        }
    }

    /// Evaluate against a table; the result may contain nulls
    pub fn evaluate(&self, table: &Table) -> Result<BooleanArray> {
        let rows = table.num_rows();
        match self {
            Self::AlwaysTrue => Ok(BooleanArray::from(vec![true; rows])),
            Self::AlwaysFalse => Ok(BooleanArray::from(vec![false; rows])),

            Self::And(exprs) => {
                let mut result = BooleanArray::from(vec![true; rows]);
                for expr in exprs {
                    result = and_kleene(&result, &expr.evaluate(table)?)?;
                }
                Ok(result)
            }
            Self::Or(exprs) => {
                let mut result = BooleanArray::from(vec![false; rows]);
                for expr in exprs {
                    result = or_kleene(&result, &expr.evaluate(table)?)?;
                }
                Ok(result)
            }
            Self::Not(expr) => Ok(not(&expr.evaluate(table)?)?),

            Self::Eq(col, value) => compare(table, col, value, CmpOp::Eq),
            Self::NotEq(col, value) => compare(table, col, value, CmpOp::NotEq),
            Self::Gt(col, value) => compare(table, col, value, CmpOp::Gt),
            Self::GtEq(col, value) => compare(table, col, value, CmpOp::GtEq),
            Self::Lt(col, value) => compare(table, col, value, CmpOp::Lt),
            Self::LtEq(col, value) => compare(table, col, value, CmpOp::LtEq),

            Self::In(col, values) => evaluate_in(table, col, values),
            Self::NotIn(col, values) => Ok(not(&evaluate_in(table, col, values)?)?),

            Self::IsNull(col) => Ok(is_null(table.column(col)?.as_ref())?),
            Self::IsNotNull(col) => Ok(not(&is_null(table.column(col)?.as_ref())?)?),
            Self::IsBlank(col) => {
                let values = table.string_column(col)?;
                Ok(values
                    .iter()
                    .map(|v| Some(v.is_none_or(|s| s.trim().is_empty())))
                    .collect())
            }

            Self::Contains(col, needle) => string_predicate(table, col, |s| s.contains(needle.as_str())),
            Self::ContainsAny(col, needles) => {
                string_predicate(table, col, |s| needles.iter().any(|n| s.contains(n.as_str())))
            }
            Self::StartsWith(col, prefix) => {
                string_predicate(table, col, |s| s.starts_with(prefix.as_str()))
            }
            Self::EndsWith(col, suffix) => string_predicate(table, col, |s| s.ends_with(suffix.as_str())),
        }
    }

    /// Evaluate into a mask with nulls treated as not matched
    pub fn evaluate_mask(&self, table: &Table) -> Result<BooleanArray> {
        Ok(definite(&self.evaluate(table)?))
    }
}

/// Replace null mask entries with `false`
pub(crate) fn definite(mask: &BooleanArray) -> BooleanArray {
    if mask.null_count() == 0 {
        return mask.clone();
    }
    mask.iter().map(|v| Some(v == Some(true))).collect()
}

/// Cast a column for comparison, reporting the column on failure
fn cast_column(table: &Table, column: &str, to: &DataType) -> Result<ArrayRef> {
    let array = table.column(column)?;
    if array.data_type() == to {
        return Ok(Arc::clone(array));
    }
    cast(array, to).map_err(|e| {
        ReconError::schema(
            table.name(),
            format!("column '{column}' cannot be compared as {to}: {e}"),
        )
    })
}

fn compare(table: &Table, column: &str, value: &LiteralValue, op: CmpOp) -> Result<BooleanArray> {
    let Some((data_type, literal)) = value.as_scalar_array() else {
        // Any comparison with a null literal is unknown
        table.column(column)?;
        return Ok(BooleanArray::new_null(table.num_rows()));
    };
    let lhs = cast_column(table, column, &data_type)?;
    let rhs = Scalar::new(literal);
    let result = match op {
        CmpOp::Eq => cmp::eq(&lhs, &rhs)?,
        CmpOp::NotEq => cmp::neq(&lhs, &rhs)?,
        CmpOp::Gt => cmp::gt(&lhs, &rhs)?,
        CmpOp::GtEq => cmp::gt_eq(&lhs, &rhs)?,
        CmpOp::Lt => cmp::lt(&lhs, &rhs)?,
        CmpOp::LtEq => cmp::lt_eq(&lhs, &rhs)?,
    };
    Ok(result)
}

/// Set membership; null column values yield null
fn evaluate_in(table: &Table, column: &str, values: &[LiteralValue]) -> Result<BooleanArray> {
    let strings: Option<FxHashSet<&str>> = values
        .iter()
        .map(|v| match v {
            LiteralValue::String(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    if let Some(set) = strings {
        let array = table.string_column(column)?;
        return Ok(array.iter().map(|v| v.map(|s| set.contains(s))).collect());
    }

    let ints: Option<FxHashSet<i64>> = values
        .iter()
        .map(|v| match v {
            LiteralValue::Int(n) => Some(*n),
            _ => None,
        })
        .collect();
    if let Some(set) = ints {
        let array = cast_column(table, column, &DataType::Int64)?;
        let array = array
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| ReconError::schema(table.name(), format!("column '{column}' is not numeric")))?;
        return Ok(array.iter().map(|v| v.map(|n| set.contains(&n))).collect());
    }

    // Mixed literal types fall back to a disjunction of equalities
    let mut result = BooleanArray::from(vec![false; table.num_rows()]);
    for value in values {
        result = or_kleene(&result, &compare(table, column, value, CmpOp::Eq)?)?;
    }
    Ok(result)
}

/// Row-wise string test; null values never match
fn string_predicate(
    table: &Table,
    column: &str,
    predicate: impl Fn(&str) -> bool,
) -> Result<BooleanArray> {
    let values = table.string_column(column)?;
    Ok(values.iter().map(|v| Some(v.is_some_and(&predicate))).collect())
}

/// A filter that evaluates an expression against a table
#[derive(Debug, Clone)]
pub struct ExpressionFilter {
    expr: Expr,
}

impl ExpressionFilter {
    #[must_use]
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl BatchFilter for ExpressionFilter {
    fn filter(&self, table: &Table) -> Result<Table> {
        let mask = self.expr.evaluate(table)?;
        filter_table_with_mask(table, &mask)
    }

    fn required_columns(&self) -> HashSet<String> {
        self.expr.required_columns()
    }
}
