//! Fixed-width text output for mainframe-style flat files.
//!
//! Each output line is the concatenation of its fields, each padded to its
//! width. Values longer than the field are cut to the field width so that
//! every column starts at the same offset on every line.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use itertools::Itertools;

use super::{ColumnText, write_atomically};
use crate::error::{ReconError, Result};
use crate::filter::Expr;
use crate::table::Table;
use crate::utils::log_operation_complete;

/// Where a field's text comes from
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    Column(String),
    Literal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// One field of a fixed-width record
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub source: FieldSource,
    pub width: usize,
    pub align: Align,
    pub pad: char,
    pub upper: bool,
}

impl FieldSpec {
    /// Left-aligned, space-padded column
    #[must_use]
    pub fn column(name: &str, width: usize) -> Self {
        Self {
            source: FieldSource::Column(name.to_string()),
            width,
            align: Align::Left,
            pad: ' ',
            upper: false,
        }
    }

    /// Constant text occupying exactly its own length
    #[must_use]
    pub fn literal(text: &str) -> Self {
        Self {
            source: FieldSource::Literal(text.to_string()),
            width: text.chars().count(),
            align: Align::Left,
            pad: ' ',
            upper: false,
        }
    }

    /// Right-aligned and zero-filled
    #[must_use]
    pub fn zero_filled(mut self) -> Self {
        self.align = Align::Right;
        self.pad = '0';
        self
    }

    #[must_use]
    pub fn right(mut self) -> Self {
        self.align = Align::Right;
        self
    }

    #[must_use]
    pub fn uppercase(mut self) -> Self {
        self.upper = true;
        self
    }

    /// Pad or cut a value to this field's width
    #[must_use]
    pub fn render(&self, value: &str) -> String {
        let value = if self.upper {
            value.to_uppercase()
        } else {
            value.to_string()
        };
        let len = value.chars().count();
        if len >= self.width {
            return value.chars().take(self.width).collect();
        }
        let padding = self.pad.to_string().repeat(self.width - len);
        match self.align {
            Align::Left => value + &padding,
            Align::Right => padding + &value,
        }
    }
}

/// Layout of a fixed-width file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedWidthLayout {
    pub fields: Vec<FieldSpec>,
    /// Line written before the records
    pub header: Option<String>,
    /// Rows for which this is true are not written
    pub skip_when: Option<Expr>,
}

impl FixedWidthLayout {
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, header: String) -> Self {
        self.header = Some(header);
        self
    }

    #[must_use]
    pub fn skip_when(mut self, expr: Expr) -> Self {
        self.skip_when = Some(expr);
        self
    }

    /// Total record length
    #[must_use]
    pub fn record_width(&self) -> usize {
        self.fields.iter().map(|f| f.width).sum()
    }
}

/// Write a table as fixed-width records, returning the number of records
pub fn write_fixed_width(table: &Table, path: &Path, layout: &FixedWidthLayout) -> Result<usize> {
    let start = Instant::now();
    if layout.fields.is_empty() {
        return Err(ReconError::RuleError(format!(
            "fixed-width layout for {} has no fields",
            path.display()
        )));
    }

    let sources = layout
        .fields
        .iter()
        .map(|field| match &field.source {
            FieldSource::Column(name) => table.column(name).and_then(|c| ColumnText::new(c, None)).map(Some),
            FieldSource::Literal(_) => Ok(None),
        })
        .collect::<Result<Vec<_>>>()?;

    let skip = match &layout.skip_when {
        Some(expr) => Some(expr.evaluate_mask(table)?),
        None => None,
    };
    let rows = (0..table.num_rows())
        .filter(|&row| skip.as_ref().is_none_or(|mask| !mask.value(row)))
        .collect_vec();

    write_atomically(path, |out| {
        if let Some(header) = &layout.header {
            writeln!(out, "{header}")?;
        }
        let mut line = String::with_capacity(layout.record_width());
        for &row in &rows {
            line.clear();
            for (field, source) in layout.fields.iter().zip(&sources) {
                let value = match (&field.source, source) {
                    (FieldSource::Literal(text), _) => text.clone(),
                    (_, Some(column)) => column.get(row).unwrap_or_default(),
                    (_, None) => String::new(),
                };
                line.push_str(&field.render(&value));
            }
            writeln!(out, "{line}")?;
        }
        Ok(())
    })?;

    log_operation_complete("wrote", path, rows.len(), Some(start.elapsed()));
    Ok(rows.len())
}
