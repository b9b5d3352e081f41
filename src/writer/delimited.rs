//! Delimited text output.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use csv::{QuoteStyle, WriterBuilder};
use itertools::Itertools;

use super::{ColumnText, write_atomically};
use crate::error::Result;
use crate::table::Table;
use crate::utils::log_operation_complete;

/// When fields are quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteMode {
    /// Every non-null field and every header name
    Always,
    /// Only fields containing the delimiter, a quote or a line break
    #[default]
    Necessary,
}

/// Options for delimited output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedOptions {
    pub delimiter: u8,
    pub quote: QuoteMode,
    /// Written, unquoted, in place of nulls
    pub null_token: String,
    pub header: bool,
    /// Report title written on its own line before the header
    pub title: Option<String>,
    /// Fixed number of decimals for floating point columns
    pub float_precision: Option<usize>,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: QuoteMode::Necessary,
            null_token: String::new(),
            header: true,
            title: None,
            float_precision: None,
        }
    }
}

impl DelimitedOptions {
    /// Quote every field and mark nulls with `\N`
    #[must_use]
    pub fn quoted_with_null_marker() -> Self {
        Self {
            quote: QuoteMode::Always,
            null_token: "\\N".to_string(),
            ..Self::default()
        }
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Write a table as delimited text, returning the row count
pub fn write_delimited(table: &Table, path: &Path, options: &DelimitedOptions) -> Result<usize> {
    let start = Instant::now();
    let columns = table
        .batch()
        .columns()
        .iter()
        .map(|c| ColumnText::new(c, options.float_precision))
        .collect::<Result<Vec<_>>>()?;

    write_atomically(path, |out| {
        if let Some(title) = &options.title {
            writeln!(out, "{title}")?;
        }
        // Quoting is decided per field so that the null token stays bare
        let style = match options.quote {
            QuoteMode::Always => QuoteStyle::Never,
            QuoteMode::Necessary => QuoteStyle::Necessary,
        };
        let mut writer = WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote_style(style)
            .from_writer(out.by_ref());

        let render = |value: Option<String>| -> String {
            match (value, options.quote) {
                (None, _) => options.null_token.clone(),
                (Some(v), QuoteMode::Always) => quote(&v),
                (Some(v), QuoteMode::Necessary) => v,
            }
        };

        if options.header {
            let names = table
                .column_names()
                .into_iter()
                .map(|n| render(Some(n)))
                .collect_vec();
            writer.write_record(&names)?;
        }
        for row in 0..table.num_rows() {
            writer.write_record(columns.iter().map(|c| render(c.get(row))))?;
        }
        writer.flush()?;
        Ok(())
    })?;

    log_operation_complete("wrote", path, table.num_rows(), Some(start.elapsed()));
    Ok(table.num_rows())
}
