//! Date-based filtering
//!
//! The expiry filter keeps relationship records that are still in force on a
//! control date. The control date itself comes from configuration, from the
//! bank control extract, or from the local clock.

use std::collections::HashSet;

use arrow::array::{Array, BooleanArray, Date32Array};
use chrono::{Datelike, Local, NaiveDate};

use crate::error::{ReconError, Result};
use crate::filter::core::{BatchFilter, filter_table_with_mask};
use crate::filter::expr::EPOCH_DAYS_FROM_CE;
use crate::table::Table;

/// Default layout of expiry dates in the extracts
pub const EXPIRY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Keeps rows whose expiry is blank or not yet passed
///
/// A row is kept when the expiry value is null or blank, or when it parses to
/// a date on or after the control date. Values that are present but cannot be
/// parsed are excluded and reported in a single warning.
#[derive(Debug, Clone)]
pub struct ExpiryFilter {
    column: String,
    control_date: NaiveDate,
    format: String,
}

impl ExpiryFilter {
    #[must_use]
    pub fn new(column: &str, control_date: NaiveDate) -> Self {
        Self {
            column: column.to_string(),
            control_date,
            format: EXPIRY_DATE_FORMAT.to_string(),
        }
    }

    /// Use a different chrono format for text expiry values
    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }

    #[must_use]
    pub fn control_date(&self) -> NaiveDate {
        self.control_date
    }

    /// Mask of rows that are still in force
    pub fn mask(&self, table: &Table) -> Result<BooleanArray> {
        let column = table.column(&self.column)?;

        // Already-typed date columns need no parsing
        if let Some(dates) = column.as_any().downcast_ref::<Date32Array>() {
            let control = self.control_date.num_days_from_ce() - EPOCH_DAYS_FROM_CE;
            return Ok(dates
                .iter()
                .map(|d| Some(d.is_none_or(|days| days >= control)))
                .collect());
        }

        let values = table.string_column(&self.column)?;
        let mut unparseable = 0usize;
        let mut sample = None;
        let mask: BooleanArray = values
            .iter()
            .map(|value| {
                let Some(text) = value.map(str::trim).filter(|t| !t.is_empty()) else {
                    return Some(true);
                };
                match NaiveDate::parse_from_str(text, &self.format) {
                    Ok(date) => Some(date >= self.control_date),
                    Err(_) => {
                        unparseable += 1;
                        sample.get_or_insert_with(|| text.to_string());
                        Some(false)
                    }
                }
            })
            .collect();

        if unparseable > 0 {
            log::warn!(
                "{}.{}: excluded {} row(s) with unparseable expiry date (e.g. {:?})",
                table.name(),
                self.column,
                unparseable,
                sample.unwrap_or_default()
            );
        }
        Ok(mask)
    }
}

impl BatchFilter for ExpiryFilter {
    fn filter(&self, table: &Table) -> Result<Table> {
        let mask = self.mask(table)?;
        let kept = filter_table_with_mask(table, &mask)?;
        log::info!(
            "{}: expiry filter on {} as of {} kept {} of {} rows",
            table.name(),
            self.column,
            self.control_date,
            kept.num_rows(),
            table.num_rows()
        );
        Ok(kept)
    }

    fn required_columns(&self) -> HashSet<String> {
        HashSet::from([self.column.clone()])
    }
}

/// Control date from the first row of a control table's `SRSYY`/`SRSMM`/`SRSDD`
pub fn control_date_from_table(table: &Table) -> Result<NaiveDate> {
    table.require_columns(&["SRSYY", "SRSMM", "SRSDD"])?;
    if table.num_rows() == 0 {
        return Err(ReconError::schema(table.name(), "control table has no rows"));
    }

    let part = |name: &str| -> Result<u32> {
        let column = table.string_column(name)?;
        let text = if column.is_null(0) { "" } else { column.value(0).trim() };
        text.parse::<u32>().map_err(|_| {
            ReconError::schema(table.name(), format!("control field {name} is not numeric: {text:?}"))
        })
    };

    let (year, month, day) = (part("SRSYY")?, part("SRSMM")?, part("SRSDD")?);
    // Two-digit years are in the 2000s
    let year = if year < 100 { 2000 + year } else { year };
    i32::try_from(year)
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        .ok_or_else(|| {
            ReconError::schema(
                table.name(),
                format!("control date {year:04}-{month:02}-{day:02} is not a calendar date"),
            )
        })
}

/// Pick the control date: configured value, then control table, then today
pub fn resolve_control_date(configured: Option<NaiveDate>, control: Option<&Table>) -> Result<NaiveDate> {
    if let Some(date) = configured {
        return Ok(date);
    }
    if let Some(table) = control {
        return control_date_from_table(table);
    }
    Ok(Local::now().date_naive())
}
