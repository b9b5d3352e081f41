//! Local address postcode correction (`CCRSADR4.VERIFY.txt`, `CCRSADR4.UPDATE.txt`).
//!
//! Address lines are scanned for a Malaysian postcode followed by the town
//! ("50450 KUALA LUMPUR"). When one is found the structured postcode, city
//! and country are replaced from the line, and the state is derived from the
//! postcode if it is missing. Foreign addresses are left out.

use std::sync::Arc;

use arrow::array::{Array, StringArray};

use crate::classify::{Output, RuleSet, zip_state_ranges};
use crate::error::Result;
use crate::filter::{Expr, LiteralValue, filter_table};
use crate::join::{JoinSpec, JoinType, join};
use crate::normalize::{ColumnOp, normalize};
use crate::reader::InputSpec;
use crate::table::Table;
use crate::writer::{FieldSpec, FixedWidthLayout, OutputSet};

use super::{Job, JobContext, JobReport};

pub const ADDRESSES: &str = "ADDRFILE";
pub const ELEMENTS: &str = "AELEFILE";

pub const VERIFY_FILE: &str = "CCRSADR4.VERIFY.txt";
pub const UPDATE_FILE: &str = "CCRSADR4.UPDATE.txt";

const ADDRESS_LINES: [&str; 5] = ["LINE1ADR", "LINE2ADR", "LINE3ADR", "LINE4ADR", "LINE5ADR"];
const ELEMENT_FIELDS: [&str; 5] = ["STREET", "CITY", "ZIP", "ZIP2", "COUNTRY"];

pub const LOCAL_COUNTRY: &str = "MALAYSIA";

/// Country codes (10-character, blank padded) of addresses outside Malaysia
pub const FOREIGN_COUNTRIES: &[&str] = &[
    "SINGAPORE ", "CANADA    ", "SINGAPORE`", "LONDON    ", "AUS       ", "AUSTRIA   ", "BAHRAIN   ", "BANGLADESH",
    "BRUNEI DAR", "CAMBODIA  ", "CAN       ", "CAYMAN ISL", "CHINA     ", "BRUNEI    ", "INDONESIA ", "DARUSSALAM",
    "DENMARK   ", "EMIRATES  ", "ENGLAND   ", "EUROPEAN  ", "FRANCE    ", "GERMANY   ", "HONG KONG ", "INDIA     ",
    "IRAN (ISLA", "IRELAND   ", "JAPAN     ", "KOREA REPU", "MACAU     ", "MAURITIUS ", "MEXICO    ", "MYANMAR   ",
    "NEPAL     ", "NETHERLAND", "NEW ZEALAN", "NEWZEALAND", "NIGERIA   ", "NORWAY    ", "OMAN      ", "PAKISTAN  ",
    "PANAMA    ", "PHILIPPINE", "ROC       ", "S ARABIA  ", "SAMOA     ", "SAUDI ARAB", "SIGAPORE  ", "SIMGAPORE ",
    "SINGAPOREW", "SINGPAORE ", "SINGPORE  ", "SINAGPORE ", "SNGAPORE  ", "SINGOPORE ", "SPAIN     ", "SRI LANKA ",
    "SWAZILAND ", "SWEDEN    ", "SWITZERLAN", "TAIWAN    ", "TAIWAN,PRO", "THAILAND  ", "U KINGDOM ", "U.K.      ",
    "UNITED ARA", "UK        ", "UNITED KIN", "UNITED STA", "VIRGIN ISL", "USA       ", "PAPUA NEW ", "AUSTRALIA ",
];

/// Words in the address text that mark a foreign address
pub const FOREIGN_WORDS: &[&str] = &[
    "SINGAPORE", "HONG HONG", "QATAR", "TAMIL NADU", "STAFFORDSHIRE", "HANOI", "VIETNAM", "NEW ZEALAND", "ENGLAND",
    "AUCKLAND", "SHANGHAI", "DOHA QATAR", "THAILAND", "HONG KONG", "SEOUL", "#", "NSW", "NETHERLANDS", "AUSTRALIA",
    "S'PORE",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct AddressJob;

/// Postcode and town from an address line such as `"50450 KUALA LUMPUR"`
///
/// The line must start with a five-digit postcode strictly between 1 and
/// 99998 followed by a blank. The town is the next 25 characters.
#[must_use]
pub fn postcode_in_line(line: &str) -> Option<(String, String)> {
    let zip: String = line.chars().take(5).collect();
    if zip.len() != 5 || !zip.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = zip.parse().ok()?;
    if value <= 1 || value >= 99_998 || line.chars().nth(5) != Some(' ') {
        return None;
    }
    let city = line.chars().skip(6).take(25).collect();
    Some((zip, city))
}

/// Add `NEW_ZIP`, `NEW_CITY` and `NEW_COUNTRY` from the last address line holding a postcode
pub fn extract_local_postcodes(table: &Table) -> Result<Table> {
    let lines = ADDRESS_LINES[1..]
        .iter()
        .map(|c| table.string_column(c))
        .collect::<Result<Vec<_>>>()?;

    let mut zips = Vec::with_capacity(table.num_rows());
    let mut cities = Vec::with_capacity(table.num_rows());
    let mut countries = Vec::with_capacity(table.num_rows());
    for row in 0..table.num_rows() {
        let found = lines
            .iter()
            .rev()
            .filter(|line| line.is_valid(row))
            .find_map(|line| postcode_in_line(line.value(row)));
        match found {
            Some((zip, city)) => {
                zips.push(Some(zip));
                cities.push(Some(city));
                countries.push(Some(LOCAL_COUNTRY));
            }
            None => {
                zips.push(None);
                cities.push(None);
                countries.push(None);
            }
        }
    }

    table
        .with_column("NEW_ZIP", Arc::new(StringArray::from(zips)))?
        .with_column("NEW_CITY", Arc::new(StringArray::from(cities)))?
        .with_column("NEW_COUNTRY", Arc::new(StringArray::from(countries)))
}

/// Fill a missing or `N/A` state from the new postcode
pub fn fill_state(table: &Table) -> Result<Table> {
    let table = if table.has_column("STATEX") {
        table.clone()
    } else {
        normalize(
            table,
            &[ColumnOp::Literal {
                alias: "STATEX".to_string(),
                value: LiteralValue::Null,
            }],
        )?
    };
    let with_zip_state = zip_state_ranges()?.classify_column(&table, "NEW_ZIP", "ZIP_STATE", None)?;
    let with_zip_state = normalize(
        &with_zip_state,
        &[ColumnOp::FillNull {
            column: "ZIP_STATE".to_string(),
            value: LiteralValue::str(""),
        }],
    )?;
    RuleSet::new("STATEX")
        .when(
            Expr::Or(vec![Expr::is_null("STATEX"), Expr::eq_str("STATEX", "N/A")]),
            Output::col("ZIP_STATE"),
        )
        .otherwise(Output::col("STATEX"))
        .apply(&with_zip_state, "STATEX")?
        .drop(&["ZIP_STATE"])
}

fn verify_layout() -> FixedWidthLayout {
    let header = format!(
        "{:<11}-{:<12}{:<41}{:<41}{:<41}{:<41}{:<41} {:<5}{:<25}{:<10}{:<5}{:<25}{:<10}",
        "CIS #", "ADDR REF", "ADDLINE1", "ADDLINE2", "ADDLINE3", "ADDLINE4", "ADDLINE5", "ZIP", "CITY", "COUNTRY",
        "ZIP", "CITY", "COUNTRY"
    );
    let mut fields = vec![
        FieldSpec::column("CUSTNO", 11),
        FieldSpec::literal("-"),
        FieldSpec::column("ADDREF", 11).zero_filled(),
    ];
    fields.extend(ADDRESS_LINES.iter().map(|c| FieldSpec::column(c, 40)));
    fields.extend([
        FieldSpec::literal("*OLD*"),
        FieldSpec::column("ZIP", 5),
        FieldSpec::column("CITY", 25),
        FieldSpec::column("COUNTRY", 10),
        FieldSpec::literal("*NEW*"),
        FieldSpec::column("NEW_ZIP", 5),
        FieldSpec::column("NEW_CITY", 25),
        FieldSpec::column("STATEX", 3),
        FieldSpec::column("NEW_COUNTRY", 10),
    ]);
    FixedWidthLayout::new(fields)
        .with_header(header)
        .skip_when(Expr::is_blank("NEW_ZIP"))
}

fn update_layout() -> FixedWidthLayout {
    FixedWidthLayout::new(vec![
        FieldSpec::column("CUSTNO", 11),
        FieldSpec::column("ADDREF", 11).zero_filled(),
        FieldSpec::column("NEW_CITY", 25).uppercase(),
        FieldSpec::column("STATEX", 3),
        FieldSpec::column("NEW_ZIP", 5),
        FieldSpec::column("NEW_COUNTRY", 10),
    ])
    .skip_when(Expr::is_blank("NEW_ZIP"))
}

fn fill_blank(columns: &[&str]) -> Vec<ColumnOp> {
    columns
        .iter()
        .map(|c| ColumnOp::FillNull {
            column: (*c).to_string(),
            value: LiteralValue::str(""),
        })
        .collect()
}

/// Joined local addresses with corrected postcode, city, country and state
pub fn corrected_addresses(ctx: &JobContext<'_>, addresses: &Table, elements: &Table) -> Result<Table> {
    let mut ops = vec![
        ColumnOp::rename(&[("ADDREF1", "ADDREF")]),
        ColumnOp::zero_pad("CUSTNO", ctx.config.key_width),
    ];
    ops.extend(fill_blank(&ADDRESS_LINES));
    let addresses = normalize(addresses, &ops)?.sort_asc(&["ADDREF"])?;

    let mut ops = vec![ColumnOp::rename(&[("ADDREF1", "ADDREF")])];
    ops.extend(fill_blank(&ELEMENT_FIELDS));
    let elements = normalize(elements, &ops)?.sort_asc(&["ADDREF"])?;

    let joined = join(&addresses, &elements, &JoinSpec::on(&["ADDREF"], JoinType::Inner))?;
    let joined = normalize(
        &joined,
        &[ColumnOp::Concat {
            columns: ADDRESS_LINES.iter().map(ToString::to_string).collect(),
            alias: "ADDRLINE".to_string(),
            pad: None,
        }],
    )?;
    ctx.preview(&joined, "ADDR + AELE");

    let local = filter_table(
        &joined,
        &Expr::NotIn("COUNTRY".to_string(), LiteralValue::strs(FOREIGN_COUNTRIES)),
    )?;
    let local = extract_local_postcodes(&local)?;
    let local = filter_table(
        &local,
        &Expr::ContainsAny(
            "ADDRLINE".to_string(),
            FOREIGN_WORDS.iter().map(ToString::to_string).collect(),
        )
        .negate(),
    )?;
    let local = fill_state(&local)?.with_name("ADDRESS");
    ctx.preview(&local, "LOCAL ADDRESSES");
    Ok(local)
}

impl Job for AddressJob {
    fn name(&self) -> &'static str {
        "address"
    }

    fn description(&self) -> &'static str {
        "Postcode, city and state corrections for local addresses"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[ADDRESSES, ELEMENTS]
    }

    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport> {
        let [addresses, elements] = ctx.load_many([InputSpec::all(ADDRESSES), InputSpec::all(ELEMENTS)])?;
        let local = corrected_addresses(ctx, &addresses, &elements)?;

        let mut outputs = OutputSet::new(ctx.config);
        outputs.fixed_width(&local, VERIFY_FILE, &verify_layout())?;
        outputs.fixed_width(&local, UPDATE_FILE, &update_layout())?;
        Ok(JobReport::new(self.name(), outputs.finish()))
    }
}
