//! Customer account listing (`CMDREPORT.txt`).
//!
//! Customers reached through the alias file are enriched with occupation,
//! MASCO and MSIC descriptions and matched to each account they hold:
//! deposits with their statement cycles, posting restrictions and holds,
//! loan notes, safe deposit boxes and both card products. The matched rows
//! are stacked and written as a semicolon-delimited listing.

use std::sync::Arc;

use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, new_null_array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use itertools::Itertools;

use crate::classify::{Output, RuleSet, loan_type_ranges};
use crate::dedup::{Retention, unique};
use crate::error::{ReconError, Result};
use crate::filter::{Expr, LiteralValue};
use crate::join::{JoinChain, JoinSpec, JoinType, join};
use crate::normalize::{ColumnOp, normalize};
use crate::reader::InputSpec;
use crate::table::Table;
use crate::writer::{DelimitedOptions, OutputSet};

use super::accounts::{BALANCES, BRANCHES, branch_abbreviations, in_ringgit, summarize_balances};
use super::{Job, JobContext, JobReport, mmddyyyy_as_yyyymmdd};

pub const ALIASES: &str = "ALIAS";
pub const CUSTOMERS: &str = "CISFILE_CUSTDLY";
pub const OCCUPATIONS: &str = "OCCUPAT";
pub const MASCO: &str = "MASCOFL";
pub const MSIC: &str = "MSICFL";
pub const CYCLES: &str = "CYCLEFL";
pub const POSTINGS: &str = "POSTFL";
pub const HOLDS: &str = "DEPOFL";
pub const LOANS: &str = "ACCTFILE";
pub const SAFE_BOXES: &str = "SAFEBOX";
pub const UNICARDS: &str = "UNICARD";
pub const COMCARDS: &str = "COMCARD";

pub const REPORT_FILE: &str = "CMDREPORT.txt";
pub const REPORT_TITLE: &str = "LIST OF CUSTOMERS INFORMATION";

/// Width of the loan note number in `ACCTNOTE`
pub const NOTE_WIDTH: usize = 5;

/// Application codes whose balances and statement figures are reported
pub const DEPOSIT_CODES: [&str; 3] = ["FD", "CA", "SA"];

/// Descriptions reported as `NIL` when blank
pub const NIL_COLUMNS: [&str; 4] = ["DEMODESC", "MASCODESC", "SICCODE", "MSICDESC"];

const CYCLE_COUNTS: [&str; 4] = ["CURR_CYC_DR", "CURR_CYC_CR", "PREV_CYC_DR", "PREV_CYC_CR"];
const CYCLE_AMOUNTS: [&str; 4] = ["CURR_AMT_DR", "CURR_AMT_CR", "PREV_AMT_DR", "PREV_AMT_CR"];
const HOLD_AMOUNTS: [&str; 3] = ["AMT_1", "AMT_2", "AMT_3"];

const HOLD_COLUMNS: [&str; 13] = [
    "SEQID_1", "SEQID_2", "SEQID_3", "AMT_1", "AMT_2", "AMT_3", "DESC_1", "DESC_2", "DESC_3", "SOURCE_1", "SOURCE_2",
    "SOURCE_3", "TOT_HOLD",
];

pub const LOAN_COLUMNS: [&str; 12] = [
    "ACCTNOC", "ACCTNOTE", "ACCTNAME40", "ACCT_TYPE", "APPL_CODE", "BANKINDC", "COSTCTR1", "ACCTBRCH", "DATEOPEN",
    "DATECLSE", "LEDGERBAL", "ACCTSTATUS",
];

/// Report columns and their header labels, in file order
pub const REPORT_LAYOUT: [(&str, &str); 40] = [
    ("NO", "NO"),
    ("ALIASKEY", "ID TYPE"),
    ("ALIAS", "ID NUMBER"),
    ("CUSTNAME", "CUST NAME"),
    ("CUSTNO", "CIS NUMBER"),
    ("DEMODESC", "OCCUPATION"),
    ("MASCODESC", "MASCO"),
    ("SICCODE", "SIC CODE"),
    ("MSICDESC", "MSIC BIS TYPE"),
    ("ACCTNOC", "ACCT NUMBER"),
    ("BRANCH_ABBR", "ACCT BRANCH"),
    ("ACCTSTATUS", "ACCT STATUS"),
    ("DATEOPEN", "DATE ACCT OPEN"),
    ("DATECLSE", "DATE ACCT CLOSED"),
    ("SDBIND", "SDB(YES/NO)"),
    ("SDBBRH", "BR SDB MAINTAN"),
    ("TEMP_CURBAL", "CURRENT BALANCE"),
    ("TEMP_CURR_CYC_DR", "CURR CYC DR"),
    ("TEMP_CURR_AMT_DR", "CURR AMT DR"),
    ("TEMP_CURR_CYC_CR", "CURR CYC CR"),
    ("TEMP_CURR_AMT_CR", "CURR AMT CR"),
    ("TEMP_PREV_CYC_DR", "PREV CYC DR"),
    ("TEMP_PREV_AMT_DR", "PREV AMT DR"),
    ("TEMP_PREV_CYC_CR", "PREV CYC CR"),
    ("TEMP_PREV_AMT_CR", "PREV AMT CR"),
    ("ACCT_PST_IND", "POST INDICATOR"),
    ("ACCT_PST_REASON", "POST INDICATOR REASON"),
    ("TOT_HOLD", "TOTAL OF HOLD"),
    ("SEQID_1", "SEQ OF HOLD(1)"),
    ("TEMP_AMT_1", "AMT OF HOLD(1)"),
    ("DESC_1", "DESCRIP OF HOLD(1)"),
    ("SOURCE_1", "SOURCE(1)"),
    ("SEQID_2", "SEQ OF HOLD(2)"),
    ("TEMP_AMT_2", "AMT OF HOLD(2)"),
    ("DESC_2", "DESCRIP OF HOLD(2)"),
    ("SOURCE_2", "SOURCE(2)"),
    ("SEQID_3", "SEQ OF HOLD(3)"),
    ("TEMP_AMT_3", "AMT OF HOLD(3)"),
    ("DESC_3", "DESCRIP OF HOLD(3)"),
    ("SOURCE_3", "SOURCE(3)"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerReportJob;

/// Keep `columns` as text, one row per value of the first column
fn code_lookup(table: &Table, columns: [&str; 2]) -> Result<Table> {
    let lookup = normalize(
        table,
        &[
            ColumnOp::select(&columns),
            ColumnOp::CastUtf8(columns[0].to_string()),
            ColumnOp::CastUtf8(columns[1].to_string()),
        ],
    )?;
    unique(&lookup, &columns[..1], &Retention::First)
}

/// Customers found by alias, with occupation, MASCO and MSIC descriptions
pub fn customers_by_alias(
    ctx: &JobContext<'_>,
    aliases: &Table,
    customers: &Table,
    occupations: &Table,
    masco: &Table,
    msic: &Table,
) -> Result<Table> {
    let width = ctx.config.key_width;
    let aliases = normalize(
        aliases,
        &[
            ColumnOp::select(&["ALIASKEY", "ALIAS"]),
            ColumnOp::CastUtf8("ALIASKEY".to_string()),
            ColumnOp::CastUtf8("ALIAS".to_string()),
        ],
    )?;
    let customers = normalize(
        customers,
        &[
            ColumnOp::CastUtf8("ALIASKEY".to_string()),
            ColumnOp::CastUtf8("ALIAS".to_string()),
            ColumnOp::zero_pad("CUSTNO", width),
            ColumnOp::zero_pad("ACCTNOC", width),
            ColumnOp::Copy {
                from: "OCCUP".to_string(),
                alias: "DEMOCODE".to_string(),
            },
            ColumnOp::CastUtf8("DEMOCODE".to_string()),
            ColumnOp::CastUtf8("MASCO2008".to_string()),
            ColumnOp::CastUtf8("MSICCODE".to_string()),
        ],
    )?;

    Ok(JoinChain::new("MERGEALL", aliases)
        .join(&customers, &JoinSpec::on(&["ALIASKEY", "ALIAS"], JoinType::Inner))?
        .join(
            &code_lookup(occupations, ["DEMOCODE", "DEMODESC"])?,
            &JoinSpec::on(&["DEMOCODE"], JoinType::Left),
        )?
        .join(
            &code_lookup(masco, ["MASCO2008", "MASCODESC"])?,
            &JoinSpec::on(&["MASCO2008"], JoinType::Left),
        )?
        .join(
            &code_lookup(msic, ["MSICCODE", "MSICDESC"])?,
            &JoinSpec::on(&["MSICCODE"], JoinType::Left),
        )?
        .then(|t| t.sort_asc(&["ALIAS"]))?
        .finish())
}

/// Deposit summaries with statement cycles, posting restrictions and holds
pub fn deposit_details(
    ctx: &JobContext<'_>,
    deposits: &Table,
    cycles: &Table,
    postings: &Table,
    holds: &Table,
) -> Result<Table> {
    let width = ctx.config.key_width;
    let by_account = |table: &Table, from: &str, columns: &[&str]| -> Result<Table> {
        let mut keep = vec!["ACCTNOC"];
        keep.extend_from_slice(columns);
        let table = normalize(
            table,
            &[
                ColumnOp::ZeroPad {
                    column: from.to_string(),
                    width,
                    alias: Some("ACCTNOC".to_string()),
                },
                ColumnOp::select(&keep),
            ],
        )?;
        unique(&table, &["ACCTNOC"], &Retention::First)
    };
    let cycle_columns = CYCLE_COUNTS.iter().chain(&CYCLE_AMOUNTS).copied().collect_vec();
    let cycles = by_account(cycles, "ACCTNO", &cycle_columns)?;
    let postings = by_account(postings, "ACCTNOC", &["ACCT_PST_IND", "ACCT_PST_REASON"])?;
    let holds = by_account(holds, "ACCTNO", &HOLD_COLUMNS)?;

    let on_account = ctx.padded(JoinSpec::on(&["ACCTNOC"], JoinType::Left));
    Ok(JoinChain::new("DEPOSITS", deposits.clone())
        .join(&cycles, &on_account)?
        .join(&postings, &on_account)?
        .join(&holds, &on_account)?
        .finish())
}

/// `I` for Islamic cost centres, inclusive of both ends
#[must_use]
pub fn loan_bank_indicator_rules() -> RuleSet {
    RuleSet::new("BANKINDC")
        .when(
            Expr::And(vec![
                Expr::GtEq("COSTCENTER".to_string(), LiteralValue::Int(3000)),
                Expr::LtEq("COSTCENTER".to_string(), LiteralValue::Int(3999)),
            ]),
            Output::lit("I"),
        )
        .otherwise(Output::lit("C"))
}

#[must_use]
pub fn loan_status_rules() -> RuleSet {
    let arrears = |op: fn(String, LiteralValue) -> Expr, days: i64| op("ARREARDAY".to_string(), LiteralValue::Int(days));
    RuleSet::new("ACCTSTATUS")
        .when(Expr::Or(vec![Expr::eq_str("NPLINDC", "3"), arrears(Expr::Gt, 92)]), Output::lit("NPL"))
        .when(
            Expr::And(vec![arrears(Expr::Gt, 1), arrears(Expr::Lt, 92)]),
            Output::lit("ACCOUNT IN ARREARS"),
        )
        .when(Expr::eq_str("NOTEPAID", "P"), Output::lit("PAID-OFF"))
        .when(Expr::Gt("NOTECURBAL".to_string(), LiteralValue::Int(0)), Output::lit("ACTIVE"))
        .otherwise(Output::lit(""))
}

/// One row per loan note with its branch abbreviation
pub fn loan_notes(loans: &Table, branches: &Table, width: usize) -> Result<Table> {
    let mut ops = vec![
        ColumnOp::ZeroPad {
            column: "ACCTNO".to_string(),
            width,
            alias: Some("ACCTNOC".to_string()),
        },
        ColumnOp::ZeroPad {
            column: "NOTENO".to_string(),
            width: NOTE_WIDTH,
            alias: Some("NOTENOC".to_string()),
        },
        ColumnOp::literal("NOTESEP", "-"),
        ColumnOp::Concat {
            columns: vec!["ACCTNOC".to_string(), "NOTESEP".to_string(), "NOTENOC".to_string()],
            alias: "ACCTNOTE".to_string(),
            pad: None,
        },
        ColumnOp::Copy {
            from: "ACCTNAME".to_string(),
            alias: "ACCTNAME40".to_string(),
        },
        ColumnOp::Copy {
            from: "ORGTYPE".to_string(),
            alias: "ACCT_TYPE".to_string(),
        },
        ColumnOp::CastUtf8("ACCT_TYPE".to_string()),
        ColumnOp::CastInt64("COSTCENTER".to_string()),
        ColumnOp::FillNull {
            column: "COSTCENTER".to_string(),
            value: LiteralValue::Int(0),
        },
        // Branch is the last three digits of the seven-digit cost centre
        ColumnOp::ZeroPad {
            column: "COSTCENTER".to_string(),
            width: 7,
            alias: Some("COSTCTR7".to_string()),
        },
        ColumnOp::Slice {
            column: "COSTCTR7".to_string(),
            start: 4,
            len: Some(3),
            alias: "COSTCTR1".to_string(),
        },
        ColumnOp::Copy {
            from: "COSTCTR1".to_string(),
            alias: "ACCTBRCH".to_string(),
        },
        ColumnOp::CastUtf8("ACCTOPENDATE".to_string()),
        ColumnOp::CastUtf8("LASTTRANDATE".to_string()),
        ColumnOp::CastInt64("ARREARDAY".to_string()),
        ColumnOp::CastInt64("NOTECURBAL".to_string()),
        ColumnOp::CastUtf8("NPLINDC".to_string()),
        ColumnOp::CastUtf8("NOTEPAID".to_string()),
    ];
    ops.extend(mmddyyyy_as_yyyymmdd("ACCTOPENDATE", "DATEOPEN"));
    ops.extend(mmddyyyy_as_yyyymmdd("LASTTRANDATE", "DATECLSE"));
    let loans = normalize(loans, &ops)?;

    let loans = loan_type_ranges()?.classify_column(&loans, "ACCTNOC", "APPL_CODE", None)?;
    let loans = loan_bank_indicator_rules().apply(&loans, "BANKINDC")?;
    let loans = in_ringgit(&loans, "NOTECURBAL", "LEDGERBAL")?;
    let loans = loan_status_rules().apply(&loans, "ACCTSTATUS")?.select(&LOAN_COLUMNS)?;

    join(&loans, &branch_abbreviations(branches)?, &JoinSpec::on(&["ACCTBRCH"], JoinType::Left))?
        .sort_asc(&["ACCTNOC"])
        .map(|t| t.with_name("MERGELNBRCH"))
}

/// Safe deposit boxes as report rows
pub fn safe_deposit_boxes(boxes: &Table, width: usize) -> Result<Table> {
    let columns = ["ACCTNAME40", "BRANCH_ABBR", "ACCTNOC", "BANKINDC", "ACCTSTATUS"];
    let mut ops = vec![ColumnOp::select(&columns)];
    ops.extend(columns.iter().map(|c| ColumnOp::CastUtf8((*c).to_string())));
    ops.extend([
        ColumnOp::zero_pad("ACCTNOC", width),
        ColumnOp::Literal {
            alias: "LEDGERBAL".to_string(),
            value: LiteralValue::Float(0.0),
        },
        ColumnOp::literal("CATEGORY", "3"),
        ColumnOp::literal("APPL_CODE", "SDB"),
        ColumnOp::literal("SDBIND", "YES"),
        ColumnOp::Copy {
            from: "BRANCH_ABBR".to_string(),
            alias: "SDBBRH".to_string(),
        },
    ]);
    normalize(boxes, &ops)
}

/// Card accounts as report rows
pub fn card_accounts(cards: &Table, width: usize) -> Result<Table> {
    let columns = ["BRANCH_ABBR", "ACCTNOC", "ACCTSTATUS", "DATEOPEN", "DATECLSE"];
    let mut ops = vec![ColumnOp::select(&columns)];
    ops.extend(columns.iter().map(|c| ColumnOp::CastUtf8((*c).to_string())));
    ops.push(ColumnOp::zero_pad("ACCTNOC", width));
    normalize(cards, &ops)
}

/// Customers matched to the accounts of one product, one row per account
fn matched(ctx: &JobContext<'_>, customers: &Table, accounts: &Table, label: &str) -> Result<Table> {
    let merged = join(customers, accounts, &ctx.padded(JoinSpec::on(&["ACCTNOC"], JoinType::Inner)))?;
    let merged = unique(&merged, &["ACCTNOC"], &Retention::First)?.with_name(label);
    ctx.preview(&merged, label);
    Ok(merged)
}

/// Values of a numeric column where `keep` is set and `accept` holds, else zero
fn reported(
    table: &Table,
    column: &str,
    keep: Option<&BooleanArray>,
    accept: impl Fn(f64) -> bool,
) -> Result<Vec<f64>> {
    let rows = table.num_rows();
    if !table.has_column(column) {
        return Ok(vec![0.0; rows]);
    }
    let values = cast(table.column(column)?, &DataType::Float64)?;
    let values = values
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| ReconError::schema(table.name(), format!("column '{column}' is not numeric")))?;
    Ok((0..rows)
        .map(|row| {
            let kept = keep.is_none_or(|k| k.value(row));
            match values.is_valid(row).then(|| values.value(row)) {
                Some(v) if kept && accept(v) => v,
                _ => 0.0,
            }
        })
        .collect())
}

/// Report rows from the stacked account matches, in [`REPORT_LAYOUT`] order
///
/// Text columns no product supplied are reported empty; missing amounts are
/// reported as zero.
pub fn report_rows(stacked: &Table) -> Result<Table> {
    let mut table = stacked.clone();
    for (column, _) in REPORT_LAYOUT {
        if column != "NO" && !column.starts_with("TEMP_") && !table.has_column(column) {
            table = table.with_column(column, new_null_array(&DataType::Utf8, table.num_rows()))?;
        }
    }
    for column in NIL_COLUMNS {
        table = RuleSet::new(column)
            .when(Expr::is_blank(column), Output::lit("NIL"))
            .otherwise(Output::col(column))
            .apply(&table, column)?;
    }
    table = normalize(
        &table,
        &[
            ColumnOp::FillNull {
                column: "SDBIND".to_string(),
                value: LiteralValue::str("NO"),
            },
            ColumnOp::FillNull {
                column: "SDBBRH".to_string(),
                value: LiteralValue::str(""),
            },
        ],
    )?;

    let deposit = Expr::in_strs("APPL_CODE", &DEPOSIT_CODES).evaluate_mask(&table)?;
    let amounts = |t: &Table, column: &str, keep: Option<&BooleanArray>, accept: fn(f64) -> bool| {
        reported(t, column, keep, accept).map(|v| Arc::new(Float64Array::from(v)))
    };
    let mut derived = vec![(
        "TEMP_CURBAL".to_string(),
        amounts(&table, "CURBAL", Some(&deposit), |v| v != 0.0)?,
    )];
    for column in CYCLE_AMOUNTS.iter().chain(&HOLD_AMOUNTS) {
        let keep = CYCLE_AMOUNTS.contains(column).then_some(&deposit);
        derived.push((format!("TEMP_{column}"), amounts(&table, column, keep, |v| v > 0.0)?));
    }
    for (name, values) in derived {
        table = table.with_column(&name, values)?;
    }
    for column in CYCLE_COUNTS {
        let counts = reported(&table, column, Some(&deposit), |v| v > 0.0)?;
        let counts: Int64Array = counts.into_iter().map(|v| Some(v as i64)).collect();
        table = table.with_column(&format!("TEMP_{column}"), Arc::new(counts))?;
    }

    let numbers = Int64Array::from_iter_values(1..=table.num_rows() as i64);
    let table = table.with_column("NO", Arc::new(numbers))?;
    let columns = REPORT_LAYOUT.iter().map(|(column, _)| *column).collect_vec();
    table.select(&columns).map(|t| t.with_name("CMDREPORT"))
}

impl Job for CustomerReportJob {
    fn name(&self) -> &'static str {
        "customer_report"
    }

    fn description(&self) -> &'static str {
        "Customer listing of deposit, loan, safe deposit box and card accounts"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[
            ALIASES, CUSTOMERS, OCCUPATIONS, MASCO, MSIC, BALANCES, BRANCHES, CYCLES, POSTINGS, HOLDS, LOANS,
            SAFE_BOXES, UNICARDS, COMCARDS,
        ]
    }

    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport> {
        let [
            aliases,
            customers,
            occupations,
            masco,
            msic,
            balances,
            branches,
            cycles,
            postings,
            holds,
            loans,
            boxes,
            unicards,
            comcards,
        ] = ctx.load_many([
            InputSpec::columns(ALIASES, &["ALIASKEY", "ALIAS"]),
            InputSpec::all(CUSTOMERS),
            InputSpec::columns(OCCUPATIONS, &["DEMOCODE", "DEMODESC"]),
            InputSpec::columns(MASCO, &["MASCO2008", "MASCODESC"]),
            InputSpec::columns(MSIC, &["MSICCODE", "MSICDESC"]),
            InputSpec::all(BALANCES),
            InputSpec::columns(BRANCHES, &["ACCTBRCH", "BRANCH_ABBR"]),
            InputSpec::all(CYCLES),
            InputSpec::columns(POSTINGS, &["ACCTNOC", "ACCT_PST_IND", "ACCT_PST_REASON"]),
            InputSpec::all(HOLDS),
            InputSpec::all(LOANS),
            InputSpec::all(SAFE_BOXES),
            InputSpec::all(UNICARDS),
            InputSpec::all(COMCARDS),
        ])?;
        let width = ctx.config.key_width;

        let customers = customers_by_alias(ctx, &aliases, &customers, &occupations, &masco, &msic)?;
        ctx.preview(&customers, "MERGEALL");

        let deposits = summarize_balances(&balances, &branches, width)?;
        let deposits = deposit_details(ctx, &deposits, &cycles, &postings, &holds)?;
        let parts = [
            matched(ctx, &customers, &deposits, "MERGEDP")?,
            matched(ctx, &customers, &loan_notes(&loans, &branches, width)?, "MERGELN")?,
            matched(ctx, &customers, &safe_deposit_boxes(&boxes, width)?, "MERGESDB")?,
            matched(ctx, &customers, &card_accounts(&unicards, width)?, "MERGEUNI")?,
            matched(ctx, &customers, &card_accounts(&comcards, width)?, "MERGECOM")?,
        ];
        let stacked = Table::concat("CUSTACCT", &parts)?;
        let report = report_rows(&stacked)?;
        ctx.preview(&report, "CMDREPORT");

        let labels = REPORT_LAYOUT.to_vec();
        let options = DelimitedOptions {
            delimiter: b';',
            title: Some(REPORT_TITLE.to_string()),
            float_precision: Some(2),
            ..DelimitedOptions::default()
        };
        let mut outputs = OutputSet::new(ctx.config);
        outputs.delimited(&report.rename(&labels)?, REPORT_FILE, &options)?;
        outputs.parquet(&stacked, "CUSTACCT.parquet")?;
        Ok(JobReport::new(self.name(), outputs.finish()))
    }
}
