//! Deposit account summary (`ACCTSUMM`).
//!
//! Trial-balance records of the deposit report are turned into one summary
//! row per account: padded account and branch numbers, the application code
//! from the account number range (overridden for foreign-currency products),
//! the account status and the ledger balance in ringgit.

use arrow::array::Float64Array;
use arrow::compute::cast;
use arrow::compute::kernels::numeric::div;
use arrow::datatypes::DataType;

use crate::classify::tables::{FCY_CA_PRODUCTS, FCY_FD_PRODUCTS};
use crate::classify::{Output, RuleSet, account_type_ranges};
use crate::dedup::{Retention, unique};
use crate::error::Result;
use crate::filter::{Expr, LiteralValue, filter_table};
use crate::join::{JoinSpec, JoinType, join};
use crate::normalize::{ColumnOp, normalize};
use crate::reader::InputSpec;
use crate::table::Table;
use crate::writer::OutputSet;

use super::{Job, JobContext, JobReport};

pub const BALANCES: &str = "DPTRBALS";
pub const BRANCHES: &str = "BRANCH";

/// Report number of the deposit trial balance
pub const DEPOSIT_REPORT: i64 = 1001;
/// Record formats carrying account balances
pub const BALANCE_FORMATS: [i64; 6] = [1, 10, 22, 19, 20, 21];

pub const OUTPUT_COLUMNS: [&str; 22] = [
    "ACCTNOC", "ACCTBRCH", "BRANCH_ABBR", "ACCTNAME40", "CLSEDATE", "OPENDATE", "PURPOSECD", "LEDGERBAL", "PRODTY",
    "BALHOLD", "CURBAL", "ODLIMIT", "CURRCODE", "OPENIND", "COSTCTR", "POSTIND", "APPL_CODE", "ACCT_TYPE",
    "ACCTSTATUS", "DATEOPEN", "DATECLSE", "BANKINDC",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct AccountSummaryJob;

/// `I` for Islamic cost centres, `C` for conventional
#[must_use]
pub fn bank_indicator_rules() -> RuleSet {
    RuleSet::new("BANKINDC")
        .when(
            Expr::And(vec![
                Expr::Gt("COSTCTR".to_string(), LiteralValue::Int(3000)),
                Expr::Lt("COSTCTR".to_string(), LiteralValue::Int(3999)),
            ]),
            Output::lit("I"),
        )
        .otherwise(Output::lit("C"))
}

/// Foreign-currency products override the range-derived application code
#[must_use]
pub fn foreign_currency_rules() -> RuleSet {
    RuleSet::new("APPL_CODE")
        .when(Expr::in_strs("PRODTY", FCY_FD_PRODUCTS), Output::lit("FCYFD"))
        .when(Expr::in_strs("PRODTY", FCY_CA_PRODUCTS), Output::lit("FCYCA"))
        .otherwise(Output::col("APPL_CODE"))
}

#[must_use]
pub fn account_status_rules() -> RuleSet {
    RuleSet::new("ACCTSTATUS")
        .when(
            Expr::Or(vec![Expr::is_null("OPENIND"), Expr::eq_str("OPENIND", "")]),
            Output::lit("ACTIVE"),
        )
        .when(Expr::in_strs("OPENIND", &["B", "C", "P"]), Output::lit("CLOSED"))
        .when(Expr::eq_str("OPENIND", "Z"), Output::lit("ZERO BALANCE"))
        .otherwise(Output::lit(""))
}

/// Amount in sen as ringgit; unparsable amounts become null
pub(crate) fn in_ringgit(table: &Table, column: &str, alias: &str) -> Result<Table> {
    let amounts = cast(table.column(column)?, &DataType::Float64)?;
    let ringgit = div(&amounts, &Float64Array::new_scalar(100.0))?;
    table.with_column(alias, ringgit)
}

fn yyyymmdd(column: &str, alias: &str) -> ColumnOp {
    ColumnOp::Slice {
        column: column.to_string(),
        start: 0,
        len: Some(8),
        alias: alias.to_string(),
    }
}

/// One abbreviation per three-digit branch number
pub fn branch_abbreviations(branches: &Table) -> Result<Table> {
    let branches = normalize(
        branches,
        &[
            ColumnOp::select(&["ACCTBRCH", "BRANCH_ABBR"]),
            ColumnOp::zero_pad("ACCTBRCH", 3),
            ColumnOp::CastUtf8("BRANCH_ABBR".to_string()),
        ],
    )?;
    unique(&branches, &["ACCTBRCH"], &Retention::First)
}

/// Summary rows for the balance records of deposit accounts
pub fn summarize_balances(balances: &Table, branches: &Table, width: usize) -> Result<Table> {
    let balances = filter_table(
        balances,
        &Expr::And(vec![
            Expr::eq("REPTNO", LiteralValue::Int(DEPOSIT_REPORT)),
            Expr::In("FMTCODE".to_string(), LiteralValue::ints(&BALANCE_FORMATS)),
        ]),
    )?;
    let balances = normalize(
        &balances,
        &[
            ColumnOp::ZeroPad {
                column: "ACCTNO".to_string(),
                width,
                alias: Some("ACCTNOC".to_string()),
            },
            ColumnOp::ZeroPad {
                column: "ACCTBRCH1".to_string(),
                width: 3,
                alias: Some("ACCTBRCH".to_string()),
            },
            ColumnOp::ZeroPad {
                column: "PRODTYPE".to_string(),
                width: 3,
                alias: Some("PRODTY".to_string()),
            },
            ColumnOp::Copy {
                from: "ACCTNAME".to_string(),
                alias: "ACCTNAME40".to_string(),
            },
        ],
    )?;
    let balances = bank_indicator_rules().apply(&balances, "BANKINDC")?;
    let balances = in_ringgit(&balances, "LEDGERBAL1", "LEDGERBAL")?;

    let fallback = balances.has_column("APPL_CODE").then_some("APPL_CODE");
    let balances = account_type_ranges()?.classify_column(&balances, "ACCTNOC", "APPL_CODE", fallback)?;
    let balances = foreign_currency_rules().apply(&balances, "APPL_CODE")?;

    let balances = filter_table(
        &balances,
        &Expr::And(vec![
            Expr::IsNotNull("PURPOSECD".to_string()),
            Expr::NotEq("PURPOSECD".to_string(), LiteralValue::str("")),
        ]),
    )?;
    let balances = normalize(
        &balances,
        &[
            ColumnOp::Copy {
                from: "PURPOSECD".to_string(),
                alias: "ACCT_TYPE".to_string(),
            },
            ColumnOp::CastUtf8("OPENDATE".to_string()),
            ColumnOp::CastUtf8("CLSEDATE".to_string()),
            yyyymmdd("OPENDATE", "DATEOPEN"),
            yyyymmdd("CLSEDATE", "DATECLSE"),
        ],
    )?;
    let balances = account_status_rules().apply(&balances, "ACCTSTATUS")?;

    join(&balances, &branch_abbreviations(branches)?, &JoinSpec::on(&["ACCTBRCH"], JoinType::Left))?
        .select(&OUTPUT_COLUMNS)?
        .sort_asc(&["ACCTBRCH"])
        .map(|t| t.with_name("ACCTSUMM"))
}

impl Job for AccountSummaryJob {
    fn name(&self) -> &'static str {
        "accounts"
    }

    fn description(&self) -> &'static str {
        "Deposit account summary from the trial-balance extract"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[BALANCES, BRANCHES]
    }

    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport> {
        let [balances, branches] = ctx.load_many([
            InputSpec::all(BALANCES),
            InputSpec::columns(BRANCHES, &["ACCTBRCH", "BRANCH_ABBR"]),
        ])?;
        let summary = summarize_balances(&balances, &branches, ctx.config.key_width)?;
        ctx.preview(&summary, "ACCTSUMM");

        let mut outputs = OutputSet::new(ctx.config);
        outputs.write(&summary, "ACCTSUMM")?;
        Ok(JobReport::new(self.name(), outputs.finish()))
    }
}
