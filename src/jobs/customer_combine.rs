//! Combined daily customer file (`COMBINECUSTALL`).
//!
//! The daily CIS customer extract is joined to the latest individual record
//! of each customer and to the SALES, RESTR and CITZN demographic code
//! descriptions. Phone numbers and the address reference are zero-padded,
//! the open date is reordered to `YYYYMMDD` and the twenty high-risk codes
//! are packed into `HRCALL`.

use chrono::{NaiveDate, NaiveTime};

use crate::classify::{Output, RuleSet};
use crate::dedup::{Retention, unique};
use crate::error::Result;
use crate::filter::{Expr, filter_table};
use crate::join::{JoinSpec, JoinType, join};
use crate::normalize::{ColumnOp, normalize};
use crate::reader::InputSpec;
use crate::table::Table;
use crate::writer::OutputSet;

use super::{Job, JobContext, JobReport, mmddyyyy_as_yyyymmdd};

pub const CUSTOMERS: &str = "CUSTDAILY";
pub const INDIVIDUALS: &str = "DAILYINDV";
pub const DEMOGRAPHICS: &str = "DEMOCODE";

/// Width of phone numbers and the address reference
pub const PHONE_WIDTH: usize = 11;

/// Number of high-risk customer codes `HRC01..HRC20`
pub const HIGH_RISK_CODES: usize = 20;

/// Open date carried by customers migrated without one
pub const MIGRATED_OPEN_DATE: &str = "00002000000";
pub const MIGRATED_OPEN_DATE_YMD: &str = "20000101";

pub const OUTPUT_COLUMNS: &[&str] = &[
    "RUNTIMESTAMP", "CUSTNOX", "ADDREFX", "CUSTNAME", "PRIPHONEX", "SECPHONEX", "MOBILEPHX", "FAXX", "ALIASKEY",
    "ALIAS", "PROCESSTIME", "CUSTSTAT", "TAXCODE", "TAXID", "CUSTBRCH", "COSTCTR", "CUSTMNTDATE", "CUSTLASTOPER",
    "PRIM_OFF", "SEC_OFF", "PRIM_LN_OFF", "SEC_LN_OFF", "RACE", "RESIDENCY", "CITIZENSHIP", "OPENDT", "HRCALL",
    "EXPERIENCE", "HOBBIES", "RELIGION", "LANGUAGE", "INST_SEC", "CUST_CODE", "CUSTCONSENT", "BASICGRPCODE",
    "MSICCODE", "MASCO2008", "INCOME", "EDUCATION", "OCCUP", "MARITALSTAT", "OWNRENT", "EMPNAME", "DOBDOR",
    "SICCODE", "CORPSTATUS", "NETWORTH", "LAST_UPDATE_DATE", "LAST_UPDATE_TIME", "LAST_UPDATE_OPER", "PRCOUNTRY",
    "EMPLOYMENT_TYPE", "EMPLOYMENT_SECTOR", "EMPLOYMENT_LAST_UPDATE", "BNMID", "LONGNAME", "INDORG", "RESDESC",
    "SALDESC", "CTZDESC",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerCombineJob;

/// A demographic code category and the columns its lookup is joined on
#[derive(Debug, Clone, Copy)]
pub struct DemographicCode {
    pub category: &'static str,
    /// Column of the code table holding the code
    pub code_column: &'static str,
    /// Customer column the code is copied from
    pub customer_column: &'static str,
    pub key: &'static str,
    pub description: &'static str,
}

pub const DEMOGRAPHIC_CODES: [DemographicCode; 3] = [
    DemographicCode {
        category: "RESTR",
        code_column: "DEMOCODE",
        customer_column: "RESIDENCY",
        key: "RESTR",
        description: "RESDESC",
    },
    DemographicCode {
        category: "SALES",
        code_column: "DEMOCODE",
        customer_column: "CORPSTATUS",
        key: "SALES",
        description: "SALDESC",
    },
    DemographicCode {
        category: "CITZN",
        code_column: "DEMOCODX",
        customer_column: "CITIZENSHIP",
        key: "CITZN",
        description: "CTZDESC",
    },
];

/// Control date and wall-clock time as `YYYYMMDDHHMMSS`
#[must_use]
pub fn run_timestamp(control_date: NaiveDate, time: NaiveTime) -> String {
    format!("{}{}", control_date.format("%Y%m%d"), time.format("%H%M%S"))
}

fn high_risk_columns() -> Vec<String> {
    (1..=HIGH_RISK_CODES).map(|n| format!("HRC{n:02}")).collect()
}

/// Padded contact fields, `OPENDT` and `HRCALL`, one row per customer
pub fn customer_base(customers: &Table, width: usize) -> Result<Table> {
    let padded = |column: &str, alias: &str, width: usize| ColumnOp::ZeroPad {
        column: column.to_string(),
        width,
        alias: Some(alias.to_string()),
    };
    let mut ops = vec![
        padded("CUSTNO", "CUSTNOX", width),
        padded("PRIPHONE", "PRIPHONEX", PHONE_WIDTH),
        padded("SECPHONE", "SECPHONEX", PHONE_WIDTH),
        padded("MOBILEPH", "MOBILEPHX", PHONE_WIDTH),
        padded("FAX", "FAXX", PHONE_WIDTH),
        padded("ADDREF", "ADDREFX", PHONE_WIDTH),
        ColumnOp::Copy {
            from: "CUSTOPENDATE".to_string(),
            alias: "CUSTOPEN".to_string(),
        },
        ColumnOp::CastUtf8("CUSTOPEN".to_string()),
    ];
    ops.extend(mmddyyyy_as_yyyymmdd("CUSTOPEN", "OPENDT"));
    ops.push(ColumnOp::Concat {
        columns: high_risk_columns(),
        alias: "HRCALL".to_string(),
        pad: Some((3, '0')),
    });
    let customers = normalize(customers, &ops)?;

    let customers = RuleSet::new("OPENDT")
        .when(Expr::eq_str("CUSTOPEN", MIGRATED_OPEN_DATE), Output::lit(MIGRATED_OPEN_DATE_YMD))
        .otherwise(Output::col("OPENDT"))
        .apply(&customers, "OPENDT")?;
    unique(&customers, &["CUSTNOX"], &Retention::First)
}

/// The latest individual record of each customer
pub fn latest_individuals(individuals: &Table, width: usize) -> Result<Table> {
    let individuals = filter_table(individuals, &Expr::IsNotNull("CUSTNO".to_string()))?;
    let individuals = normalize(
        &individuals,
        &[ColumnOp::ZeroPad {
            column: "CUSTNO".to_string(),
            width,
            alias: Some("CUSTNOX".to_string()),
        }],
    )?;
    unique(&individuals, &["CUSTNOX"], &Retention::Last)
}

/// Code descriptions of one demographic category, keyed by `code.key`
pub fn demographic_lookup(demographics: &Table, code: &DemographicCode) -> Result<Table> {
    let lookup = filter_table(demographics, &Expr::eq_str("DEMOCATEGORY", code.category))?;
    let lookup = normalize(
        &lookup,
        &[
            ColumnOp::select(&[code.code_column, "CODEDESC"]),
            ColumnOp::rename(&[(code.code_column, code.key), ("CODEDESC", code.description)]),
            ColumnOp::CastUtf8(code.key.to_string()),
            ColumnOp::Trim(code.key.to_string()),
        ],
    )?;
    unique(&lookup, &[code.key], &Retention::First)
}

/// The combined customer rows in output layout
pub fn combine_customers(
    ctx: &JobContext<'_>,
    customers: &Table,
    individuals: &Table,
    demographics: &Table,
    timestamp: &str,
) -> Result<Table> {
    let width = ctx.config.key_width;
    let customers = customer_base(customers, width)?;
    ctx.preview(&customers, "CIS");
    let individuals = latest_individuals(individuals, width)?;
    ctx.preview(&individuals, "INDVDLY");

    let merged = join(
        &customers,
        &individuals,
        &ctx.padded(JoinSpec::on(&["CUSTNOX"], JoinType::Left)),
    )?;
    let mut ops = vec![ColumnOp::literal("RUNTIMESTAMP", timestamp)];
    for code in &DEMOGRAPHIC_CODES {
        ops.push(ColumnOp::Copy {
            from: code.customer_column.to_string(),
            alias: code.key.to_string(),
        });
        ops.push(ColumnOp::CastUtf8(code.key.to_string()));
        ops.push(ColumnOp::Trim(code.key.to_string()));
    }
    let mut merged = normalize(&merged, &ops)?;

    for code in &DEMOGRAPHIC_CODES {
        let lookup = demographic_lookup(demographics, code)?;
        merged = join(&merged, &lookup, &JoinSpec::on(&[code.key], JoinType::Left))?;
    }
    merged.select(OUTPUT_COLUMNS).map(|t| t.with_name("COMBINECUSTALL"))
}

impl Job for CustomerCombineJob {
    fn name(&self) -> &'static str {
        "customer_combine"
    }

    fn description(&self) -> &'static str {
        "Daily customers combined with individual details and demographic descriptions"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[CUSTOMERS, INDIVIDUALS, DEMOGRAPHICS]
    }

    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport> {
        let [customers, individuals, demographics] = ctx.load_many([
            InputSpec::all(CUSTOMERS),
            InputSpec::all(INDIVIDUALS),
            InputSpec::columns(DEMOGRAPHICS, &["DEMOCATEGORY", "DEMOCODE", "DEMOCODX", "CODEDESC"]),
        ])?;
        let timestamp = run_timestamp(ctx.control_date, chrono::Local::now().time());
        let combined = combine_customers(ctx, &customers, &individuals, &demographics, &timestamp)?;
        ctx.preview(&combined, "COMBINECUSTALL");

        let mut outputs = OutputSet::new(ctx.config);
        outputs.write(&combined, "COMBINECUSTALL")?;
        Ok(JobReport::new(self.name(), outputs.finish()))
    }
}
