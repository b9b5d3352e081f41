//! Customer names with their long-name remark (`CISNAME.OUT`).

use crate::dedup::{Retention, unique};
use crate::error::Result;
use crate::join::{JoinSpec, JoinType, join};
use crate::normalize::{ColumnOp, normalize};
use crate::reader::InputSpec;
use crate::table::Table;
use crate::writer::OutputSet;

use super::{Job, JobContext, JobReport};

pub const NAMES: &str = "CISNAME_TEMP";
pub const REMARKS: &str = "CISRMRK_LONGNAME";

pub const OUTPUT_FILE: &str = "CISNAME_OUT.parquet";

const NAME_COLUMNS: [&str; 7] = ["CUSTNO", "CUSTNAME", "ADREFNO", "PRIPHONE", "SECPHONE", "CUSTTYPE", "MOBILEPHONE"];

const REMARK_COLUMNS: [&str; 9] = [
    "BANKNO", "APPLCODE", "CUSTNO", "EFFDATE", "RMKKEYWORD", "LONGNAME", "RMKOPERATOR", "EXPIREDATE", "LASTMNTDATE",
];

pub const OUTPUT_COLUMNS: [&str; 9] = [
    "CUSTNO", "CUSTNAME", "ADREFNO", "PRIPHONE", "SECPHONE", "CUSTTYPE", "CUSTNAME2", "MOBILEPHONE", "LONGNAME",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerNameJob;

/// Select `columns` as text with the customer number padded, one row per customer
fn one_per_customer(table: &Table, columns: &[&str], width: usize) -> Result<Table> {
    let mut ops = vec![ColumnOp::select(columns)];
    ops.extend(columns.iter().map(|c| ColumnOp::CastUtf8((*c).to_string())));
    ops.push(ColumnOp::zero_pad("CUSTNO", width));
    unique(&normalize(table, &ops)?, &["CUSTNO"], &Retention::First)
}

/// Every named customer with the long name from its remark, if any
pub fn names_with_long_names(ctx: &JobContext<'_>, names: &Table, remarks: &Table) -> Result<Table> {
    let width = ctx.config.key_width;
    let names = one_per_customer(names, &NAME_COLUMNS, width)?;
    let names = normalize(
        &names,
        &[ColumnOp::Copy {
            from: "CUSTNAME".to_string(),
            alias: "CUSTNAME2".to_string(),
        }],
    )?;
    ctx.preview(&names, "NAME");

    let remarks = one_per_customer(remarks, &REMARK_COLUMNS, width)?;
    ctx.preview(&remarks, "REMARKS");

    join(&names, &remarks, &ctx.padded(JoinSpec::on(&["CUSTNO"], JoinType::Left)))?
        .sort_asc(&["CUSTNO"])?
        .select(&OUTPUT_COLUMNS)
        .map(|t| t.with_name("CISNAME_OUT"))
}

impl Job for CustomerNameJob {
    fn name(&self) -> &'static str {
        "customer_name"
    }

    fn description(&self) -> &'static str {
        "Customer names merged with their long-name remarks"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[NAMES, REMARKS]
    }

    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport> {
        let [names, remarks] = ctx.load_many([
            InputSpec::columns(NAMES, &NAME_COLUMNS),
            InputSpec::columns(REMARKS, &REMARK_COLUMNS),
        ])?;
        let merged = names_with_long_names(ctx, &names, &remarks)?;
        ctx.preview(&merged, "MERGE");

        let mut outputs = OutputSet::new(ctx.config);
        outputs.parquet(&merged, OUTPUT_FILE)?;
        Ok(JobReport::new(self.name(), outputs.finish()))
    }
}
