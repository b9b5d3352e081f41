//! Account owners with their customer-to-customer relationships (`CISOWNER`).

use crate::classify::{Output, RuleSet};
use crate::dedup::{Retention, unique};
use crate::error::Result;
use crate::filter::{Expr, filter_table};
use crate::join::{JoinSpec, JoinType, join};
use crate::normalize::{ColumnOp, normalize};
use crate::reader::InputSpec;
use crate::table::{SortKey, Table};
use crate::writer::OutputSet;

use super::{Job, JobContext, JobReport};

pub const DEPOSITS: &str = "DP";
pub const SAVINGS_AND_FIXED: &str = "CISDEMO_SAFD";
pub const LOANS: &str = "CISDEMO_LN";
pub const CC_RELATIONSHIPS: &str = "CISRLCC";

/// Relationship role of the primary account holder
pub const PRIMARY_HOLDER: &str = "901";

pub const OUTPUT_COLUMNS: [&str; 7] = ["ACCTCODE", "ACCTNOC", "CUSTNO", "RLENCODE", "CODE1", "CUST2", "CODE2"];

#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerJob;

/// Application code from the two-digit account prefix
#[must_use]
pub fn account_code_rules() -> RuleSet {
    RuleSet::new("ACCTCODE")
        .when(Expr::in_strs("ACCTNOR", &["01", "03", "04", "05", "06", "07"]), Output::lit("DP"))
        .when(Expr::in_strs("ACCTNOR", &["02", "08"]), Output::lit("LN"))
}

/// Primary holders of every account, with their application code
pub fn primary_holders(accounts: &Table, width: usize) -> Result<Table> {
    let mut ops = vec![
        ColumnOp::zero_pad("ACCTNOC", width),
        ColumnOp::zero_pad("CUSTNO", width),
    ];
    if !accounts.has_column("ACCTNOR") {
        ops.push(ColumnOp::Slice {
            column: "ACCTNOC".to_string(),
            start: 0,
            len: Some(2),
            alias: "ACCTNOR".to_string(),
        });
    }
    let accounts = account_code_rules().apply(&normalize(accounts, &ops)?, "ACCTCODE")?;
    filter_table(&accounts, &Expr::eq_str("PRISEC", PRIMARY_HOLDER))?.sort_asc(&["ACCTNOC"])
}

/// Relationships seen from the second customer
pub fn flipped_relationships(relationships: &Table, width: usize) -> Result<Table> {
    normalize(
        relationships,
        &[
            ColumnOp::select(&["CUST1", "CODE1", "CUST2", "CODE2"]),
            ColumnOp::rename(&[("CUST1", "CUST2"), ("CODE1", "CODE2"), ("CUST2", "CUST1"), ("CODE2", "CODE1")]),
            ColumnOp::select(&["CUST1", "CODE1", "CUST2", "CODE2"]),
            ColumnOp::zero_pad("CUST1", width),
            ColumnOp::zero_pad("CUST2", width),
        ],
    )
}

impl Job for OwnerJob {
    fn name(&self) -> &'static str {
        "owner"
    }

    fn description(&self) -> &'static str {
        "Primary account holders joined to their CC relationships"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[DEPOSITS, SAVINGS_AND_FIXED, LOANS, CC_RELATIONSHIPS]
    }

    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport> {
        let [deposits, savings, loans, relationships] = ctx.load_many([
            InputSpec::all(DEPOSITS),
            InputSpec::all(SAVINGS_AND_FIXED),
            InputSpec::all(LOANS),
            InputSpec::columns(CC_RELATIONSHIPS, &["CUST1", "CODE1", "CUST2", "CODE2"]),
        ])?;
        let width = ctx.config.key_width;

        let accounts = Table::concat("CCRFILE", &[deposits, savings, loans])?;
        let holders = primary_holders(&accounts, width)?;
        ctx.preview(&holders, "PRIMARY HOLDERS");

        let flipped = flipped_relationships(&relationships, width)?;
        ctx.preview(&flipped, "FLIPPED");

        let merged = join(
            &holders,
            &flipped,
            &ctx.padded(JoinSpec::left_right(&["CUSTNO"], &["CUST1"], JoinType::Inner)),
        )?
        .select(&OUTPUT_COLUMNS)?
        .sort_by(&[SortKey::asc("ACCTNOC"), SortKey::asc("CUSTNO"), SortKey::asc("CUST2")])?;
        ctx.preview(&merged, "MATCHED");

        let owners = unique(&merged, &[], &Retention::First)?.with_name("CISOWNER");
        let mut outputs = OutputSet::new(ctx.config);
        outputs.parquet(&owners, "CISOWNER.parquet")?;
        Ok(JobReport::new(self.name(), outputs.finish()))
    }
}
