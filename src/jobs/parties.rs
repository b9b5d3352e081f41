//! Related parties for the IMIS interface (`PARTIES`, `IMIS.csv`).
//!
//! Organisation relationships are expanded with the organisation's personal
//! (non-joint) accounts; individual relationships are carried over as they
//! are. Both are unioned into one table.

use crate::error::Result;
use crate::join::{JoinSpec, JoinType, join};
use crate::normalize::{ColumnOp, normalize};
use crate::reader::InputSpec;
use crate::table::{SortKey, Table};
use crate::writer::{DelimitedOptions, OutputSet};

use super::{Job, JobContext, JobReport};

pub const ACCOUNTS: &str = "RLENCA_NONJOINT";
pub const INDIVIDUALS: &str = "RLNSHIP_RLNIND";
pub const ORGANISATIONS: &str = "RLNSHIP_RLNORG";

const RELATIONSHIP_COLUMNS: [&str; 12] = [
    "CUSTNO1", "CUSTTYPE1", "RLENCODE1", "DESC1", "CUSTNO", "CUSTTYPE", "RLENCODE", "DESC", "CUSTNAME1", "ALIAS1",
    "CUSTNAME", "ALIAS",
];

pub const OUTPUT_COLUMNS: [&str; 14] = [
    "CUSTNO1", "CUSTTYPE1", "RLENCODE1", "DESC1", "CUSTNO", "CUSTTYPE", "RLENCODE", "DESC", "ACCTNO", "ACCTCODE",
    "CUSTNAME1", "ALIAS1", "CUSTNAME", "ALIAS",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct PartiesJob;

/// Relationship rows in interface naming, all text, customer numbers padded
fn interface_relationships(table: &Table, width: usize) -> Result<Table> {
    let mut ops = vec![
        ColumnOp::rename(&[
            ("INDORG1", "CUSTTYPE1"),
            ("INDORG2", "CUSTTYPE"),
            ("CODE1", "RLENCODE1"),
            ("CODE2", "RLENCODE"),
            ("CUSTNO2", "CUSTNO"),
            ("DESC2", "DESC"),
            ("CUSTNAME2", "CUSTNAME"),
            ("ALIAS2", "ALIAS"),
        ]),
        ColumnOp::select(&RELATIONSHIP_COLUMNS),
    ];
    ops.extend(RELATIONSHIP_COLUMNS.iter().map(|c| ColumnOp::CastUtf8((*c).to_string())));
    ops.push(ColumnOp::zero_pad("CUSTNO1", width));
    ops.push(ColumnOp::zero_pad("CUSTNO", width));
    normalize(table, &ops)?.sort_asc(&["CUSTNO"])
}

impl Job for PartiesJob {
    fn name(&self) -> &'static str {
        "parties"
    }

    fn description(&self) -> &'static str {
        "Organisation relationships with personal accounts plus individual relationships"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[ACCOUNTS, INDIVIDUALS, ORGANISATIONS]
    }

    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport> {
        let [accounts, individuals, organisations] = ctx.load_many([
            InputSpec::columns(ACCOUNTS, &["ACCTNO", "ACCTCODE", "CUSTNO"]),
            InputSpec::all(INDIVIDUALS),
            InputSpec::all(ORGANISATIONS),
        ])?;
        let width = ctx.config.key_width;

        let accounts = normalize(
            &accounts,
            &[
                ColumnOp::CastUtf8("ACCTNO".to_string()),
                ColumnOp::CastUtf8("ACCTCODE".to_string()),
                ColumnOp::zero_pad("CUSTNO", width),
            ],
        )?
        .sort_asc(&["CUSTNO"])?;
        ctx.preview(&accounts, "CA RELATIONSHIP");

        let individuals = interface_relationships(&individuals, width)?;
        let organisations = interface_relationships(&organisations, width)?;
        ctx.preview(&individuals, "CC RELATIONSHIP (INDIVIDUAL)");

        let with_accounts = join(
            &organisations,
            &accounts,
            &ctx.padded(JoinSpec::on(&["CUSTNO"], JoinType::Inner)),
        )?
        .select(&OUTPUT_COLUMNS)?
        .sort_by(&[SortKey::asc("CUSTNO"), SortKey::asc("ACCTCODE"), SortKey::asc("ACCTNO")])?;
        ctx.preview(&with_accounts, "CCRLEN + PRIM");

        let parties = Table::concat("PARTIES", &[with_accounts, individuals])?.select(&OUTPUT_COLUMNS)?;
        ctx.preview(&parties, "OUT1");

        let mut outputs = OutputSet::new(ctx.config);
        outputs.parquet(&parties, "PARTIES.parquet")?;
        outputs.delimited(&parties, "IMIS.csv", &DelimitedOptions::quoted_with_null_marker())?;
        Ok(JobReport::new(self.name(), outputs.finish()))
    }
}
