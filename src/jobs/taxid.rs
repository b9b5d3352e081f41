//! Tax identifiers with restricted-holder matching (`TAXID`).
//!
//! Old and new identity numbers are merged per customer and then checked
//! against the restricted-holder list, once by the new number (without its
//! three-character prefix) and once by the old number.

use crate::classify::{Output, RuleSet, add_match_columns};
use crate::dedup::{Retention, unique};
use crate::error::Result;
use crate::filter::{Expr, filter_table};
use crate::join::{JoinSpec, JoinType, join};
use crate::normalize::{ColumnOp, normalize};
use crate::reader::InputSpec;
use crate::table::Table;
use crate::writer::OutputSet;

use super::{Job, JobContext, JobReport};

pub const OLD_IDS: &str = "OLDIC";
pub const NEW_IDS: &str = "NEWIC";
pub const RESTRICTED_HOLDERS: &str = "CISRHOLD";

const OLD_COLUMNS: [&str; 5] = ["CUSTNO", "CODE_OLD", "INDORG", "OLDIC", "CUSTBRCH"];
const NEW_COLUMNS: [&str; 5] = ["CUSTNO", "CODE_NEW", "NEWIC", "KEYFIELD1", "KEYFIELD2"];

pub const OUTPUT_COLUMNS: [&str; 7] = ["CUSTNO", "OLDIC", "NEWIC", "BUSREG", "CUSTBRCH", "RHOLD_IND", "MATCHID"];

#[derive(Debug, Clone, Copy, Default)]
pub struct TaxIdJob;

fn as_text(table: &Table, columns: &[&str]) -> Result<Table> {
    let ops = columns
        .iter()
        .map(|c| ColumnOp::CastUtf8((*c).to_string()))
        .collect::<Vec<_>>();
    normalize(table, &ops)
}

/// Distinct non-empty ids appearing in either id column of the holder list
pub fn restricted_ids(holders: &Table) -> Result<Table> {
    let column = |name: &str| -> Result<Table> {
        let ids = normalize(
            holders,
            &[
                ColumnOp::select(&[name]),
                ColumnOp::rename(&[(name, "ALIAS")]),
                ColumnOp::CastUtf8("ALIAS".to_string()),
            ],
        )?;
        filter_table(&ids, &Expr::eq_str("ALIAS", "").negate())
    };
    let all = Table::concat("RHOLD", &[column("ID1")?, column("ID2")?])?;
    unique(&all, &["ALIAS"], &Retention::First)?.sort_asc(&["ALIAS"])
}

/// Left join a one-column id list on `key`, flagging matched rows in `flag`
fn flag_matches(table: &Table, ids: &Table, key: &str, flag: &str) -> Result<Table> {
    let marked = normalize(
        ids,
        &[
            ColumnOp::rename(&[("ALIAS", key)]),
            ColumnOp::literal(flag, "1"),
        ],
    )?;
    join(table, &marked, &JoinSpec::on(&[key], JoinType::Left))
}

impl Job for TaxIdJob {
    fn name(&self) -> &'static str {
        "taxid"
    }

    fn description(&self) -> &'static str {
        "Old and new tax ids matched against the restricted-holder list"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[OLD_IDS, NEW_IDS, RESTRICTED_HOLDERS]
    }

    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport> {
        let [old_ids, new_ids, holders] = ctx.load_many([
            InputSpec::columns(OLD_IDS, &OLD_COLUMNS),
            InputSpec::columns(NEW_IDS, &NEW_COLUMNS),
            InputSpec::columns(RESTRICTED_HOLDERS, &["ID1", "ID2"]),
        ])?;
        let width = ctx.config.key_width;

        let old_ids = normalize(&as_text(&old_ids, &OLD_COLUMNS)?, &[ColumnOp::zero_pad("CUSTNO", width)])?
            .sort_asc(&["CUSTNO"])?;
        let new_ids = normalize(
            &as_text(&new_ids, &NEW_COLUMNS)?,
            &[
                ColumnOp::zero_pad("CUSTNO", width),
                ColumnOp::Slice {
                    column: "NEWIC".to_string(),
                    start: 3,
                    len: Some(20),
                    alias: "NEWIC1".to_string(),
                },
            ],
        )?
        .sort_asc(&["CUSTNO"])?;
        let restricted = restricted_ids(&holders)?;
        ctx.preview(&restricted, "RHOLD");

        let taxid = join(&old_ids, &new_ids, &ctx.padded(JoinSpec::on(&["CUSTNO"], JoinType::Left)))?;
        let taxid = RuleSet::new("BUSREG")
            .when(Expr::eq_str("INDORG", "O"), Output::col("NEWIC"))
            .apply(&taxid, "BUSREG")?;
        ctx.preview(&taxid, "TAXID FILE");

        let taxid = flag_matches(&taxid, &restricted, "NEWIC1", "C")?;
        let taxid = flag_matches(&taxid, &restricted, "OLDIC", "F")?;
        let taxid = add_match_columns(&taxid, "C", "F")?
            .sort_asc(&["CUSTNO"])?
            .select(&OUTPUT_COLUMNS)?
            .with_name("TAXID");
        ctx.preview(&taxid, "TAXID");

        let mut outputs = OutputSet::new(ctx.config);
        outputs.parquet(&taxid, "TAXID.parquet")?;
        Ok(JobReport::new(self.name(), outputs.finish()))
    }
}
