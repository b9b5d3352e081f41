//! Customer-to-customer relationships (`RLNSHIP`).
//!
//! Active CC relationships are enriched twice: once from the point of view of
//! the first customer (code description, name, alias, tax id) and once from
//! the second. The two views are combined per relationship and deduplicated
//! on the relationship key, with the removed rows kept in a side output.

use crate::dedup::{Retention, dedup_with_diff, unique};
use crate::error::Result;
use crate::filter::{BatchFilter, ExpiryFilter};
use crate::join::{JoinChain, JoinSpec, JoinType, join};
use crate::normalize::{ColumnOp, normalize};
use crate::reader::InputSpec;
use crate::table::Table;
use crate::writer::OutputSet;

use super::{Job, JobContext, JobReport};

pub const RELATIONSHIPS: &str = "RLENCC_FB";
pub const CODES: &str = "BANKCTRL_RLENCODE_CC";
pub const NAMES: &str = "PRIMNAME_OUT";
pub const ALIASES: &str = "ALLALIAS_OUT";
pub const CUSTOMERS: &str = "ALLCUST_FB";

/// Relationship key the output is unique on
pub const RELATIONSHIP_KEY: [&str; 4] = ["CUSTNO1", "CUSTNO2", "CODE1", "CODE2"];

/// Identifies one relationship record in both views
const IDENTITY: [&str; 5] = ["CUSTNO1", "CUSTNO2", "CODE1", "CODE2", "EFFDATE"];

const LEFT_COLUMNS: [&str; 12] = [
    "CUSTNO1", "INDORG1", "CODE1", "DESC1", "CUSTNO2", "CODE2", "EXPDATE", "CUSTNAME1", "ALIAS1", "OLDIC1",
    "BASICGRPCODE1", "EFFDATE",
];

const RIGHT_COLUMNS: [&str; 12] = [
    "CUSTNO2", "INDORG2", "CODE2", "DESC2", "CUSTNO1", "CODE1", "EXPDATE", "CUSTNAME2", "ALIAS2", "OLDIC2",
    "BASICGRPCODE2", "EFFDATE",
];

const OUTPUT_COLUMNS: [&str; 18] = [
    "CUSTNO1", "INDORG1", "CODE1", "DESC1", "CUSTNO2", "INDORG2", "CODE2", "DESC2", "EXPDATE", "CUSTNAME1",
    "ALIAS1", "CUSTNAME2", "ALIAS2", "OLDIC1", "BASICGRPCODE1", "OLDIC2", "BASICGRPCODE2", "EFFDATE",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipJob;

/// Reference extracts shared by both sides
struct References {
    codes: Table,
    names: Table,
    aliases: Table,
    customers: Table,
}

/// Reference tables keyed for one side of the relationship
struct Lookups {
    codes: Table,
    names: Table,
    aliases: Table,
    customers: Table,
}

fn rename_to_side(pairs: &[(&str, &str)], side: u8) -> ColumnOp {
    ColumnOp::Rename(
        pairs
            .iter()
            .map(|(from, to)| ((*from).to_string(), format!("{to}{side}")))
            .collect(),
    )
}

fn custno(side: u8) -> String {
    format!("CUSTNO{side}")
}

impl Lookups {
    fn for_side(ctx: &JobContext<'_>, sources: &References, side: u8) -> Result<Self> {
        let width = ctx.config.key_width;
        let cust = custno(side);
        let code = format!("CODE{side}");

        let codes = normalize(
            &sources.codes,
            &[
                ColumnOp::select(&["RLENTYPE", "RLENCODE", "RLENDESC"]),
                ColumnOp::rename(&[("RLENTYPE", "TYPE")]),
                rename_to_side(&[("RLENCODE", "CODE"), ("RLENDESC", "DESC")], side),
                ColumnOp::CastInt64(code.clone()),
            ],
        )?;
        let codes = unique(&codes, &[code.as_str()], &Retention::First)?;

        let names = normalize(
            &sources.names,
            &[
                ColumnOp::select(&["CUSTNO", "INDORG", "CUSTNAME"]),
                rename_to_side(&[("CUSTNO", "CUSTNO"), ("INDORG", "INDORG"), ("CUSTNAME", "CUSTNAME")], side),
                ColumnOp::zero_pad(&cust, width),
            ],
        )?;
        let names = unique(&names, &[cust.as_str()], &Retention::First)?;

        let aliases = normalize(
            &sources.aliases,
            &[
                ColumnOp::select(&["CUSTNO", "NAME_LINE"]),
                rename_to_side(&[("CUSTNO", "CUSTNO"), ("NAME_LINE", "ALIAS")], side),
                ColumnOp::zero_pad(&cust, width),
            ],
        )?
        .sort_asc(&[cust.as_str()])?;

        let customers = normalize(
            &sources.customers,
            &[
                ColumnOp::select(&["CUSTNO", "TAXID", "BASICGRPCODE"]),
                rename_to_side(&[("CUSTNO", "CUSTNO"), ("TAXID", "OLDIC"), ("BASICGRPCODE", "BASICGRPCODE")], side),
                ColumnOp::zero_pad(&cust, width),
            ],
        )?;
        let customers = unique(&customers, &[cust.as_str()], &Retention::First)?;

        Ok(Self {
            codes,
            names,
            aliases,
            customers,
        })
    }

    /// Attach code description, name, alias and customer details
    fn enrich(&self, ctx: &JobContext<'_>, label: &str, base: Table, side: u8) -> Result<Table> {
        let code = format!("CODE{side}");
        let cust = custno(side);
        let by_customer = ctx.padded(JoinSpec::on(&[cust.as_str()], JoinType::Left));
        Ok(JoinChain::new(label, base)
            .join(&self.codes, &JoinSpec::on(&[code.as_str()], JoinType::Left))?
            .then(|t| t.sort_asc(&[cust.as_str()]))?
            .join(&self.names, &by_customer)?
            .join(&self.aliases, &by_customer)?
            .join(&self.customers, &by_customer)?
            .finish())
    }
}

/// Active relationships with padded customer numbers and integer codes
pub fn active_relationships(ctx: &JobContext<'_>, raw: &Table) -> Result<Table> {
    let width = ctx.config.key_width;
    let selected = normalize(
        raw,
        &[
            ColumnOp::select(&["CUSTNO", "EFFDATE", "CUSTNO2", "CODE1", "CODE2", "EXPIRE_DATE"]),
            ColumnOp::rename(&[("CUSTNO", "CUSTNO1"), ("EXPIRE_DATE", "EXPDATE1")]),
            ColumnOp::Trim("EXPDATE1".to_string()),
        ],
    )?;
    let active = ExpiryFilter::new("EXPDATE1", ctx.control_date).filter(&selected)?;
    normalize(
        &active,
        &[
            ColumnOp::ParseDate {
                column: "EXPDATE1".to_string(),
                format: crate::filter::date::EXPIRY_DATE_FORMAT.to_string(),
                alias: "EXPDATE".to_string(),
            },
            ColumnOp::CastInt64("EFFDATE".to_string()),
            ColumnOp::CastInt64("CODE1".to_string()),
            ColumnOp::CastInt64("CODE2".to_string()),
            ColumnOp::zero_pad("CUSTNO1", width),
            ColumnOp::zero_pad("CUSTNO2", width),
        ],
    )?
    .sort_asc(&["CODE1"])
}

impl Job for RelationshipJob {
    fn name(&self) -> &'static str {
        "relationship"
    }

    fn description(&self) -> &'static str {
        "CC relationships enriched from both customers, deduplicated on the relationship key"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[RELATIONSHIPS, CODES, NAMES, ALIASES, CUSTOMERS]
    }

    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport> {
        let [raw, codes, names, aliases, customers] = ctx.load_many([
            InputSpec::all(RELATIONSHIPS),
            InputSpec::columns(CODES, &["RLENTYPE", "RLENCODE", "RLENDESC"]),
            InputSpec::columns(NAMES, &["CUSTNO", "INDORG", "CUSTNAME"]),
            InputSpec::columns(ALIASES, &["CUSTNO", "NAME_LINE"]),
            InputSpec::columns(CUSTOMERS, &["CUSTNO", "TAXID", "BASICGRPCODE"]),
        ])?;
        let references = References {
            codes,
            names,
            aliases,
            customers,
        };
        let relationships = active_relationships(ctx, &raw)?;
        ctx.preview(&relationships, "CC FILE");

        // First customer's view
        let left_lookups = Lookups::for_side(ctx, &references, 1)?;
        let left = left_lookups
            .enrich(ctx, "IDX_L", relationships, 1)?
            .select(&LEFT_COLUMNS)?
            .with_name("LEFTOUT");
        ctx.preview(&left, "LEFTOUT");

        // Second customer's view of the same relationships
        let right_lookups = Lookups::for_side(ctx, &references, 2)?;
        let right_base = normalize(
            &left,
            &[ColumnOp::DateParts {
                column: "EXPDATE".to_string(),
                prefix: "EXP".to_string(),
            }],
        )?
        .sort_asc(&["CODE2"])?;
        let right = right_lookups
            .enrich(ctx, "IDX_R", right_base, 2)?
            .select(&RIGHT_COLUMNS)?
            .with_name("RIGHTOUT");
        ctx.preview(&right, "RIGHTOUT");

        let combined = join(
            &left,
            &right,
            &ctx.padded(JoinSpec::on(&IDENTITY, JoinType::Left)).with_suffix("_r"),
        )?
        .select(&OUTPUT_COLUMNS)?
        .with_name("RLNSHIP");

        let outcome = dedup_with_diff(&combined, &RELATIONSHIP_KEY, &Retention::First)?;
        let unique = outcome.unique.sort_asc(&["CUSTNO1"])?;
        ctx.preview(&unique, "RLNSHIP");
        ctx.preview(&outcome.duplicates, "RLNSHIP_DUPLICATES");

        let mut outputs = OutputSet::new(ctx.config);
        outputs.write(&unique, "RLNSHIP")?;
        outputs.write(&outcome.duplicates, "RLNSHIP_DUPLICATES")?;
        Ok(JobReport::new(self.name(), outputs.finish()))
    }
}
