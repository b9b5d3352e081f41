//! Daily identity files for individuals and organisations (`INDVDLY`, `ORGDLY`).
//!
//! The main customer file is split on `GENDER` (`O` marks an organisation).
//! Each half is matched with its identity detail file, which first picks up
//! any card application records on the same customer and id.

use crate::dedup::{Retention, unique};
use crate::error::Result;
use crate::filter::{Expr, LiteralValue, filter_table};
use crate::join::{JoinSpec, JoinType, join};
use crate::normalize::{ColumnOp, normalize};
use crate::reader::InputSpec;
use crate::table::{SortKey, Table};
use crate::writer::OutputSet;

use super::{Job, JobContext, JobReport};

pub const MAIN: &str = "CIDICUST_FB";
pub const INDIVIDUALS: &str = "CIDINDVT_FB";
pub const ORGANISATIONS: &str = "CIDIORGT_FB";
pub const CARDS: &str = "CIDICART_FB";

/// Customer, id type and id: the identity key
pub const IDENTITY_KEY: [&str; 3] = ["CISNO", "IDTYPE", "ID"];

const MAIN_COLUMNS: [&str; 7] = ["CISNO", "BANKNO", "MAIN_ENTITY_TYPE", "BRANCH", "CUSTNAME", "BIRTHDATE", "GENDER"];

const INDIVIDUAL_COLUMNS: [&str; 43] = [
    "CUSTNO", "IDTYPE", "ID", "CUSTBRANCH", "FIRST_CREATE_DATE", "FIRST_CREATE_TIME", "FIRST_CREATE_OPER",
    "LAST_UPDATE_DATE", "LAST_UPDATE_TIME", "LAST_UPDATE_OPER", "LONGNAME", "ENTITYTYPE", "BNM_ASSIGNED_ID",
    "OLDIC", "CITIZENSHIP", "PRCOUNTRY", "RESIDENCY_STATUS", "CUSTOMER_CODE", "ADDRLINE1", "ADDRLINE2",
    "ADDRLINE3", "ADDRLINE4", "ADDRLINE5", "POSTCODE", "TOWN_CITY", "STATE_CODE", "COUNTRY", "ADDR_LAST_UPDATE",
    "ADDR_LAST_UPTIME", "PHONE_HOME", "PHONE_BUSINESS", "PHONE_FAX", "PHONE_MOBILE", "PHONE_PAC", "EMPLOYER_NAME",
    "MASCO2008", "MASCO2012", "EMPLOYMENT_TYPE", "EMPLOYMENT_SECTOR", "EMPLOYMENT_LAST_UPDATE",
    "EMPLOYMENT_LAST_UPTIME", "INCOME_AMT", "ENABLE_TAB",
];

const ORGANISATION_COLUMNS: [&str; 36] = [
    "CUSTNO", "IDTYPE", "ID", "BRANCH", "FIRST_CREATE_DATE", "FIRST_CREATE_TIME", "FIRST_CREATE_OPER",
    "LAST_UPDATE_DATE", "LAST_UPDATE_TIME", "LAST_UPDATE_OPER", "LONG_NAME", "ENTITY_TYPE", "BNM_ASSIGNED_ID",
    "REGISTRATION_DATE", "MSIC2008", "RESIDENCY_STATUS", "CORPORATE_STATUS", "CUSTOMER_CODE", "CITIZENSHIP",
    "ADDR_LINE_1", "ADDR_LINE_2", "ADDR_LINE_3", "ADDR_LINE_4", "ADDR_LINE_5", "POSTCODE", "TOWN_CITY",
    "STATE_CODE", "COUNTRY", "ADDR_LAST_UPDATE", "ADDR_LAST_UPTIME", "PHONE_PRIMARY", "PHONE_SECONDARY",
    "PHONE_FAX", "PHONE_MOBILE", "PHONE_PAC", "ENABLE_TAB",
];

const CARD_COLUMNS: [&str; 12] = [
    "APPL_CODE", "APPL_NO", "PRI_SEC", "RELATIONSHIP", "CUSTNO", "IDTYPE", "ID", "AA_REF_NO", "EFF_DATE", "EFF_TIME",
    "LAST_MNT_DATE", "LAST_MNT_TIME",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityJob;

fn by_identity() -> [SortKey; 3] {
    IDENTITY_KEY.map(SortKey::asc)
}

/// Rename `CUSTNO` to `CISNO`, pad it, and make the id columns text
fn keyed_by_identity(table: &Table, width: usize) -> Result<Table> {
    normalize(
        table,
        &[
            ColumnOp::rename(&[("CUSTNO", "CISNO")]),
            ColumnOp::zero_pad("CISNO", width),
            ColumnOp::CastUtf8("IDTYPE".to_string()),
            ColumnOp::CastUtf8("ID".to_string()),
        ],
    )?
    .sort_by(&by_identity())
}

/// Build one daily file from the main-file rows matching `kind`
fn daily_file(
    ctx: &JobContext<'_>,
    name: &str,
    main: &Table,
    kind: &Expr,
    details: &Table,
    cards: &Table,
) -> Result<Table> {
    let main = filter_table(main, kind)?
        .select(&MAIN_COLUMNS)?
        .sort_asc(&["CISNO"])?;
    ctx.preview(&main, &format!("MAIN ({name})"));

    let details = join(
        details,
        cards,
        &ctx.padded(JoinSpec::on(&IDENTITY_KEY, JoinType::Left)),
    )?;
    ctx.preview(&details, &format!("CUSTINFO ({name})"));

    let merged = join(&main, &details, &ctx.padded(JoinSpec::on(&["CISNO"], JoinType::Inner)))?;
    unique(&merged, &IDENTITY_KEY, &Retention::First)?
        .sort_asc(&["CISNO"])
        .map(|t| t.with_name(name))
}

impl Job for IdentityJob {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn description(&self) -> &'static str {
        "Daily identity files for individuals and organisations"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[MAIN, INDIVIDUALS, ORGANISATIONS, CARDS]
    }

    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport> {
        let [main, individuals, organisations, cards] = ctx.load_many([
            InputSpec::columns(MAIN, &MAIN_COLUMNS),
            InputSpec::columns(INDIVIDUALS, &INDIVIDUAL_COLUMNS),
            InputSpec::columns(ORGANISATIONS, &ORGANISATION_COLUMNS),
            InputSpec::columns(CARDS, &CARD_COLUMNS),
        ])?;
        let width = ctx.config.key_width;

        let main = normalize(&main, &[ColumnOp::zero_pad("CISNO", width)])?;
        let individuals = keyed_by_identity(&individuals, width)?;
        let organisations = keyed_by_identity(&organisations, width)?;
        let cards = keyed_by_identity(&cards, width)?;
        ctx.preview(&cards, "CART FILE");

        let organisation = Expr::eq_str("GENDER", "O");
        let individual = Expr::NotEq("GENDER".to_string(), LiteralValue::str("O"));

        let indvdly = daily_file(ctx, "INDVDLY", &main, &individual, &individuals, &cards)?;
        let orgdly = daily_file(ctx, "ORGDLY", &main, &organisation, &organisations, &cards)?;
        ctx.preview(&indvdly, "FINAL INDIVIDUAL DATASET");
        ctx.preview(&orgdly, "FINAL ORGANISATION DATASET");

        let mut outputs = OutputSet::new(ctx.config);
        outputs.write(&indvdly, "INDVDLY")?;
        outputs.write(&orgdly, "ORGDLY")?;
        Ok(JobReport::new(self.name(), outputs.finish()))
    }
}
