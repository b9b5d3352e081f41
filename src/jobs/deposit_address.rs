//! Deposit account mailing addresses (`DAILY.ADDRACC`).

use crate::dedup::{Retention, unique};
use crate::error::Result;
use crate::filter::{Expr, LiteralValue, filter_table};
use crate::join::{JoinSpec, JoinType, KeyFormat, join};
use crate::normalize::{ColumnOp, normalize};
use crate::reader::InputSpec;
use crate::writer::{FieldSpec, FixedWidthLayout, OutputSet};

use super::{Job, JobContext, JobReport};

pub const OWNERS: &str = "ADDRAOWN_FB";
pub const DEPOSIT_ADDRESSES: &str = "DP_DAILY_ADDRACC";

pub const FIXED_WIDTH_FILE: &str = "DAILY.ADDRACC";

/// Width of the account number on the address extracts
pub const ACCOUNT_WIDTH: usize = 12;

/// Account numbers at or below this are not deposit accounts
pub const LOWEST_DEPOSIT_ACCOUNT: &str = "010000000000";

/// Number of name/address lines on a deposit address record
const ADDRESS_LINES: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct DepositAddressJob;

fn output_columns() -> Vec<String> {
    let mut columns = vec!["O_APPL_CODE".to_string(), "ACCTNO".to_string()];
    for n in 1..=ADDRESS_LINES {
        columns.push(format!("NA_LINE_TYP{n}"));
        columns.push(format!("ADD_NAME_{n}"));
    }
    columns
}

fn layout() -> FixedWidthLayout {
    let mut fields = vec![FieldSpec::column("O_APPL_CODE", 5), FieldSpec::column("ACCTNO", 20)];
    for n in 1..=ADDRESS_LINES {
        fields.push(FieldSpec::column(&format!("NA_LINE_TYP{n}"), 1));
        fields.push(FieldSpec::column(&format!("ADD_NAME_{n}"), 40));
    }
    FixedWidthLayout::new(fields)
}

fn deposit_accounts() -> Expr {
    Expr::Gt("ACCTNO".to_string(), LiteralValue::str(LOWEST_DEPOSIT_ACCOUNT))
}

impl Job for DepositAddressJob {
    fn name(&self) -> &'static str {
        "deposit_address"
    }

    fn description(&self) -> &'static str {
        "Mailing addresses of deposit accounts with a DP owner record"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[OWNERS, DEPOSIT_ADDRESSES]
    }

    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport> {
        let [owners, addresses] = ctx.load_many([
            InputSpec::columns(OWNERS, &["O_APPL_CODE", "ACCTNO"]),
            InputSpec::all(DEPOSIT_ADDRESSES),
        ])?;

        let owners = normalize(
            &owners,
            &[
                ColumnOp::zero_pad("ACCTNO", ACCOUNT_WIDTH),
                ColumnOp::Trim("O_APPL_CODE".to_string()),
            ],
        )?;
        let owners = filter_table(
            &owners,
            &Expr::And(vec![Expr::eq_str("O_APPL_CODE", "DP"), deposit_accounts()]),
        )?;
        let owners = unique(&owners, &["ACCTNO"], &Retention::First)?;
        ctx.preview(&owners, "AOWN");

        let addresses = normalize(
            &addresses,
            &[ColumnOp::zero_pad("ACCTNO", ACCOUNT_WIDTH), ColumnOp::drop(&["O_APPL_CODE"])],
        )?;
        let addresses = filter_table(&addresses, &deposit_accounts())?;
        let addresses = unique(&addresses, &["ACCTNO"], &Retention::First)?;
        ctx.preview(&addresses, "DEPOSIT ADDRESS");

        let columns = output_columns();
        let columns = columns.iter().map(String::as_str).collect::<Vec<_>>();
        let by_account = JoinSpec::on(&["ACCTNO"], JoinType::Inner)
            .with_key_format(KeyFormat::Digits(ACCOUNT_WIDTH), ctx.config.strict_keys);
        let merged = join(&addresses, &owners, &by_account)?
            .sort_asc(&["ACCTNO"])?
            .select(&columns)?
            .with_name("DAILY_ADDRACC");
        ctx.preview(&merged, "MERGED");

        let mut outputs = OutputSet::new(ctx.config);
        outputs.parquet(&merged, "DAILY_ADDRACC.parquet")?;
        outputs.fixed_width(&merged, FIXED_WIDTH_FILE, &layout())?;
        Ok(JobReport::new(self.name(), outputs.finish()))
    }
}
