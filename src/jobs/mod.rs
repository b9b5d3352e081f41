//! Report jobs
//!
//! Each job re-derives one family of CIS/CCR report datasets from the
//! extracts in the input directory. Jobs are looked up by name with
//! [`job_from_name`] and run against a shared [`JobContext`].

pub mod accounts;
pub mod address;
pub mod customer_combine;
pub mod customer_name;
pub mod customer_report;
pub mod deposit_address;
pub mod identity;
pub mod owner;
pub mod parties;
pub mod relationship;
pub mod taxid;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::config::PipelineConfig;
use crate::error::{ReconError, Result};
use crate::filter::resolve_control_date;
use crate::join::{JoinSpec, KeyFormat};
use crate::normalize::ColumnOp;
use crate::reader::{InputSpec, load_input, load_inputs, resolve_input};
use crate::table::Table;
use crate::writer::OutputFile;

pub use accounts::AccountSummaryJob;
pub use address::AddressJob;
pub use customer_combine::CustomerCombineJob;
pub use customer_name::CustomerNameJob;
pub use customer_report::CustomerReportJob;
pub use deposit_address::DepositAddressJob;
pub use identity::IdentityJob;
pub use owner::OwnerJob;
pub use parties::PartiesJob;
pub use relationship::RelationshipJob;
pub use taxid::TaxIdJob;

/// Name of the optional control table holding the reporting date
pub const CONTROL_TABLE: &str = "CTRLDATE";

/// A batch job producing one or more output files
pub trait Job: Send + Sync {
    /// Name used on the command line
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Input extracts the job reads
    fn inputs(&self) -> &'static [&'static str];

    /// Run the job to completion
    fn run(&self, ctx: &JobContext<'_>) -> Result<JobReport>;
}

/// What a job run produced
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job: String,
    pub outputs: Vec<OutputFile>,
    pub elapsed: Duration,
}

impl JobReport {
    #[must_use]
    pub fn new(job: &str, outputs: Vec<OutputFile>) -> Self {
        Self {
            job: job.to_string(),
            outputs,
            elapsed: Duration::ZERO,
        }
    }

    /// Rows written to the output with this file name
    #[must_use]
    pub fn rows(&self, file_name: &str) -> Option<usize> {
        self.outputs
            .iter()
            .find(|o| o.path.file_name().is_some_and(|n| n == file_name))
            .map(|o| o.rows)
    }
}

/// Settings and shared state for a job run
#[derive(Debug, Clone)]
pub struct JobContext<'a> {
    pub config: &'a PipelineConfig,
    pub control_date: NaiveDate,
}

impl<'a> JobContext<'a> {
    /// Build a context, resolving the control date
    ///
    /// The configured date wins; otherwise the first row of the control table
    /// is used when that extract exists, and today's date when it does not.
    pub fn new(config: &'a PipelineConfig) -> Result<Self> {
        let control = if config.control_date.is_none() && resolve_input(config, CONTROL_TABLE).exists() {
            Some(load_input(config, InputSpec::all(CONTROL_TABLE))?)
        } else {
            None
        };
        let control_date = resolve_control_date(config.control_date, control.as_ref())?;
        log::info!("Control date {control_date}");
        Ok(Self { config, control_date })
    }

    #[must_use]
    pub fn with_control_date(config: &'a PipelineConfig, control_date: NaiveDate) -> Self {
        Self { config, control_date }
    }

    pub fn load(&self, spec: InputSpec<'_>) -> Result<Table> {
        load_input(self.config, spec)
    }

    pub fn load_all(&self, specs: &[InputSpec<'_>]) -> Result<Vec<Table>> {
        load_inputs(self.config, specs)
    }

    /// Load a fixed set of inputs, destructurable in request order
    pub fn load_many<const N: usize>(&self, specs: [InputSpec<'_>; N]) -> Result<[Table; N]> {
        let tables = self.load_all(&specs)?;
        let loaded = tables.len();
        tables.try_into().map_err(|_| {
            ReconError::RuleError(format!("expected {N} input tables, loaded {loaded}"))
        })
    }

    /// Padded-key format every customer and account number should have
    #[must_use]
    pub fn key_format(&self) -> KeyFormat {
        KeyFormat::Digits(self.config.key_width)
    }

    /// Require padded keys on both sides of a join on customer or account numbers
    #[must_use]
    pub fn padded(&self, spec: JoinSpec) -> JoinSpec {
        spec.with_key_format(self.key_format(), self.config.strict_keys)
    }

    pub fn preview(&self, table: &Table, label: &str) {
        table.log_preview(label, self.config.preview_rows);
    }

    #[must_use]
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.config.output_path(file_name)
    }
}

/// Steps adding `alias` as `YYYYMMDD` from a `MMDDYYYY` prefixed text column
pub(crate) fn mmddyyyy_as_yyyymmdd(column: &str, alias: &str) -> Vec<ColumnOp> {
    let parts = [("YY", 4, 4), ("MM", 0, 2), ("DD", 2, 2)];
    let names = parts.iter().map(|(part, _, _)| format!("{alias}_{part}")).collect::<Vec<_>>();
    let mut ops = parts
        .iter()
        .zip(&names)
        .map(|((_, start, len), name)| ColumnOp::Slice {
            column: column.to_string(),
            start: *start,
            len: Some(*len),
            alias: name.clone(),
        })
        .collect::<Vec<_>>();
    ops.push(ColumnOp::Concat {
        columns: names.clone(),
        alias: alias.to_string(),
        pad: None,
    });
    ops.push(ColumnOp::Drop(names));
    ops
}

/// Create a job from its command-line name
pub fn job_from_name(name: &str) -> Result<Arc<dyn Job>> {
    match name.to_lowercase().as_str() {
        "relationship" | "ccrccrln" => Ok(Arc::new(RelationshipJob)),
        "parties" | "ccrccrl1" => Ok(Arc::new(PartiesJob)),
        "identity" | "ccrnidic" => Ok(Arc::new(IdentityJob)),
        "taxid" | "ccrtax3b" => Ok(Arc::new(TaxIdJob)),
        "owner" | "ccrowner" => Ok(Arc::new(OwnerJob)),
        "address" | "ccrsadr4" => Ok(Arc::new(AddressJob)),
        "deposit_address" | "ccrsaddp" => Ok(Arc::new(DepositAddressJob)),
        "accounts" | "cicmdrpt" => Ok(Arc::new(AccountSummaryJob)),
        "customer_report" | "cicmdrpt2" => Ok(Arc::new(CustomerReportJob)),
        "customer_combine" | "ciciscom" => Ok(Arc::new(CustomerCombineJob)),
        "customer_name" | "ccrnmx3b" => Ok(Arc::new(CustomerNameJob)),
        _ => Err(ReconError::UnknownJob(name.to_string())),
    }
}

/// Every job, in the order they run with `--all`
#[must_use]
pub fn all_jobs() -> Vec<Arc<dyn Job>> {
    vec![
        Arc::new(RelationshipJob),
        Arc::new(PartiesJob),
        Arc::new(IdentityJob),
        Arc::new(TaxIdJob),
        Arc::new(OwnerJob),
        Arc::new(AddressJob),
        Arc::new(DepositAddressJob),
        Arc::new(AccountSummaryJob),
        Arc::new(CustomerReportJob),
        Arc::new(CustomerCombineJob),
        Arc::new(CustomerNameJob),
    ]
}

/// Run a job, timing it and logging its outputs
pub fn run_job(job: &dyn Job, ctx: &JobContext<'_>) -> Result<JobReport> {
    let start = Instant::now();
    log::info!("Running {} ({})", job.name(), job.description());
    let mut report = job.run(ctx)?;
    report.elapsed = start.elapsed();
    for output in &report.outputs {
        log::info!("{}: {} rows -> {}", job.name(), output.rows, output.path.display());
    }
    log::info!("Finished {} in {:?}", job.name(), report.elapsed);
    Ok(report)
}
