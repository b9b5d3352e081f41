//! Batch reconciliation of CIS/CCR mainframe extracts.
//!
//! Source extracts are read from Parquet into [`Table`]s, normalized, joined
//! on zero-padded customer and account numbers, de-duplicated and classified,
//! then written back out as Parquet, delimited text and fixed-width files.
//! Each report is a [`jobs::Job`] run against a shared [`jobs::JobContext`].

pub mod classify;
pub mod config;
pub mod dedup;
pub mod error;
pub mod filter;
pub mod jobs;
pub mod join;
pub mod normalize;
pub mod reader;
pub mod table;
pub mod utils;
pub mod writer;

// Core types
pub use config::PipelineConfig;
pub use error::{ReconError, Result};
pub use table::{SortKey, Table};

// Table operations
pub use classify::{Output, RangeTable, RuleSet, add_match_columns};
pub use dedup::{DedupOutcome, Retention, dedup_with_diff, unique};
pub use filter::{Expr, LiteralValue, filter_table};
pub use join::{JoinChain, JoinSpec, JoinType, KeyFormat, join};
pub use normalize::{ColumnOp, normalize};

// Input and output
pub use reader::{InputSpec, load_input, read_parquet};
pub use writer::{DelimitedOptions, FieldSpec, FixedWidthLayout, OutputFile, OutputSet};

// Jobs
pub use jobs::{Job, JobContext, JobReport, all_jobs, job_from_name, run_job};

// Arrow types
pub use arrow::record_batch::RecordBatch;
