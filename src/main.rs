use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;

use cis_recon::config::parse_control_date;
use cis_recon::{Job, JobContext, PipelineConfig, all_jobs, job_from_name, run_job};

#[derive(Parser)]
#[command(author, version, about = "Batch reconciliation of CIS/CCR mainframe extracts")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the available jobs and the extracts they read
    List,
    /// Run one or more jobs
    Run {
        /// Job names (e.g. `relationship`, `ccrsadr4`)
        jobs: Vec<String>,
        /// Run every job
        #[arg(long)]
        all: bool,
        /// JSON pipeline configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        input_dir: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Control date as YYYY-MM-DD or YYYYMMDD
        #[arg(long)]
        control_date: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Args::parse().command {
        Command::List => {
            for job in all_jobs() {
                println!("{:<16} {}", job.name(), job.description());
                println!("{:<16} inputs: {}", "", job.inputs().join(", "));
            }
            Ok(())
        }
        Command::Run {
            jobs,
            all,
            config,
            input_dir,
            output_dir,
            control_date,
        } => {
            let mut pipeline = match &config {
                Some(path) => PipelineConfig::from_json_file(path)
                    .with_context(|| format!("loading configuration {}", path.display()))?,
                None => PipelineConfig::default(),
            }
            .apply_env_overrides()?;
            if let Some(dir) = input_dir {
                pipeline.input_dir = dir;
            }
            if let Some(dir) = output_dir {
                pipeline.output_dir = dir;
            }
            if let Some(date) = control_date {
                pipeline.control_date = Some(parse_control_date(&date)?);
            }
            pipeline.validate()?;

            let selected = if all {
                all_jobs()
            } else if jobs.is_empty() {
                bail!("no jobs given; name one or more jobs or pass --all");
            } else {
                jobs.iter().map(|name| job_from_name(name)).collect::<cis_recon::Result<Vec<_>>>()?
            };

            let ctx = JobContext::new(&pipeline)?;
            for job in &selected {
                run_job(job.as_ref(), &ctx).with_context(|| format!("job {} failed", job.name()))?;
            }
            info!("Completed {} job(s)", selected.len());
            Ok(())
        }
    }
}
