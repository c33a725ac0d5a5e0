//! Tech Dispatch - contractor schedule parsing and technician assignment
//!
//! # Usage
//!
//! ```bash
//! # Parse a paste and print the first-job digest
//! tech-dispatch parse --input schedule.txt --contractor SubT
//!
//! # Read from stdin, force a dialect, emit JSON
//! pbpaste | tech-dispatch parse --input - --format header_inline --json
//!
//! # Spreadsheet export, restricted to a date range
//! tech-dispatch table --input jobs.csv --contractor Tex-Star --from 2025-05-05 --to 2025-05-06
//!
//! # Dry-run assignment against a roster file
//! tech-dispatch assign --input schedule.txt --contractor SubT --roster roster.toml
//! ```
//!
//! # Environment Variables
//!
//! - `DISPATCH_CONFIG`: Path to the dispatch TOML (default: ./dispatch.toml)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use tech_dispatch::config::{ContractorDirectory, DigestFormat, DispatchConfig};
use tech_dispatch::logging;
use tech_dispatch::portal::{spawn_batch, RosterPortal, RunnerSettings, StatusLevel};
use tech_dispatch::schedule::{dispatch, JobRecord, ParserId};
use tech_dispatch::summary::{
    available_dates, build_first_job_summary, filter_by_date_range, normalize, render_html,
    render_plain, ScheduledJob,
};
use tech_dispatch::tabular::{read_records, DelimitedFile};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "tech-dispatch")]
#[command(about = "Contractor schedule parsing and technician assignment")]
#[command(version)]
struct CliArgs {
    /// Dispatch config TOML (overrides DISPATCH_CONFIG and ./dispatch.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for the per-run Output<MMDDHHMM>.txt log
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Parse a pasted schedule and print the first-job digest
    Parse {
        /// Pasted text file, or "-" for stdin
        #[arg(long)]
        input: String,

        /// Contractor label (see `labels`)
        #[arg(long)]
        contractor: Option<String>,

        /// Force a dialect instead of the contractor's or the sniffed one
        #[arg(long)]
        format: Option<ParserId>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Read a TSV/CSV spreadsheet export (columns Date..Tech, header row first)
    Table {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        contractor: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run the assignment loop against a roster file (dry run)
    Assign {
        /// Pasted text file, "-" for stdin, or a spreadsheet with --table
        #[arg(long)]
        input: String,

        #[arg(long)]
        contractor: String,

        /// Treat --input as a TSV/CSV spreadsheet export
        #[arg(long)]
        table: bool,

        #[arg(long)]
        format: Option<ParserId>,

        /// Roster TOML standing in for the work order portal
        #[arg(long, value_name = "FILE")]
        roster: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List configured contractor labels
    Labels,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// First date to keep (YYYY-MM-DD, inclusive)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last date to keep (YYYY-MM-DD, inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Render the digest as HTML
    #[arg(long)]
    html: bool,

    /// Print normalized jobs as JSON instead of the digest
    #[arg(long, conflicts_with = "html")]
    json: bool,

    /// Write the digest to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

// ============================================================================
// Configuration
// ============================================================================

fn load_config(explicit: Option<&Path>) -> Result<DispatchConfig> {
    // Config warnings go to stderr before the run log exists
    let early = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .finish();
    let _guard = tracing::subscriber::set_default(early);

    match explicit {
        Some(path) => DispatchConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(DispatchConfig::load()),
    }
}

// ============================================================================
// Input
// ============================================================================

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read schedule from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

fn parse_paste(
    input: &str,
    contractor: Option<&str>,
    format: Option<ParserId>,
    directory: &ContractorDirectory,
) -> Result<Vec<JobRecord>> {
    let text = read_input(input)?;
    let parsed = dispatch(&text, contractor, format, directory);
    if parsed.output.is_empty() {
        warn!(parser = %parsed.parser, "No jobs recognized in {}", input);
    }
    Ok(parsed.output.records)
}

fn read_table(
    path: &Path,
    contractor: Option<&str>,
    directory: &ContractorDirectory,
) -> Result<Vec<JobRecord>> {
    let mut source = DelimitedFile::open(path);
    let mut records = read_records(&mut source)
        .with_context(|| format!("Failed to read spreadsheet {}", path.display()))?
        .records;

    let label = contractor.map(|l| {
        directory
            .profile(l)
            .map_or_else(|| l.to_string(), |p| p.label.clone())
    });
    for record in &mut records {
        record.contractor_label.clone_from(&label);
    }
    Ok(records)
}

fn prepare_jobs(
    records: Vec<JobRecord>,
    directory: &ContractorDirectory,
    output: &OutputArgs,
) -> Vec<ScheduledJob> {
    let today = Local::now().date_naive();
    let report = normalize(records, today, directory);
    info!(
        jobs = report.jobs.len(),
        missing_technician = report.missing_technician.len(),
        unparseable_times = report.unparseable_times.len(),
        defaulted_dates = report.defaulted_dates,
        "Normalized jobs"
    );

    let dates: Vec<String> = available_dates(&report.jobs)
        .iter()
        .map(ToString::to_string)
        .collect();
    info!("Available dates: {}", dates.join(", "));

    let jobs = filter_by_date_range(report.jobs, output.from, output.to);
    if output.from.is_some() || output.to.is_some() {
        info!(kept = jobs.len(), "Applied date range filter");
    }
    jobs
}

// ============================================================================
// Output
// ============================================================================

fn emit(jobs: &[ScheduledJob], output: &OutputArgs, digest: DigestFormat) -> Result<()> {
    let text = if output.json {
        serde_json::to_string_pretty(jobs).context("Failed to serialize jobs")?
    } else {
        let summary = build_first_job_summary(jobs);
        if output.html || digest == DigestFormat::Html {
            render_html(&summary)
        } else {
            render_plain(&summary)
        }
    };

    match &output.out {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Wrote digest");
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn print_labels(directory: &ContractorDirectory) {
    for profile in directory.profiles() {
        let format = profile.format.map_or("sniffed", |f| f.name());
        println!("{:<12} {:<32} {}", profile.label, profile.full_name, format);
    }
}

// ============================================================================
// Assignment
// ============================================================================

async fn run_assign(
    jobs: Vec<ScheduledJob>,
    roster: &Path,
    directory: Arc<ContractorDirectory>,
    settings: RunnerSettings,
) -> Result<Vec<ScheduledJob>> {
    let portal = RosterPortal::load(roster)
        .with_context(|| format!("Failed to load roster {}", roster.display()))?;

    let mut handle = spawn_batch(portal, jobs, directory, settings);
    while let Some(line) = handle.status.recv().await {
        let tag = match line.level {
            StatusLevel::Info => "  ",
            StatusLevel::Warn => "! ",
            StatusLevel::Error => "x ",
        };
        println!("{}{}", tag, line.message);
    }

    let (_portal, jobs, report) = handle.join.await.context("Assignment task failed")?;
    println!();
    println!(
        "{} assigned, {} already assigned, {} skipped",
        report.assigned(),
        report.already_assigned(),
        report.skipped()
    );
    println!();
    Ok(jobs)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let config = load_config(args.config.as_deref())?;
    let log_dir = args.log_dir.clone().unwrap_or_else(|| config.run.log_dir.clone());
    let log_path = logging::init(&log_dir)?;
    info!(log = %log_path.display(), "Tech Dispatch starting");

    let directory = Arc::new(ContractorDirectory::from_config(&config));
    let digest = config.run.digest;

    match args.command {
        SubCommand::Parse {
            input,
            contractor,
            format,
            output,
        } => {
            let records = parse_paste(&input, contractor.as_deref(), format, &directory)?;
            let jobs = prepare_jobs(records, &directory, &output);
            emit(&jobs, &output, digest)?;
        }
        SubCommand::Table {
            input,
            contractor,
            output,
        } => {
            let records = read_table(&input, contractor.as_deref(), &directory)?;
            let jobs = prepare_jobs(records, &directory, &output);
            emit(&jobs, &output, digest)?;
        }
        SubCommand::Assign {
            input,
            contractor,
            table,
            format,
            roster,
            output,
        } => {
            let records = if table {
                read_table(Path::new(&input), Some(&contractor), &directory)?
            } else {
                parse_paste(&input, Some(&contractor), format, &directory)?
            };
            let jobs = prepare_jobs(records, &directory, &output);
            let settings = RunnerSettings::from(&config.portal);
            let jobs = run_assign(jobs, &roster, Arc::clone(&directory), settings).await?;
            emit(&jobs, &output, digest)?;
        }
        SubCommand::Labels => print_labels(&directory),
    }

    info!("Tech Dispatch done");
    Ok(())
}
