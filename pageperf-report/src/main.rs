//! pageperf-report - Print merged page measurements
//!
//! Replays a JSON run file through the results store and writes the report
//! in buildbot, CSV or JSON form.

use anyhow::{Context, Result};
use clap::Parser;
use pageperf_common::config::{LoggingConfig, ReportConfig};
use pageperf_common::output::formatter_for;
use pageperf_report::{load_run_file, run_report, CliOverrides};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Print merged page measurements from a recorded run
#[derive(Parser, Debug)]
#[command(name = "pageperf-report", version, about)]
struct Args {
    /// Run file (JSON) with page values and summary values
    input: PathBuf,

    /// Output format: buildbot, csv or json
    #[arg(long)]
    format: Option<String>,

    /// Tag appended to merged trace names
    #[arg(long)]
    trace_tag: Option<String>,

    /// CSV: write a row after every page
    #[arg(long)]
    output_after_every_page: bool,

    /// JSON: merge values that share a name suffix across charts
    #[arg(long)]
    group_by_name_suffix: bool,

    /// Config file (overrides PAGEPERF_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ReportConfig::load(args.config.as_deref()).context("Failed to load config")?;
    let config = CliOverrides {
        format: args.format,
        trace_tag: args.trace_tag,
        output_after_every_page: args.output_after_every_page,
        group_by_name_suffix: args.group_by_name_suffix,
    }
    .apply(config)?;

    init_tracing(&config.logging)?;
    // Settings warnings from the first validation had no subscriber yet
    config.validate()?;
    info!(
        "Starting pageperf-report v{} ({} output)",
        env!("CARGO_PKG_VERSION"),
        config.output_format
    );

    let run = load_run_file(&args.input)
        .with_context(|| format!("Failed to read run file {}", args.input.display()))?;
    info!(
        pages = run.pages.len(),
        summary_values = run.summary_values.len(),
        "Loaded run file {}",
        args.input.display()
    );

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut formatter = formatter_for(&config, writer);
    run_report(&run, formatter.as_mut())?;

    Ok(())
}

/// Log to stderr, or to the configured file; RUST_LOG wins over the config level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}
