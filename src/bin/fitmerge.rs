//! fitmerge CLI - Command-line interface for fitmerge
//!
//! Commands:
//! - merge: Build the master daily table from the five exports
//! - classify: Show how each column of a Health Auto Export file is reduced
//! - check: Report availability and layout of every source file

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fitmerge::adapters::{apple_health_aggregator, ColumnClassification};
use fitmerge::pipeline::{merge_to_writer, SourceCheck};
use fitmerge::reader::read_source;
use fitmerge::{
    check_sources, run as run_merge, InvalidDayPolicy, MergeConfig, MergeError, OutputFormat,
    PipelineOptions, SourceKind, FITMERGE_VERSION,
};

/// fitmerge - Daily consolidation of rowing, WHOOP and Apple Health exports
#[derive(Parser)]
#[command(name = "fitmerge")]
#[command(version = FITMERGE_VERSION)]
#[command(about = "Merge fitness exports into one row per day", long_about = None)]
struct Cli {
    /// Log filter (error, warn, info, debug, trace or an EnvFilter directive)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the master daily table
    Merge {
        /// JSON config file (overrides --input-dir)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory holding the exports under their default names
        #[arg(short, long, default_value = ".")]
        input_dir: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long)]
        format: Option<FormatArg>,

        /// Handling of rows without a usable timestamp
        #[arg(long)]
        policy: Option<PolicyArg>,
    },

    /// Show the reducer chosen for each column of a Health Auto Export CSV
    Classify {
        /// Health Auto Export CSV
        input: PathBuf,

        /// JSON config file supplying declared reducers
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that every source file is present and well-formed
    Check {
        /// JSON config file (overrides --input-dir)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory holding the exports under their default names
        #[arg(short, long, default_value = ".")]
        input_dir: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Comma-separated values with a date column
    Csv,
    /// JSON array of day objects
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Newline-delimited JSON (one day per line)
    Ndjson,
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::JsonPretty => OutputFormat::JsonPretty,
            FormatArg::Ndjson => OutputFormat::Ndjson,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Skip the row with a warning
    Drop,
    /// Abort the run
    Fail,
}

impl From<PolicyArg> for InvalidDayPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Drop => InvalidDayPolicy::Drop,
            PolicyArg::Fail => InvalidDayPolicy::Fail,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Install a stderr `tracing` subscriber filtered by `log_level`
fn setup_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer().with_target(false).with_writer(io::stderr);

    tracing_subscriber::registry().with(filter).with(layer).init();
}

fn run(cli: Cli) -> Result<(), FitmergeCliError> {
    match cli.command {
        Commands::Merge {
            config,
            input_dir,
            output,
            format,
            policy,
        } => {
            let mut config = load_config(config.as_deref(), &input_dir)?;
            if let Some(format) = format {
                config.output_format = format.into();
            }
            if let Some(policy) = policy {
                config.invalid_day_policy = policy.into();
            }
            cmd_merge(config, output)
        }
        Commands::Classify {
            input,
            config,
            json,
        } => cmd_classify(&input, config.as_deref(), json),
        Commands::Check {
            config,
            input_dir,
            json,
        } => cmd_check(&load_config(config.as_deref(), &input_dir)?, json),
    }
}

fn load_config(config: Option<&Path>, input_dir: &Path) -> Result<MergeConfig, FitmergeCliError> {
    match config {
        Some(path) => Ok(MergeConfig::load(path)?),
        None => Ok(MergeConfig::in_dir(input_dir)),
    }
}

fn cmd_merge(mut config: MergeConfig, output: Option<PathBuf>) -> Result<(), FitmergeCliError> {
    match output {
        Some(path) if path.as_os_str() == "-" => {
            let stdout = io::stdout();
            merge_to_writer(&config, stdout.lock(), config.output_format)?;
        }
        Some(path) => {
            config.output = path;
            let summary = run_merge(&config)?;
            println!("Saved {} rows to {}", summary.master_rows, config.output.display());
        }
        None => {
            let summary = run_merge(&config)?;
            println!("Saved {} rows to {}", summary.master_rows, config.output.display());
        }
    }

    Ok(())
}

fn cmd_classify(input: &Path, config: Option<&Path>, json: bool) -> Result<(), FitmergeCliError> {
    let overrides = match config {
        Some(path) => MergeConfig::load(path)?.apple_reducers,
        None => Default::default(),
    };

    let table = read_source(SourceKind::AppleHealth, input)?;
    let classifications = apple_health_aggregator(&overrides).classifications(&table.columns);

    if json {
        println!("{}", serde_json::to_string_pretty(&classifications)?);
    } else {
        print_classifications(&classifications)?;
    }

    Ok(())
}

fn print_classifications(classifications: &[ColumnClassification]) -> io::Result<()> {
    let width = classifications
        .iter()
        .map(|c| c.column.len())
        .max()
        .unwrap_or(0);

    let mut out = io::stdout().lock();
    for c in classifications {
        writeln!(
            out,
            "{:<width$}  {:<5}  {:?}",
            c.column,
            c.reducer.as_str(),
            c.origin,
            width = width
        )?;
    }

    Ok(())
}

fn cmd_check(config: &MergeConfig, json: bool) -> Result<(), FitmergeCliError> {
    let checks = check_sources(&config.sources, &PipelineOptions::from(config));

    if json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
    } else {
        println!("fitmerge Source Check");
        println!("=====================");
        println!("Version: {}", FITMERGE_VERSION);
        println!("\nSources:");

        for check in &checks {
            println!("  {} {}: {}", status_icon(check), check.source, describe(check));
        }
    }

    let failed = checks.iter().filter(|c| !c.is_ok()).count();
    if failed > 0 {
        Err(FitmergeCliError::CheckFailed(failed))
    } else {
        Ok(())
    }
}

fn status_icon(check: &SourceCheck) -> &'static str {
    if check.is_ok() {
        "[OK]"
    } else {
        "[ERR]"
    }
}

fn describe(check: &SourceCheck) -> String {
    match (&check.error, check.rows, check.days) {
        (Some(e), _, _) => e.clone(),
        (None, Some(rows), Some(days)) => {
            format!("{} ({} rows, {} days)", check.path.display(), rows, days)
        }
        _ => check.path.display().to_string(),
    }
}

// Error handling

#[derive(Debug)]
enum FitmergeCliError {
    Merge(MergeError),
    Io(io::Error),
    Json(serde_json::Error),
    CheckFailed(usize),
}

impl From<MergeError> for FitmergeCliError {
    fn from(e: MergeError) -> Self {
        FitmergeCliError::Merge(e)
    }
}

impl From<io::Error> for FitmergeCliError {
    fn from(e: io::Error) -> Self {
        FitmergeCliError::Io(e)
    }
}

impl From<serde_json::Error> for FitmergeCliError {
    fn from(e: serde_json::Error) -> Self {
        FitmergeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: &str, message: impl Into<String>, hint: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            hint: hint.map(str::to_string),
        }
    }
}

impl From<FitmergeCliError> for CliError {
    fn from(e: FitmergeCliError) -> Self {
        match e {
            FitmergeCliError::Merge(e) => {
                let message = e.to_string();
                match e {
                    MergeError::SourceUnavailable { .. } => CliError::new(
                        "SOURCE_UNAVAILABLE",
                        message,
                        Some("Check --input-dir or the paths in the config file"),
                    ),
                    MergeError::Schema { .. } => CliError::new(
                        "SCHEMA_ERROR",
                        message,
                        Some("Run 'fitmerge check' to see which export is malformed"),
                    ),
                    MergeError::InvalidTimestamp { .. } => CliError::new(
                        "INVALID_TIMESTAMP",
                        message,
                        Some("Fix the row or rerun with --policy drop"),
                    ),
                    MergeError::DateParse(_) => CliError::new("DATE_PARSE_ERROR", message, None),
                    MergeError::ColumnCollision(_) => CliError::new(
                        "COLUMN_COLLISION",
                        message,
                        Some("Two sources produced the same output column"),
                    ),
                    MergeError::Csv(_) => {
                        CliError::new("CSV_ERROR", message, Some("Check the export's CSV syntax"))
                    }
                    MergeError::Json(_) | MergeError::Config(_) => CliError::new(
                        "CONFIG_ERROR",
                        message,
                        Some("Check the config file against the documented layout"),
                    ),
                    MergeError::Io(_) => CliError::new(
                        "IO_ERROR",
                        message,
                        Some("Check file paths and permissions"),
                    ),
                }
            }
            FitmergeCliError::Io(e) => CliError::new(
                "IO_ERROR",
                e.to_string(),
                Some("Check file paths and permissions"),
            ),
            FitmergeCliError::Json(e) => CliError::new("JSON_ERROR", e.to_string(), None),
            FitmergeCliError::CheckFailed(count) => CliError::new(
                "CHECK_FAILED",
                format!("{} sources failed the check", count),
                Some("Review the check report for details"),
            ),
        }
    }
}
