//! MindEase CLI - Command-line interface for MindEase trends
//!
//! Commands:
//! - trends: Project mood rows into chart series, SVG paths and insights
//! - validate: Report rows with unknown moods or unreadable timestamps
//! - scale: Print the mood score scale
//! - config: Print the default projector configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, FixedOffset, Local};
use mindease_trends::types::{MOOD_SCALE_MAX, NEUTRAL_SCORE};
use mindease_trends::{
    project_rows, ChartGeometry, GapPolicy, Granularity, MoodLabel, MoodRowAdapter,
    ProjectionError, ProjectorConfig, RawMoodRow, TrendReport, PRODUCER_NAME, TRENDS_VERSION,
};
use tracing_subscriber::EnvFilter;

/// MindEase - Mood trend charts and insights
#[derive(Parser)]
#[command(name = "mindease")]
#[command(author = "MindEase Team")]
#[command(version = TRENDS_VERSION)]
#[command(about = "Turn logged moods into trend charts and insights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project mood rows into a trend report
    Trends {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Charting window
        #[arg(short, long, default_value = "week")]
        granularity: GranularityArg,

        /// Reference time (RFC 3339); its offset picks the calendar. Defaults to local now
        #[arg(long)]
        now: Option<String>,

        /// Journal entries in the window
        #[arg(long, default_value = "0")]
        journal_count: u64,

        /// Load projector configuration from file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured gap policy
        #[arg(long)]
        gap_policy: Option<GapPolicyArg>,

        /// Override chart width
        #[arg(long)]
        width: Option<f64>,

        /// Override chart height
        #[arg(long)]
        height: Option<f64>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Validate mood rows
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the mood score scale
    Scale {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default projector configuration as JSON
    Config,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one row per line)
    Ndjson,
    /// JSON array of rows
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
    /// Human-readable summary
    Text,
}

#[derive(Clone, Copy, ValueEnum)]
enum GranularityArg {
    Week,
    Month,
    Year,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Week => Granularity::Week,
            GranularityArg::Month => Granularity::Month,
            GranularityArg::Year => Granularity::Year,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GapPolicyArg {
    /// Leave empty buckets blank and break the line
    ShowGap,
    /// Fill empty buckets with the neutral score
    NeutralFill,
}

impl From<GapPolicyArg> for GapPolicy {
    fn from(arg: GapPolicyArg) -> Self {
        match arg {
            GapPolicyArg::ShowGap => GapPolicy::ShowGap,
            GapPolicyArg::NeutralFill => GapPolicy::NeutralFill,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), TrendsCliError> {
    match cli.command {
        Commands::Trends {
            input,
            input_format,
            granularity,
            now,
            journal_count,
            config,
            gap_policy,
            width,
            height,
            output_format,
        } => {
            let options = TrendsOptions {
                granularity: granularity.into(),
                now,
                journal_count,
                config,
                gap_policy: gap_policy.map(Into::into),
                width,
                height,
            };
            cmd_trends(&input, input_format, options, output_format)
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Scale { json } => cmd_scale(json),

        Commands::Config => {
            println!("{}", ProjectorConfig::default().to_json()?);
            Ok(())
        }
    }
}

struct TrendsOptions {
    granularity: Granularity,
    now: Option<String>,
    journal_count: u64,
    config: Option<PathBuf>,
    gap_policy: Option<GapPolicy>,
    width: Option<f64>,
    height: Option<f64>,
}

fn cmd_trends(
    input: &Path,
    input_format: InputFormat,
    options: TrendsOptions,
    output_format: OutputFormat,
) -> Result<(), TrendsCliError> {
    let rows = read_rows(input, &input_format)?;
    let now = resolve_now(options.now.as_deref())?;

    let mut config = match &options.config {
        Some(path) => ProjectorConfig::from_json(&fs::read_to_string(path)?)?,
        None => ProjectorConfig::default(),
    };
    if let Some(policy) = options.gap_policy {
        config = config.with_gap_policy(policy);
    }
    if options.width.is_some() || options.height.is_some() {
        let base = config.geometry(options.granularity);
        config = config.with_geometry(ChartGeometry::new(
            options.width.unwrap_or(base.width),
            options.height.unwrap_or(base.height),
        ));
    }

    let report = project_rows(
        &rows,
        options.journal_count,
        options.granularity,
        &now,
        &config,
    )?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &TrendReport) {
    let summary = report.insight.summary();

    println!("Mood Trends ({})", report.insight.period);
    println!("==================");
    println!("Mood:      {}", report.headline);
    println!("Timeframe: {}", report.timeframe);
    println!();
    println!("Buckets:");
    for point in &report.series.points {
        let value = point
            .value
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<8} {:>5}  ({} entries)", point.label, value, point.entries);
    }
    println!();
    println!("Insights:");
    for caption in report.insight.captions() {
        println!("  - {}", caption);
    }
    println!("  - {}", summary.overall);
    println!("  - {}", summary.best);
    println!("  - {}", summary.challenging);
    println!();
    println!("Line path: {}", report.line_path);
    println!("Area path: {}", report.area_path);

    if !report.quality_flags.is_empty() {
        println!();
        println!("Quality flags: {:?}", report.quality_flags);
    }
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), TrendsCliError> {
    let rows = read_rows(input, &input_format)?;
    let issues = MoodRowAdapter::validate_rows(&rows);

    let mut invalid_rows: Vec<usize> = issues.iter().map(|i| i.index).collect();
    invalid_rows.dedup();

    let report = ValidationReport {
        total_rows: rows.len(),
        valid_rows: rows.len() - invalid_rows.len(),
        invalid_rows: invalid_rows.len(),
        errors: issues
            .iter()
            .map(|issue| ValidationErrorDetail {
                index: issue.index,
                error: issue.detail.clone(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total rows:   {}", report.total_rows);
        println!("Valid rows:   {}", report.valid_rows);
        println!("Invalid rows: {}", report.invalid_rows);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Row {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_rows > 0 {
        Err(TrendsCliError::ValidationFailed(report.invalid_rows))
    } else {
        Ok(())
    }
}

fn cmd_scale(json: bool) -> Result<(), TrendsCliError> {
    let entries: Vec<ScaleEntry> = MoodLabel::ALL
        .iter()
        .map(|label| ScaleEntry {
            mood: *label,
            score: label.score(),
        })
        .collect();

    if json {
        let report = ScaleReport {
            producer: PRODUCER_NAME.to_string(),
            max: MOOD_SCALE_MAX,
            neutral_default: NEUTRAL_SCORE,
            moods: entries,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Mood Scale (0-{})", MOOD_SCALE_MAX);
        println!("===============");
        for entry in &entries {
            println!("  {:<12} {:>4}", entry.mood.display_name(), entry.score);
        }
        println!();
        println!("Unknown labels score {} (neutral).", NEUTRAL_SCORE);
    }

    Ok(())
}

// Helper functions

fn read_rows(input: &Path, format: &InputFormat) -> Result<Vec<RawMoodRow>, TrendsCliError> {
    let data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(TrendsCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let rows = match format {
        InputFormat::Ndjson => MoodRowAdapter::parse_ndjson(&data)?,
        InputFormat::Json => MoodRowAdapter::parse_array(&data)?,
    };
    Ok(rows)
}

fn resolve_now(raw: Option<&str>) -> Result<DateTime<FixedOffset>, TrendsCliError> {
    match raw {
        Some(s) => DateTime::parse_from_rfc3339(s.trim())
            .map_err(|e| TrendsCliError::InvalidNow(format!("{}: {}", s, e))),
        None => Ok(Local::now().fixed_offset()),
    }
}

// Error types

#[derive(Debug)]
enum TrendsCliError {
    Io(io::Error),
    Projection(ProjectionError),
    Json(serde_json::Error),
    NoInput,
    InvalidNow(String),
    ValidationFailed(usize),
}

impl From<io::Error> for TrendsCliError {
    fn from(e: io::Error) -> Self {
        TrendsCliError::Io(e)
    }
}

impl From<ProjectionError> for TrendsCliError {
    fn from(e: ProjectionError) -> Self {
        TrendsCliError::Projection(e)
    }
}

impl From<serde_json::Error> for TrendsCliError {
    fn from(e: serde_json::Error) -> Self {
        TrendsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TrendsCliError> for CliError {
    fn from(e: TrendsCliError) -> Self {
        match e {
            TrendsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TrendsCliError::Projection(e) => {
                let (code, hint) = match &e {
                    ProjectionError::DataUnavailable(_) => {
                        ("DATA_UNAVAILABLE", "Retry once the record store is reachable")
                    }
                    ProjectionError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Chart width and height must be positive")
                    }
                    _ => ("PARSE_ERROR", "Rows need 'mood' and 'created_at' fields"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            TrendsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TrendsCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal, nothing to read".to_string(),
                hint: Some("Pipe rows in or pass --input <file>".to_string()),
            },
            TrendsCliError::InvalidNow(msg) => CliError {
                code: "INVALID_NOW".to_string(),
                message: msg,
                hint: Some("Use RFC 3339, e.g. 2024-03-15T18:00:00+02:00".to_string()),
            },
            TrendsCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} rows failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_rows: usize,
    valid_rows: usize,
    invalid_rows: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    error: String,
}

#[derive(serde::Serialize)]
struct ScaleReport {
    producer: String,
    max: f64,
    neutral_default: f64,
    moods: Vec<ScaleEntry>,
}

#[derive(serde::Serialize)]
struct ScaleEntry {
    mood: MoodLabel,
    score: f64,
}
