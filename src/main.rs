//! # genre-ratings
//!
//! Computes average ratings per genre and release year and prints the report.
//!
//! ## Usage
//!
//! ```bash
//! # Paths from genre_ratings.toml / GENRE_RATINGS_* env vars
//! genre-ratings
//!
//! # Explicit paths, JSON output, all rows
//! genre-ratings --movies movies.dat --users users.dat --ratings ratings.dat \
//!     --format json --limit 0
//! ```
//!
//! Logging goes to stderr (or `logging.file`); `RUST_LOG` overrides the
//! configured level.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::OnceLock;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use genre_ratings::config::LoggingConfig;
use genre_ratings::{report, Config, LoadPolicy, OutputFormat, PipelineContext};

static TRACE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser)]
#[command(name = "genre-ratings")]
#[command(about = "Average movie rating by genre and release year")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to genre_ratings.toml + overrides)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// movies.dat path
    #[arg(long)]
    movies: Option<PathBuf>,

    /// users.dat path
    #[arg(long)]
    users: Option<PathBuf>,

    /// ratings.dat path
    #[arg(long)]
    ratings: Option<PathBuf>,

    /// Maximum rows to print (0 = all)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Drop malformed records instead of failing the load
    #[arg(long)]
    lenient: bool,

    /// Print per-stage row counts to stderr
    #[arg(long)]
    trace: bool,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_ascii_lowercase().as_str() {
        "table" => Ok(OutputFormat::Table),
        "json" => Ok(OutputFormat::Json),
        "csv" => Ok(OutputFormat::Csv),
        other => Err(format!("unknown format '{other}' (expected table, json or csv)")),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run_failed");
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };
    apply_overrides(&mut config, &cli);
    init_tracing(&config.logging);

    let ctx = PipelineContext::new(config).context("failed to start pipeline")?;
    let outcome = ctx.run_from_sources().context("pipeline run failed")?;

    if cli.trace {
        eprint!("{}", outcome.trace);
    }

    let output = &ctx.config().output;
    let rendered = report::render(&outcome.rows, output.format, output.limit)
        .context("failed to render report")?;
    print!("{rendered}");
    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(path) = &cli.movies {
        config.sources.movies.clone_from(path);
    }
    if let Some(path) = &cli.users {
        config.sources.users.clone_from(path);
    }
    if let Some(path) = &cli.ratings {
        config.sources.ratings.clone_from(path);
    }
    if let Some(limit) = cli.limit {
        config.output.limit = limit;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if cli.lenient {
        config.parser.policy = LoadPolicy::Lenient;
    }
}

fn init_tracing(logging_config: &LoggingConfig) {
    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging_config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let json = logging_config.format == "json";

    let writer = match &logging_config.file {
        Some(path) => {
            let file = match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
            {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("ERROR: Unable to open log file '{}': {e}", path.display());
                    return;
                }
            };
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let _ = TRACE_GUARD.set(guard);
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(non_blocking)
        }
        None => tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stderr),
    };

    let base = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(writer);

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if json {
        Box::new(base.json().finish())
    } else {
        Box::new(base.compact().finish())
    };

    let _ = tracing::subscriber::set_global_default(subscriber);
}
