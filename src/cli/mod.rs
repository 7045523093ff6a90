//! Command-line interface for claude-salvage.
//!
//! Scriptable access to the recovery engine:
//! - `list-files`: list recoverable files with timestamps and coverage
//! - `extract`: write recovered files to an output directory
//! - `symlinks`: detect alias prefixes and write a YAML mapping
//! - `show`: print one recovered file or its last-change diff
//! - `completions`: generate shell completions

mod commands;

pub use commands::*;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};

use crate::config::Config;
use crate::error::Result;
use crate::filter::SearchMode;

/// Recover files created and modified by Claude Code from session transcripts.
#[derive(Debug, Parser)]
#[command(name = "salvage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the Claude Code data directory (default: ~/.claude).
    #[arg(short = 'c', long, global = true, env = "SALVAGE_CLAUDE_DIR")]
    pub claude_dir: Option<PathBuf>,

    /// Worker-pool width for transcript scanning.
    #[arg(short = 'j', long, global = true, env = "SALVAGE_WORKERS", hide_short_help = true)]
    pub workers: Option<usize>,

    /// Path to custom configuration file.
    #[arg(long, global = true, env = "SALVAGE_CONFIG", hide_short_help = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn", env = "SALVAGE_LOG_LEVEL", hide_short_help = true)]
    pub log_level: LogLevel,

    /// Log format (text, json, compact).
    #[arg(long, global = true, default_value = "text", env = "SALVAGE_LOG_FORMAT", hide_short_help = true)]
    pub log_format: LogFormat,

    /// Suppress non-essential output.
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Enable verbose output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// Log level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

impl LogLevel {
    /// Convert to a tracing filter directive.
    #[must_use]
    pub const fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Structured JSON format for machine consumption.
    Json,
    /// Compact single-line format.
    Compact,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List all recoverable files with paths and latest modification dates.
    #[command(name = "list-files", alias = "ls")]
    ListFiles(ListArgs),

    /// Extract recovered files to disk, preserving directory structure.
    #[command(alias = "x")]
    Extract(ExtractArgs),

    /// Detect symlinked file paths and write a YAML mapping file.
    Symlinks(SymlinksArgs),

    /// Print one recovered file (or its last-change diff) to stdout.
    Show(ShowArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Pattern and cutoff filtering options shared by listing and extraction.
#[derive(Debug, Default, Parser)]
pub struct FilterOpts {
    /// Pattern to filter file paths (e.g. '*.ts' for glob, 'router' for
    /// fuzzy, '\.py$' for regex).
    #[arg(short = 'f', long = "filter", default_value = "", hide_default_value = true)]
    pub pattern: String,

    /// Filter mode.
    #[arg(short = 'm', long, value_enum, default_value = "glob")]
    pub mode: SearchMode,

    /// Force case-sensitive matching (default: smart-case).
    #[arg(short = 's', long)]
    pub case_sensitive: bool,

    /// Force case-insensitive matching (default: smart-case).
    #[arg(short = 'i', long, conflicts_with = "case_sensitive")]
    pub ignore_case: bool,

    /// Only include operations at or before this timestamp
    /// (e.g. '2026-01-30', '2026-01-30 15:00').
    #[arg(short = 'b', long, default_value = "", hide_default_value = true)]
    pub before: String,
}

impl FilterOpts {
    /// The explicit case override, if either flag was given.
    #[must_use]
    pub fn case_override(&self) -> Option<bool> {
        if self.case_sensitive {
            Some(true)
        } else if self.ignore_case {
            Some(false)
        } else {
            None
        }
    }
}

/// Arguments for the list-files command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Filtering options.
    #[command(flatten)]
    pub filter: FilterOpts,

    /// Output in CSV format.
    #[arg(long)]
    pub csv: bool,

    /// Output in JSON format.
    #[arg(long, conflicts_with = "csv")]
    pub json: bool,

    /// Disable detection of injected content in Read operations.
    #[arg(long)]
    pub no_injection_detection: bool,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Filtering options.
    #[command(flatten)]
    pub filter: FilterOpts,

    /// Output directory for recovered files (default: recovered-<timestamp>).
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// YAML file with symlink mappings for alias deduplication.
    #[arg(long)]
    pub symlink_file: Option<PathBuf>,

    /// Disable detection and removal of injected content in Read operations.
    #[arg(long)]
    pub no_injection_detection: bool,
}

/// Arguments for the symlinks command.
#[derive(Debug, Parser)]
pub struct SymlinksArgs {
    /// Output path for the YAML symlink mapping file.
    #[arg(short = 'o', long, default_value = "./symlinks.yaml")]
    pub output: PathBuf,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Absolute path (or unique path suffix) of the recoverable file.
    pub path: String,

    /// Reconstruct at or before this timestamp instead of latest.
    #[arg(short = 'b', long, default_value = "", hide_default_value = true)]
    pub before: String,

    /// Show the unified diff of the operation instead of the content.
    #[arg(long)]
    pub diff: bool,

    /// Timeline index to inspect (default: the last operation).
    #[arg(long)]
    pub at_index: Option<usize>,
}

/// Arguments for the completions command.
#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Initialize tracing/logging based on CLI options.
fn init_logging(cli: &Cli) {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()));

    let result = match cli.log_format {
        LogFormat::Json => {
            let layer = fmt::layer().json().with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
    };

    // "already set" is normal when tests or the environment installed a
    // subscriber first.
    let _ = result;
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    let config = match &cli.config {
        Some(path) => Config::load_from(path).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config from {}: {}", path.display(), e);
            Config::default()
        }),
        None => Config::load().unwrap_or_default(),
    };

    match &cli.command {
        Commands::ListFiles(args) => commands::list::run(&cli, &config, args),
        Commands::Extract(args) => commands::extract::run(&cli, &config, args),
        Commands::Symlinks(args) => commands::symlinks::run(&cli, &config, args),
        Commands::Show(args) => commands::show::run(&cli, &config, args),
        Commands::Completions(args) => {
            generate_completions(args.shell);
            Ok(())
        }
    }
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "salvage", &mut std::io::stdout());
}
