//! CLI command implementations.
//!
//! Each command is implemented in its own module with a `run` function
//! that handles the command logic.

pub mod extract;
pub mod list;
pub mod show;
pub mod symlinks;

use std::path::PathBuf;

use indicatif::ProgressBar;

use crate::cli::{Cli, FilterOpts};
use crate::config::Config;
use crate::error::{Result, SalvageError};
use crate::extract::filter_by_timestamp;
use crate::filter::{filter_files, validate_regex, SearchMode};
use crate::model::FileIndex;
use crate::scanner::Scanner;
use crate::timestamp::{format_local_confirmation, normalize_timestamp};

/// Resolve the Claude Code data directory from CLI args or the home default.
pub fn resolve_claude_dir(custom: Option<&PathBuf>) -> Result<PathBuf> {
    let path = match custom {
        Some(path) => path.clone(),
        None => dirs::home_dir()
            .map(|home| home.join(crate::CLAUDE_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(crate::CLAUDE_DIR_NAME)),
    };
    if path.exists() {
        Ok(path)
    } else {
        Err(SalvageError::ClaudeDirectoryNotFound { expected_path: path })
    }
}

/// Scan all sessions with a progress bar (suppressed by --quiet).
pub fn scan_with_progress(cli: &Cli, config: &Config) -> Result<FileIndex> {
    let root = resolve_claude_dir(cli.claude_dir.as_ref())?;
    let workers = cli.workers.unwrap_or(config.scan.workers);
    let scanner = Scanner::new(root).with_workers(workers);

    if cli.quiet {
        return Ok(scanner.scan());
    }

    let bar = ProgressBar::new(0);
    bar.set_message("Scanning sessions");
    let mut on_progress = |completed: usize, total: usize| {
        if bar.length() != Some(total as u64) {
            bar.set_length(total as u64);
        }
        bar.set_position(completed as u64);
    };
    let index = scanner.scan_with_progress(Some(&mut on_progress));
    bar.finish_and_clear();
    Ok(index)
}

/// Apply pattern and cutoff filters; returns the filtered index and the
/// normalized cutoff (when one was given) for reconstruction.
pub fn apply_filters(
    files: FileIndex,
    opts: &FilterOpts,
    quiet: bool,
) -> Result<(FileIndex, Option<String>)> {
    // Surface regex compile errors instead of silently matching nothing.
    if opts.mode == SearchMode::Regex && !opts.pattern.is_empty() {
        validate_regex(&opts.pattern)?;
    }

    let mut files = filter_files(&files, &opts.pattern, opts.mode, opts.case_override());

    let mut cutoff = None;
    if !opts.before.is_empty() {
        let normalized = normalize_timestamp(&opts.before)?;
        if !quiet {
            eprintln!(
                "Filtering operations before {}",
                format_local_confirmation(&normalized)
            );
        }
        files = filter_by_timestamp(&files, &normalized);
        cutoff = Some(normalized);
    }

    Ok((files, cutoff))
}
