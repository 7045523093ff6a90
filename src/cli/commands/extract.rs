//! Extract recovered files to disk.

use std::path::PathBuf;

use console::style;
use indicatif::ProgressBar;
use tracing::debug;

use crate::cli::{Cli, ExtractArgs};
use crate::config::Config;
use crate::error::Result;
use crate::extract::Extractor;
use crate::injection::{detect_injected_content, strip_injected_content};
use crate::symlinks::{load_symlink_yaml, merge_file_index};

use super::{apply_filters, scan_with_progress};

/// Run the extract command.
pub fn run(cli: &Cli, config: &Config, args: &ExtractArgs) -> Result<()> {
    let mut files = scan_with_progress(cli, config)?;

    if !args.no_injection_detection {
        let patterns = detect_injected_content(&files, config.injection.threshold);
        if !patterns.is_empty() {
            let total_ops: usize = patterns.iter().map(|p| p.affected_op_count).sum();
            if !cli.quiet {
                eprintln!(
                    "{}",
                    style(format!(
                        "Detected injected content in {total_ops} Read operations. \
                         Stripping from recovered content."
                    ))
                    .yellow()
                );
            }
            let stripped = strip_injected_content(&mut files, &patterns);
            debug!("stripped injected suffixes from {stripped} read operations");
        }
    }

    if let Some(symlink_file) = &args.symlink_file {
        if symlink_file.exists() {
            let groups = load_symlink_yaml(symlink_file)?;
            if !groups.is_empty() {
                if !cli.quiet {
                    eprintln!("Applying {} symlink mappings for deduplication...", groups.len());
                }
                files = merge_file_index(&files, &groups);
            }
        }
    }

    let (files, cutoff) = apply_filters(files, &args.filter, cli.quiet)?;
    if files.is_empty() {
        println!("No files match the filter.");
        return Ok(());
    }

    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_dir(&config.output.dir_prefix));
    let mut extractor = Extractor::new(&output_dir);
    if let Some(cutoff) = cutoff {
        extractor = extractor.with_cutoff(cutoff);
    }

    if !cli.quiet {
        eprintln!("Reconstructing {} files...", files.len());
    }

    let report = if cli.quiet {
        extractor.extract_all(&files, None)
    } else {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_message("Extracting");
        let mut on_progress = |completed: usize, _total: usize| {
            bar.set_position(completed as u64);
        };
        let report = extractor.extract_all(&files, Some(&mut on_progress));
        bar.finish_and_clear();
        report
    };

    println!(
        "{} extracted, {} skipped (no content), {} failed.",
        style(report.written).green().bold(),
        style(report.skipped).yellow().bold(),
        style(report.failed).red().bold()
    );
    if report.written > 0 {
        let shown = std::fs::canonicalize(&output_dir).unwrap_or(output_dir);
        println!("Output directory: {}", style(shown.display()).bold());
    }

    Ok(())
}

fn default_output_dir(prefix: &str) -> PathBuf {
    PathBuf::from(format!(
        "{prefix}-{}",
        chrono::Local::now().format("%Y-%m-%d-%H-%M-%S")
    ))
}
