//! List recoverable files.

use console::style;
use serde::Serialize;

use crate::cli::{Cli, ListArgs};
use crate::config::Config;
use crate::error::Result;
use crate::injection::detect_injected_content;
use crate::model::FileTimeline;
use crate::timestamp::utc_to_local;

use super::{apply_filters, scan_with_progress};

/// A listing row, also used for --json output.
#[derive(Debug, Serialize)]
struct ListRow<'a> {
    path: &'a str,
    last_modified: String,
    operations: usize,
    full: bool,
    summary: String,
}

/// Run the list-files command.
pub fn run(cli: &Cli, config: &Config, args: &ListArgs) -> Result<()> {
    let files = scan_with_progress(cli, config)?;

    // Warn only — listing prints no content, so nothing is stripped here.
    if !args.no_injection_detection && !cli.quiet {
        let patterns = detect_injected_content(&files, config.injection.threshold);
        if !patterns.is_empty() {
            let total_ops: usize = patterns.iter().map(|p| p.affected_op_count).sum();
            let total_files: usize = patterns.iter().map(|p| p.affected_file_count).sum();
            eprintln!(
                "{}",
                style(format!(
                    "Detected injected content in {total_ops} Read operations across \
                     {total_files} files. Extraction strips it; use \
                     --no-injection-detection to suppress this warning."
                ))
                .yellow()
            );
        }
    }

    let (files, cutoff) = apply_filters(files, &args.filter, cli.quiet)?;

    let mut timelines: Vec<&FileTimeline> = files.values().collect();
    timelines.sort_by(|a, b| a.path.cmp(&b.path));

    let rows: Vec<ListRow<'_>> = timelines
        .iter()
        .map(|tl| ListRow {
            path: &tl.path,
            last_modified: if tl.latest_timestamp().is_empty() {
                "unknown".to_string()
            } else {
                utc_to_local(tl.latest_timestamp())
            },
            operations: tl.operation_count(),
            full: tl.has_full_content(),
            summary: tl.kind_summary(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if args.csv {
        println!("last_modified,ops,full,path");
        for row in &rows {
            println!(
                "{},{},{},{}",
                row.last_modified,
                row.operations,
                if row.full { "yes" } else { "no" },
                csv_escape(row.path)
            );
        }
        return Ok(());
    }

    let date_width = rows
        .iter()
        .map(|r| r.last_modified.len())
        .max()
        .unwrap_or(13)
        .max("Last Modified".len());
    println!("{:<date_width$}  {:>5}  {:^4}  Path", "Last Modified", "Ops", "Full");
    for row in &rows {
        let full = if row.full {
            style("yes").green()
        } else {
            style("no").red()
        };
        print!(
            "{:<date_width$}  {:>5}  {:^4}  {}",
            row.last_modified, row.operations, full, row.path
        );
        if cli.verbose {
            print!("  ({})", row.summary);
        }
        println!();
    }

    let cutoff_label = cutoff
        .as_deref()
        .map(|ts| format!(", before {}", utc_to_local(ts)))
        .unwrap_or_default();
    println!();
    println!(
        "{} recoverable files found{cutoff_label}.",
        style(rows.len()).bold()
    );

    Ok(())
}

/// Minimal CSV field escaping for paths.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("/plain/path.rs"), "/plain/path.rs");
        assert_eq!(csv_escape("/with,comma"), "\"/with,comma\"");
        assert_eq!(csv_escape("/with\"quote"), "\"/with\"\"quote\"");
    }
}
