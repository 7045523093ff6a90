//! Print one recovered file, or its diff, to stdout.

use crate::cli::{Cli, ShowArgs};
use crate::config::Config;
use crate::diff::{compute_before_after, unified_diff};
use crate::error::{Result, SalvageError};
use crate::model::{FileIndex, FileTimeline};
use crate::replay::{reconstruct_at, reconstruct_at_timestamp, reconstruct_latest};
use crate::timestamp::normalize_timestamp;

use super::scan_with_progress;

/// Run the show command.
pub fn run(cli: &Cli, config: &Config, args: &ShowArgs) -> Result<()> {
    let files = scan_with_progress(cli, config)?;
    let timeline = find_timeline(&files, &args.path)?;

    let cutoff = if args.before.is_empty() {
        None
    } else {
        Some(normalize_timestamp(&args.before)?)
    };

    if let Some(index) = args.at_index {
        if index >= timeline.operation_count() {
            return Err(SalvageError::InvalidArgument {
                name: "at-index".to_string(),
                reason: format!(
                    "index {index} out of range ({} operations)",
                    timeline.operation_count()
                ),
            });
        }
    }

    if args.diff {
        let index = args
            .at_index
            .unwrap_or_else(|| timeline.operation_count().saturating_sub(1));
        match compute_before_after(&timeline.operations, index) {
            (Some(before), Some(after)) => {
                print!("{}", unified_diff(&before, &after, &timeline.path));
                println!();
            }
            _ => eprintln!("No content reconstructable at operation {index}."),
        }
        return Ok(());
    }

    let content = match (args.at_index, &cutoff) {
        (Some(index), _) => reconstruct_at(&timeline.operations, index),
        (None, Some(cutoff)) => reconstruct_at_timestamp(timeline, cutoff),
        (None, None) => reconstruct_latest(timeline),
    };

    match content {
        Some(text) => print!("{text}"),
        None => eprintln!("No content reconstructable for {}.", timeline.path),
    }
    Ok(())
}

/// Find a timeline by exact path, or by unique path suffix.
fn find_timeline<'a>(files: &'a FileIndex, query: &str) -> Result<&'a FileTimeline> {
    if let Some(timeline) = files.get(query) {
        return Ok(timeline);
    }

    let matches: Vec<&FileTimeline> = files
        .values()
        .filter(|tl| tl.path.ends_with(query))
        .collect();
    match matches.len() {
        0 => Err(SalvageError::RecoverableFileNotFound {
            path: query.to_string(),
        }),
        1 => Ok(matches[0]),
        count => Err(SalvageError::AmbiguousPath {
            path: query.to_string(),
            count,
        }),
    }
}
