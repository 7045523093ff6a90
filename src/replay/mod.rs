//! Deterministic content reconstruction over operation timelines.
//!
//! Replays a timeline's operations in order to produce the exact text the
//! file held after any given operation. Writes, file-history snapshots, and
//! full Reads are authoritative snapshots; partial Reads are spliced into
//! the working content line-by-line; Edits rebase onto their recorded
//! pre-edit state when one was captured, then apply their replacement.

use crate::model::{FileTimeline, Operation, OperationKind};

/// Apply an Edit's string replacement to `content`.
///
/// An empty `old_string` is a no-op. With `replace_all` false, only the
/// first occurrence changes; with it true, every occurrence changes.
#[must_use]
pub fn apply_edit(content: &str, old_string: &str, new_string: &str, replace_all: bool) -> String {
    if old_string.is_empty() {
        return content.to_string();
    }
    if replace_all {
        content.replace(old_string, new_string)
    } else {
        content.replacen(old_string, new_string, 1)
    }
}

/// Splice a partial Read's content into a (possibly unknown) baseline.
///
/// The read content overwrites lines `[start_line, start_line + n)` of the
/// baseline, 1-indexed. `total_lines` sizes the result when known; when the
/// baseline is absent or short it is padded with empty lines first, so the
/// file "grows" as more partial reads arrive. Splicing the same read twice
/// yields the same content.
#[must_use]
pub fn splice_read(
    content: Option<&str>,
    read_content: &str,
    start_line: Option<usize>,
    total_lines: Option<usize>,
) -> String {
    let new_lines: Vec<&str> = read_content.split('\n').collect();
    let start = start_line.unwrap_or(1).saturating_sub(1);
    let target_len = total_lines.unwrap_or(start + new_lines.len());

    let mut lines: Vec<String> = match content {
        Some(text) => text.split('\n').map(String::from).collect(),
        None => Vec::new(),
    };
    // Inconsistent metadata can claim fewer total lines than the read spans;
    // grow rather than truncate observed content.
    let needed = target_len.max(start + new_lines.len());
    if lines.len() < needed {
        lines.resize(needed, String::new());
    }
    for (i, line) in new_lines.iter().enumerate() {
        lines[start + i] = (*line).to_string();
    }
    lines.join("\n")
}

/// Advance the replay state by one operation.
///
/// Errored operations never mutate state. Shared with the scanner's
/// replay-level no-op Edit filter so both walk content identically.
#[must_use]
pub(crate) fn apply_operation(content: Option<String>, op: &Operation) -> Option<String> {
    if op.is_error {
        return content;
    }
    match op.kind {
        OperationKind::WriteCreate | OperationKind::WriteUpdate => op.content.clone(),
        OperationKind::FileHistory => op.content.clone().or(content),
        OperationKind::Read => match &op.content {
            None => content,
            Some(text) => {
                if op.is_full_read() {
                    Some(text.clone())
                } else {
                    let start = op.read_start_line.or(op.read_offset);
                    Some(splice_read(
                        content.as_deref(),
                        text,
                        start,
                        op.read_total_lines,
                    ))
                }
            }
        },
        OperationKind::Edit => {
            // original_file is the authoritative pre-edit state; it overrides
            // whatever the running reconstruction holds.
            let mut current = op.original_file.clone().or(content);
            if let (Some(text), Some(old), Some(new)) = (
                current.as_deref(),
                op.old_string.as_deref(),
                op.new_string.as_deref(),
            ) {
                current = Some(apply_edit(text, old, new, op.replace_all));
            }
            current
        }
    }
}

/// Reconstruct file content after replaying operations `0..=up_to_index`.
///
/// Returns `None` when no content can be derived at that point (e.g. the
/// prefix holds only Edits with no baseline).
#[must_use]
pub fn reconstruct_at(operations: &[Operation], up_to_index: usize) -> Option<String> {
    let mut content: Option<String> = None;
    for op in operations.iter().take(up_to_index + 1) {
        content = apply_operation(content, op);
    }
    content
}

/// Reconstruct the latest version of a file.
#[must_use]
pub fn reconstruct_latest(timeline: &FileTimeline) -> Option<String> {
    if timeline.operations.is_empty() {
        return None;
    }
    reconstruct_at(&timeline.operations, timeline.operations.len() - 1)
}

/// Reconstruct file content at a point in time.
///
/// Binary-searches the sorted timeline for the last operation with
/// `timestamp <= cutoff` and replays through it. Returns `None` when every
/// operation is after the cutoff.
#[must_use]
pub fn reconstruct_at_timestamp(timeline: &FileTimeline, cutoff: &str) -> Option<String> {
    if timeline.operations.is_empty() {
        return None;
    }
    let idx = timeline
        .operations
        .partition_point(|op| op.timestamp.as_str() <= cutoff);
    if idx == 0 {
        return None;
    }
    reconstruct_at(&timeline.operations, idx - 1)
}
