//! Detection and stripping of injected content in Read tool outputs.
//!
//! Some client versions appended instructional suffix blocks (system
//! reminders and the like) to Read outputs. Those blocks must not end up in
//! recovered files. Detection is threshold-based: the trailing block of each
//! Read's content is tallied across the index, and any block that recurs in
//! enough distinct files is reported as an injection pattern and stripped.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{FileIndex, OperationKind};

/// Default fraction of Read-bearing files a trailing block must appear in
/// to count as injected. An empirical policy knob, not an invariant.
pub const DEFAULT_THRESHOLD: f64 = 0.20;

/// A trailing block that recurs across enough files to be considered
/// injected by the client rather than real file content.
#[derive(Debug, Clone, Serialize)]
pub struct InjectionPattern {
    /// Descriptive identifier, e.g. `"trailing-suffix-1"`.
    pub pattern_id: String,
    /// The full injected block.
    pub content: String,
    /// Number of Read operations containing the block.
    pub affected_op_count: usize,
    /// Number of distinct files containing the block.
    pub affected_file_count: usize,
    /// Truncated sample for display.
    pub sample: String,
    /// How the pattern was found.
    pub detection_method: String,
}

/// Extract the final block of `content`: the contiguous run of non-blank
/// lines at the end, which must be separated from earlier content by a
/// blank line. Single-block content has no trailing block.
fn extract_trailing_block(content: &str) -> Option<String> {
    let lines: Vec<&str> = content.trim_end().split('\n').collect();

    let mut end = lines.len();
    while end > 0 && lines[end - 1].trim().is_empty() {
        end -= 1;
    }
    if end == 0 {
        return None;
    }

    let mut start = end - 1;
    while start > 0 && !lines[start - 1].trim().is_empty() {
        start -= 1;
    }
    // Block starting at line 0 means the whole content is one block.
    if start == 0 {
        return None;
    }

    Some(lines[start..end].join("\n").trim().to_string())
}

/// Detect injected trailing blocks across all Read operations.
///
/// A block qualifies when it appears in at least `⌊threshold × F⌋` files,
/// where `F` is the number of files containing at least one Read with
/// content. Patterns are ordered by descending file count (ties broken by
/// content so output is deterministic).
#[must_use]
pub fn detect_injected_content(files: &FileIndex, threshold: f64) -> Vec<InjectionPattern> {
    let mut file_counts: HashMap<String, usize> = HashMap::new();
    let mut op_counts: HashMap<String, usize> = HashMap::new();
    let mut files_with_reads = 0usize;

    for timeline in files.values() {
        let read_contents: Vec<&str> = timeline
            .operations
            .iter()
            .filter(|op| op.kind == OperationKind::Read)
            .filter_map(|op| op.content.as_deref())
            .filter(|content| !content.is_empty())
            .collect();
        if read_contents.is_empty() {
            continue;
        }
        files_with_reads += 1;

        let mut seen_in_file: HashSet<String> = HashSet::new();
        for content in read_contents {
            let Some(trailing) = extract_trailing_block(content) else {
                continue;
            };
            *op_counts.entry(trailing.clone()).or_insert(0) += 1;
            if seen_in_file.insert(trailing.clone()) {
                *file_counts.entry(trailing).or_insert(0) += 1;
            }
        }
    }

    if files_with_reads == 0 {
        return Vec::new();
    }

    let min_files = (files_with_reads as f64 * threshold).floor() as usize;
    let mut qualifying: Vec<(String, usize)> = file_counts
        .into_iter()
        .filter(|(_, count)| *count >= min_files)
        .collect();
    qualifying.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    qualifying
        .into_iter()
        .enumerate()
        .map(|(idx, (content, file_count))| {
            let sample: String = if content.chars().count() > 120 {
                let head: String = content.chars().take(120).collect();
                format!("{head}...")
            } else {
                content.clone()
            };
            InjectionPattern {
                pattern_id: format!("trailing-suffix-{}", idx + 1),
                affected_op_count: op_counts.get(&content).copied().unwrap_or(0),
                affected_file_count: file_count,
                sample,
                content,
                detection_method: "threshold-suffix".to_string(),
            }
        })
        .collect()
}

/// Strip detected injection patterns from Read operation content.
///
/// Content is truncated at the last occurrence of the matching block and
/// right-trimmed, mutated in place so subsequent replay sees the cleaned
/// text. Returns the number of operations modified. Never introduces
/// characters and never touches non-matching content.
pub fn strip_injected_content(files: &mut FileIndex, patterns: &[InjectionPattern]) -> usize {
    if patterns.is_empty() {
        return 0;
    }
    let pattern_set: HashSet<&str> = patterns.iter().map(|p| p.content.as_str()).collect();
    let mut modified = 0;

    for timeline in files.values_mut() {
        for op in &mut timeline.operations {
            if op.kind != OperationKind::Read {
                continue;
            }
            let Some(content) = op.content.as_deref().filter(|c| !c.is_empty()) else {
                continue;
            };
            let Some(trailing) = extract_trailing_block(content) else {
                continue;
            };
            if !pattern_set.contains(trailing.as_str()) {
                continue;
            }
            if let Some(idx) = content.rfind(&trailing) {
                op.content = Some(content[..idx].trim_end().to_string());
                modified += 1;
            }
        }
    }

    modified
}
