//! Transcript scanning and operation extraction.
//!
//! Walks a Claude Code data directory, parses every session transcript
//! (including `.jsonl.backup.*` copies and subagent transcripts), correlates
//! tool invocations with their results, and aggregates the extracted
//! operations into a per-file index ordered by
//! `(timestamp, session_id, line_number)`.
//!
//! Parsing is lenient throughout: malformed lines are skipped, missing
//! auxiliary files degrade to whatever content the transcript embeds, and a
//! transcript that cannot be read at all is dropped with a warning. A scan
//! never aborts because of bad input.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SalvageError};
use crate::model::{FileIndex, FileTimeline, Operation, OperationKind};
use crate::replay::apply_operation;
use crate::util::normalize_path;

/// Default scan worker-pool width.
pub const DEFAULT_WORKERS: usize = 8;

/// Line-number prefix emitted by the Read tool: right-aligned digits
/// followed by U+2192.
static LINE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\u{2192}(.*)$").expect("valid literal regex"));

static TOOL_USE_ERROR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^<tool_use_error>(.*)</tool_use_error>").expect("valid literal regex")
});

/// Progress callback invoked after each transcript finishes:
/// `(completed, total)`.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(usize, usize) + Send);

/// Scans a Claude Code data directory into a [`FileIndex`].
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    workers: usize,
}

impl Scanner {
    /// Create a scanner over a data directory root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            workers: DEFAULT_WORKERS,
        }
    }

    /// Set the worker-pool width.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Scan all transcripts without progress reporting.
    #[must_use]
    pub fn scan(&self) -> FileIndex {
        self.scan_with_progress(None)
    }

    /// Scan all transcripts, invoking `progress` after each one completes.
    ///
    /// Transcripts are parsed on a bounded worker pool; each worker owns one
    /// transcript at a time and failures are swallowed per file. The final
    /// ordering is independent of scheduling.
    #[must_use]
    pub fn scan_with_progress(&self, progress: Option<ProgressFn<'_>>) -> FileIndex {
        let transcripts = discover_transcripts(&self.root);
        let total = transcripts.len();
        let completed = AtomicUsize::new(0);
        let callback = progress.map(Mutex::new);

        let scan_one = |path: &PathBuf| -> Vec<Operation> {
            let ops = match scan_transcript(path, &self.root) {
                Ok(ops) => ops,
                Err(e) => {
                    warn!("skipping unreadable transcript {}: {e}", path.display());
                    Vec::new()
                }
            };
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(cb) = &callback {
                let mut guard = cb.lock();
                (*guard)(done, total);
            }
            ops
        };

        // collect() preserves input order, so aggregation below is
        // deterministic regardless of which worker finished first.
        let per_file: Vec<Vec<Operation>> = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool.install(|| transcripts.par_iter().map(scan_one).collect()),
            Err(e) => {
                warn!("worker pool unavailable, scanning on one thread: {e}");
                transcripts.iter().map(scan_one).collect()
            }
        };

        let mut index: FileIndex = IndexMap::new();
        for op in per_file.into_iter().flatten() {
            index
                .entry(op.path.clone())
                .or_insert_with(|| FileTimeline::new(op.path.clone()))
                .operations
                .push(op);
        }

        for timeline in index.values_mut() {
            timeline.sort_operations();
            timeline.operations = filter_noop_edits_by_replay(std::mem::take(&mut timeline.operations));
        }

        index
    }
}

/// Scan a data directory with the default worker width.
#[must_use]
pub fn scan_all(root: impl Into<PathBuf>, progress: Option<ProgressFn<'_>>) -> FileIndex {
    Scanner::new(root).scan_with_progress(progress)
}

/// Find every session transcript under `<root>/projects/`.
///
/// Matches `*.jsonl` plus `*.jsonl.backup*` copies, at any depth — which
/// also picks up `<session>/subagents/*.jsonl`. Sorted for deterministic
/// aggregation order.
#[must_use]
pub fn discover_transcripts(root: &Path) -> Vec<PathBuf> {
    let projects_dir = root.join("projects");
    if !projects_dir.is_dir() {
        return Vec::new();
    }

    let mut transcripts: Vec<PathBuf> = WalkDir::new(&projects_dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            name.ends_with(".jsonl") || name.contains(".jsonl.backup")
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    transcripts.sort();
    transcripts
}

/// Whether a transcript lives in a `subagents/` directory.
fn is_subagent_transcript(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == "subagents"))
}

/// Extract the session UUID from a transcript path.
///
/// Main session: `projects/<slug>/<uuid>.jsonl` (possibly with a
/// `.backup.<suffix>`). Subagent: `projects/<slug>/<uuid>/subagents/agent-<hex>.jsonl`,
/// where the session is the directory above `subagents/`.
fn extract_session_id(path: &Path) -> String {
    let components: Vec<&std::ffi::OsStr> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .collect();

    if let Some(idx) = components.iter().position(|c| *c == "subagents") {
        if idx > 0 {
            return components[idx - 1].to_string_lossy().into_owned();
        }
    }

    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
        .split(".jsonl")
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Strip line-number prefixes from Read tool output.
///
/// Format: right-aligned number, U+2192, content (`"     1→first line"`).
#[must_use]
pub fn strip_read_line_numbers(text: &str) -> String {
    text.split('\n')
        .map(|line| match LINE_NUMBER_RE.captures(line) {
            Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Scan a single transcript file into its operations.
///
/// `root` is needed to resolve `file-history/<session>/<backup>` snapshot
/// files. Field-level no-op Edits are already removed from the result;
/// replay-level elimination happens after cross-session aggregation.
pub fn scan_transcript(path: &Path, root: &Path) -> Result<Vec<Operation>> {
    let bytes = fs::read(path)
        .map_err(|e| SalvageError::io(format!("Failed to read {}", path.display()), e))?;
    let text = String::from_utf8_lossy(&bytes);

    let is_subagent = is_subagent_transcript(path);
    let session_id = extract_session_id(path);
    let mut cwd: Option<String> = None;

    let mut ops: Vec<Operation> = Vec::new();
    // tool_use_id -> index into ops, in insertion order, so result entries
    // can find "the most recent pending op for this path".
    let mut pending: IndexMap<String, usize> = IndexMap::new();

    for (idx, line) in text.split('\n').enumerate() {
        let line_number = idx + 1;

        // Fast reject: progress entries dominate transcripts and carry no
        // file operations.
        if line.contains(r#""type":"progress""#) || line.contains(r#""type": "progress""#) {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let Ok(entry) = serde_json::from_str::<Value>(line) else {
            continue;
        };

        let timestamp = entry
            .get("timestamp")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        // The first entry carrying a cwd anchors relative file-history paths.
        if cwd.is_none() {
            if let Some(dir) = entry.get("cwd").and_then(Value::as_str) {
                if !dir.is_empty() {
                    cwd = Some(dir.to_string());
                }
            }
        }

        match entry.get("type").and_then(Value::as_str) {
            Some("assistant") => collect_tool_uses(
                &entry,
                &timestamp,
                &session_id,
                is_subagent,
                line_number,
                &mut ops,
                &mut pending,
            ),
            Some("user") => apply_tool_results(&entry, &mut ops, &pending),
            Some("file-history-snapshot") => collect_history_snapshots(
                &entry,
                &timestamp,
                cwd.as_deref(),
                root,
                &session_id,
                line_number,
                &mut ops,
            ),
            _ => {}
        }
    }

    Ok(ops.into_iter().filter(|op| !is_noop_edit(op)).collect())
}

/// Emit pending operations for Write/Edit/Read tool_use blocks.
fn collect_tool_uses(
    entry: &Value,
    timestamp: &str,
    session_id: &str,
    is_subagent: bool,
    line_number: usize,
    ops: &mut Vec<Operation>,
    pending: &mut IndexMap<String, usize>,
) {
    let Some(blocks) = entry
        .pointer("/message/content")
        .and_then(Value::as_array)
    else {
        return;
    };

    for block in blocks {
        if block.get("type").and_then(Value::as_str) != Some("tool_use") {
            continue;
        }
        let name = block.get("name").and_then(Value::as_str).unwrap_or("");
        let input = block.get("input").unwrap_or(&Value::Null);
        let file_path = input.get("file_path").and_then(Value::as_str).unwrap_or("");
        if file_path.is_empty() {
            continue;
        }

        let kind = match name {
            // Refined to WriteUpdate later if the result says "update".
            "Write" => OperationKind::WriteCreate,
            "Edit" => OperationKind::Edit,
            "Read" => OperationKind::Read,
            _ => continue,
        };

        let mut op = Operation::new(kind, file_path, timestamp, session_id);
        op.line_number = line_number;
        op.is_subagent = is_subagent;
        op.tool_use_id = block
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string);

        match kind {
            OperationKind::WriteCreate => {
                // Fallback content from the invocation; the result entry is
                // authoritative when it arrives.
                op.content = input.get("content").and_then(Value::as_str).map(str::to_string);
            }
            OperationKind::Edit => {
                op.old_string = input
                    .get("old_string")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                op.new_string = input
                    .get("new_string")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                op.replace_all = input
                    .get("replace_all")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
            }
            OperationKind::Read => {
                op.read_offset = input.get("offset").and_then(value_as_usize);
                op.read_limit = input.get("limit").and_then(value_as_usize);
            }
            _ => {}
        }

        let op_index = ops.len();
        ops.push(op);
        if let Some(id) = ops[op_index].tool_use_id.clone() {
            pending.insert(id, op_index);
        }
    }
}

/// Enrich pending operations with data from a user (tool result) entry.
fn apply_tool_results(entry: &Value, ops: &mut Vec<Operation>, pending: &IndexMap<String, usize>) {
    let tool_result = entry.get("toolUseResult");

    // Externalized tool output, read once and shared by every consumer below.
    let persisted: Option<String> = tool_result
        .and_then(|r| r.get("persistedOutputPath"))
        .and_then(Value::as_str)
        .and_then(|p| match fs::read(p) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                debug!("persisted output {p} unreadable, keeping embedded content: {e}");
                None
            }
        });

    if let Some(result) = tool_result.filter(|r| r.is_object()) {
        enrich_from_tool_result(result, ops, pending);
    }

    // Some client versions report failures as a bare string result.
    if let Some(message) = tool_result
        .and_then(Value::as_str)
        .and_then(|s| s.strip_prefix("Error: "))
    {
        if let Some(tool_use_id) = first_tool_result_id(entry) {
            if let Some(&op_index) = pending.get(tool_use_id) {
                ops[op_index].is_error = true;
                ops[op_index].error_message = Some(message.to_string());
            }
        }
    }

    let Some(blocks) = entry
        .pointer("/message/content")
        .and_then(Value::as_array)
    else {
        return;
    };

    for block in blocks {
        if block.get("type").and_then(Value::as_str) != Some("tool_result") {
            continue;
        }
        let Some(tool_use_id) = block.get("tool_use_id").and_then(Value::as_str) else {
            continue;
        };
        let Some(&op_index) = pending.get(tool_use_id) else {
            continue;
        };

        let mut block_text = block.get("content").and_then(Value::as_str);
        if block_text.is_some_and(|t| t.starts_with("<persisted-output>")) {
            if let Some(full) = persisted.as_deref() {
                block_text = Some(full);
            }
        }

        let op = &mut ops[op_index];
        if block.get("is_error").and_then(Value::as_bool) == Some(true) {
            op.is_error = true;
            if let Some(raw) = block_text {
                op.error_message = Some(
                    TOOL_USE_ERROR_RE
                        .captures(raw)
                        .and_then(|caps| caps.get(1))
                        .map_or_else(|| raw.trim().to_string(), |m| m.as_str().trim().to_string()),
                );
            }
        } else if op.kind == OperationKind::Read && op.content.is_none() {
            if let Some(raw) = block_text {
                op.content = Some(if raw.contains('\u{2192}') {
                    strip_read_line_numbers(raw)
                } else {
                    raw.to_string()
                });
            }
        }
    }
}

/// Enrich the most recent pending operation for a `toolUseResult`'s path.
fn enrich_from_tool_result(result: &Value, ops: &mut [Operation], pending: &IndexMap<String, usize>) {
    // Read results nest the path inside the `file` object.
    let file_path = result
        .get("filePath")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .or_else(|| {
            result
                .pointer("/file/filePath")
                .and_then(Value::as_str)
                .filter(|p| !p.is_empty())
        });
    let Some(file_path) = file_path else {
        return;
    };

    let Some(&op_index) = pending
        .values()
        .rev()
        .find(|&&idx| ops[idx].path == file_path)
    else {
        return;
    };
    let op = &mut ops[op_index];

    match result.get("type").and_then(Value::as_str) {
        Some("create") => {
            op.kind = OperationKind::WriteCreate;
            op.content = result.get("content").and_then(Value::as_str).map(str::to_string);
            op.original_file = None;
        }
        Some("update") => {
            op.kind = OperationKind::WriteUpdate;
            op.content = result.get("content").and_then(Value::as_str).map(str::to_string);
            op.original_file = result
                .get("originalFile")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        _ if op.kind == OperationKind::Edit => {
            op.original_file = result
                .get("originalFile")
                .and_then(Value::as_str)
                .map(str::to_string);
            if let Some(old) = result
                .get("oldString")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
            {
                op.old_string = Some(old.to_string());
            }
            if let Some(new) = result.get("newString").and_then(Value::as_str) {
                op.new_string = Some(new.to_string());
            }
            if let Some(replace_all) = result.get("replaceAll").and_then(Value::as_bool) {
                op.replace_all = replace_all;
            }
        }
        _ if op.kind == OperationKind::Read => {
            if let Some(file_info) = result.get("file") {
                op.read_start_line = file_info.get("startLine").and_then(value_as_usize);
                op.read_num_lines = file_info.get("numLines").and_then(value_as_usize);
                op.read_total_lines = file_info.get("totalLines").and_then(value_as_usize);
            }
        }
        _ => {}
    }
}

/// Emit file-history snapshot operations, reading backup files from disk.
fn collect_history_snapshots(
    entry: &Value,
    timestamp: &str,
    cwd: Option<&str>,
    root: &Path,
    session_id: &str,
    line_number: usize,
    ops: &mut Vec<Operation>,
) {
    let Some(tracked) = entry
        .pointer("/snapshot/trackedFileBackups")
        .and_then(Value::as_object)
    else {
        return;
    };

    for (rel_path, backup_info) in tracked {
        let Some(backup_filename) = backup_info
            .get("backupFileName")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
        else {
            continue;
        };
        let backup_time = backup_info
            .get("backupTime")
            .and_then(Value::as_str)
            .unwrap_or(timestamp);

        let abs_path = match cwd {
            Some(cwd) if !rel_path.starts_with('/') => {
                normalize_path(&Path::new(cwd).join(rel_path))
                    .to_string_lossy()
                    .into_owned()
            }
            _ => rel_path.clone(),
        };

        let snapshot_file = root
            .join("file-history")
            .join(session_id)
            .join(backup_filename);
        let content = match fs::read(&snapshot_file) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                debug!(
                    "file-history backup {} unreadable, skipping: {e}",
                    snapshot_file.display()
                );
                continue;
            }
        };

        let mut op = Operation::new(OperationKind::FileHistory, abs_path, backup_time, session_id);
        op.line_number = line_number;
        op.content = Some(content);
        ops.push(op);
    }
}

/// Field-level no-op Edit test: the Edit provably cannot change the file.
///
/// Errored Edits are kept so callers can still show them.
fn is_noop_edit(op: &Operation) -> bool {
    if op.kind != OperationKind::Edit || op.is_error {
        return false;
    }
    let (Some(old), Some(new)) = (op.old_string.as_deref(), op.new_string.as_deref()) else {
        return true;
    };
    if old.is_empty() || old == new {
        return true;
    }
    if let Some(original) = op.original_file.as_deref() {
        if !original.contains(old) {
            return true;
        }
    }
    false
}

/// Replay-level no-op Edit elimination over a sorted timeline.
///
/// Walks the timeline with the replay rules and drops every Edit whose
/// before/after states are identical — which catches duplicate or retried
/// edits that the field-level check cannot see, because their
/// `original_file` override rebases them onto already-edited content.
pub fn filter_noop_edits_by_replay(operations: Vec<Operation>) -> Vec<Operation> {
    let mut kept = Vec::with_capacity(operations.len());
    let mut content: Option<String> = None;

    for op in operations {
        if op.kind == OperationKind::Edit && !op.is_error {
            // The authoritative pre-edit state when recorded, else the
            // running reconstruction.
            let before = op.original_file.clone().or_else(|| content.clone());
            let after = apply_operation(content.take(), &op);
            let changed = after != before;
            content = after;
            if changed {
                kept.push(op);
            }
        } else {
            content = apply_operation(content.take(), &op);
            kept.push(op);
        }
    }

    kept
}

fn value_as_usize(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|n| usize::try_from(n).ok())
}

fn first_tool_result_id(entry: &Value) -> Option<&str> {
    entry
        .pointer("/message/content")
        .and_then(Value::as_array)?
        .iter()
        .find(|block| block.get("type").and_then(Value::as_str) == Some("tool_result"))?
        .get("tool_use_id")
        .and_then(Value::as_str)
}
