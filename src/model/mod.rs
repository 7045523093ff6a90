//! Data model for file-recovery timelines.
//!
//! A scan produces one [`FileTimeline`] per absolute file path, holding every
//! [`Operation`] that touched that path across all sessions. Timelines are
//! ordered by `(timestamp, session_id, line_number)`; that order is the
//! replay order used for reconstruction.
//!
//! Every textual field that may be unknown is an `Option` — an empty string
//! is legitimate file content (empty files, cleared buffers) and must stay
//! distinguishable from "not observed".

use indexmap::IndexMap;
use serde::Serialize;

/// The scan result: absolute file path mapped to its operation timeline.
///
/// Insertion order is preserved so repeated scans of the same tree produce
/// the same index.
pub type FileIndex = IndexMap<String, FileTimeline>;

/// The kind of a transcript-recorded file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// A Write tool call that created the file.
    WriteCreate,
    /// A Write tool call that overwrote an existing file.
    WriteUpdate,
    /// An Edit tool call (string replacement).
    Edit,
    /// A Read tool call (full or ranged).
    Read,
    /// A file-history backup snapshot taken by the client.
    FileHistory,
}

impl OperationKind {
    /// Short label used in per-timeline summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WriteCreate | Self::WriteUpdate => "write",
            Self::Edit => "edit",
            Self::Read => "read",
            Self::FileHistory => "snapshot",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WriteCreate => write!(f, "write (create)"),
            Self::WriteUpdate => write!(f, "write (update)"),
            Self::Edit => write!(f, "edit"),
            Self::Read => write!(f, "read"),
            Self::FileHistory => write!(f, "file-history snapshot"),
        }
    }
}

/// A single file operation extracted from a session transcript.
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    /// Operation kind.
    pub kind: OperationKind,
    /// Absolute path of the file the operation targeted.
    pub path: String,
    /// ISO 8601 UTC timestamp. Stored as a string whose lexicographic order
    /// equals chronological order.
    pub timestamp: String,
    /// UUID of the session the operation was recorded in.
    pub session_id: String,
    /// 1-indexed line number in the transcript. Stable intra-session tiebreak.
    pub line_number: usize,
    /// Tool use id correlating the invocation with its result entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
    /// Whether the operation came from a subagent transcript.
    pub is_subagent: bool,

    /// Full textual snapshot (Write result, Read content, history backup).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Authoritative pre-edit file contents (Edit and Write-update results).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_file: Option<String>,
    /// Edit search string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_string: Option<String>,
    /// Edit replacement string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_string: Option<String>,
    /// Whether the Edit replaces every occurrence.
    pub replace_all: bool,

    /// Requested Read window start line (1-indexed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_offset: Option<usize>,
    /// Requested Read window line count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_limit: Option<usize>,
    /// Observed Read window start line, from the response metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_start_line: Option<usize>,
    /// Observed Read window line count, from the response metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_num_lines: Option<usize>,
    /// Total file line count at Read time, from the response metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_total_lines: Option<usize>,

    /// Whether the tool call returned an error. Errored operations stay in
    /// the timeline for diagnostics but never mutate replay state.
    pub is_error: bool,
    /// The error message, if one was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Original path this operation was seen under, set when the symlink
    /// merge rewrote `path` onto a canonical prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

impl Operation {
    /// Create an operation with the required identity fields; payload fields
    /// start absent.
    #[must_use]
    pub fn new(
        kind: OperationKind,
        path: impl Into<String>,
        timestamp: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            timestamp: timestamp.into(),
            session_id: session_id.into(),
            line_number: 0,
            tool_use_id: None,
            is_subagent: false,
            content: None,
            original_file: None,
            old_string: None,
            new_string: None,
            replace_all: false,
            read_offset: None,
            read_limit: None,
            read_start_line: None,
            read_num_lines: None,
            read_total_lines: None,
            is_error: false,
            error_message: None,
            source_path: None,
        }
    }

    /// The total-order key used everywhere a timeline is sorted.
    #[must_use]
    pub fn sort_key(&self) -> (&str, &str, usize) {
        (&self.timestamp, &self.session_id, self.line_number)
    }

    /// Whether a Read operation covered the whole file.
    ///
    /// Response metadata wins when present: the window is full iff it starts
    /// at line 1 and spans every line. Without metadata, an unranged request
    /// (no offset, no limit) is a full read.
    #[must_use]
    pub fn is_full_read(&self) -> bool {
        match self.read_start_line {
            Some(start) => start == 1 && self.read_num_lines == self.read_total_lines,
            None => self.read_offset.is_none() && self.read_limit.is_none(),
        }
    }
}

/// A recoverable file: one absolute path and its ordered operations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileTimeline {
    /// Absolute path.
    pub path: String,
    /// Operations across all sessions, sorted by
    /// `(timestamp, session_id, line_number)` once aggregation completes.
    pub operations: Vec<Operation>,
}

impl FileTimeline {
    /// Create an empty timeline for a path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operations: Vec::new(),
        }
    }

    /// Most recent operation timestamp, or `""` for an empty timeline.
    #[must_use]
    pub fn latest_timestamp(&self) -> &str {
        self.operations
            .iter()
            .map(|op| op.timestamp.as_str())
            .max()
            .unwrap_or("")
    }

    /// Number of operations.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Whether full recovery is possible: the timeline holds a Write, a
    /// file-history snapshot, or an unranged Read — not just Edits and
    /// partial Reads.
    #[must_use]
    pub fn has_full_content(&self) -> bool {
        self.operations.iter().any(|op| match op.kind {
            OperationKind::WriteCreate | OperationKind::WriteUpdate | OperationKind::FileHistory => {
                true
            }
            OperationKind::Read => op.read_offset.is_none() && op.read_limit.is_none(),
            OperationKind::Edit => false,
        })
    }

    /// Human-readable operation-kind summary, e.g. `"3 writes, 2 edits"`.
    #[must_use]
    pub fn kind_summary(&self) -> String {
        let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
        for op in &self.operations {
            *counts.entry(op.kind.label()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(label, count)| {
                if count == 1 {
                    format!("{count} {label}")
                } else {
                    format!("{count} {label}s")
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Sort operations into replay order. Stable, so operations with equal
    /// keys keep their aggregation order.
    pub fn sort_operations(&mut self) {
        self.operations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(kind: OperationKind, ts: &str) -> Operation {
        Operation::new(kind, "/tmp/a.txt", ts, "session-1")
    }

    #[test]
    fn test_latest_timestamp() {
        let mut tl = FileTimeline::new("/tmp/a.txt");
        assert_eq!(tl.latest_timestamp(), "");

        tl.operations.push(op(OperationKind::WriteCreate, "2026-01-01T00:00:00.000Z"));
        tl.operations.push(op(OperationKind::Edit, "2026-01-03T00:00:00.000Z"));
        tl.operations.push(op(OperationKind::Read, "2026-01-02T00:00:00.000Z"));
        assert_eq!(tl.latest_timestamp(), "2026-01-03T00:00:00.000Z");
    }

    #[test]
    fn test_has_full_content() {
        let mut tl = FileTimeline::new("/tmp/a.txt");
        let mut edit = op(OperationKind::Edit, "t1");
        edit.old_string = Some("a".into());
        edit.new_string = Some("b".into());
        tl.operations.push(edit);
        assert!(!tl.has_full_content());

        let mut partial_read = op(OperationKind::Read, "t2");
        partial_read.read_offset = Some(10);
        partial_read.read_limit = Some(5);
        tl.operations.push(partial_read);
        assert!(!tl.has_full_content());

        tl.operations.push(op(OperationKind::Read, "t3"));
        assert!(tl.has_full_content());
    }

    #[test]
    fn test_is_full_read_from_metadata() {
        let mut read = op(OperationKind::Read, "t1");
        read.read_start_line = Some(1);
        read.read_num_lines = Some(42);
        read.read_total_lines = Some(42);
        assert!(read.is_full_read());

        read.read_start_line = Some(3);
        assert!(!read.is_full_read());
    }

    #[test]
    fn test_is_full_read_from_request_params() {
        let mut read = op(OperationKind::Read, "t1");
        assert!(read.is_full_read());

        read.read_offset = Some(1);
        assert!(!read.is_full_read());
    }

    #[test]
    fn test_sort_operations_total_order() {
        let mut tl = FileTimeline::new("/tmp/a.txt");
        let mut a = op(OperationKind::Read, "2026-01-01T00:00:00.000Z");
        a.line_number = 9;
        let mut b = op(OperationKind::Read, "2026-01-01T00:00:00.000Z");
        b.session_id = "session-0".into();
        b.line_number = 50;
        let mut c = op(OperationKind::Read, "2026-01-01T00:00:00.000Z");
        c.line_number = 3;
        tl.operations = vec![a, b, c];
        tl.sort_operations();

        let keys: Vec<_> = tl.operations.iter().map(|o| (o.session_id.clone(), o.line_number)).collect();
        assert_eq!(
            keys,
            vec![
                ("session-0".to_string(), 50),
                ("session-1".to_string(), 3),
                ("session-1".to_string(), 9),
            ]
        );
    }

    #[test]
    fn test_kind_summary() {
        let mut tl = FileTimeline::new("/tmp/a.txt");
        tl.operations.push(op(OperationKind::WriteCreate, "t1"));
        tl.operations.push(op(OperationKind::WriteUpdate, "t2"));
        tl.operations.push(op(OperationKind::Edit, "t3"));
        tl.operations.push(op(OperationKind::FileHistory, "t4"));
        assert_eq!(tl.kind_summary(), "1 edit, 1 snapshot, 2 writes");
    }
}
