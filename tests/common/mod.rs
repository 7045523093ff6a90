//! Synthetic transcript builders shared by the integration suites.
//!
//! Produces JSONL session files shaped like real Claude Code transcripts:
//! assistant `tool_use` entries, user `tool_result` entries with
//! `toolUseResult` payloads, progress noise, and file-history snapshots.

#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;

/// Format a deterministic test timestamp; `sec` counts from 10:00:00 UTC.
pub fn ts(sec: usize) -> String {
    format!("2026-01-01T10:{:02}:{:02}.000Z", sec / 60, sec % 60)
}

/// Prefix Read output lines with right-aligned numbers and U+2192, the way
/// the Read tool renders them.
pub fn add_line_numbers(content: &str) -> String {
    content
        .split('\n')
        .enumerate()
        .map(|(i, line)| format!("{:>6}\u{2192}{line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds one session transcript line by line.
pub struct TranscriptBuilder {
    session_id: String,
    cwd: Option<String>,
    lines: Vec<String>,
    tool_counter: usize,
}

impl TranscriptBuilder {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            cwd: None,
            lines: Vec::new(),
            tool_counter: 0,
        }
    }

    /// Emit `cwd` on every assistant entry (the scanner takes the first).
    pub fn with_cwd(mut self, cwd: &str) -> Self {
        self.cwd = Some(cwd.to_string());
        self
    }

    fn next_tool_id(&mut self) -> String {
        self.tool_counter += 1;
        format!("toolu_{:04}", self.tool_counter)
    }

    fn push(&mut self, value: serde_json::Value) {
        self.lines.push(value.to_string());
    }

    /// Append a raw line verbatim (for malformed-input tests).
    pub fn raw(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    pub fn progress(&mut self, ts: &str) {
        self.push(json!({
            "type": "progress",
            "timestamp": ts,
            "sessionId": self.session_id,
            "content": "Thinking...",
        }));
    }

    fn assistant_tool_use(&mut self, ts: &str, name: &str, input: serde_json::Value) -> String {
        let tool_id = self.next_tool_id();
        let mut entry = json!({
            "type": "assistant",
            "timestamp": ts,
            "sessionId": self.session_id,
            "message": {
                "role": "assistant",
                "content": [{
                    "type": "tool_use",
                    "id": tool_id,
                    "name": name,
                    "input": input,
                }],
            },
        });
        if let Some(cwd) = &self.cwd {
            entry["cwd"] = json!(cwd);
        }
        self.push(entry);
        tool_id
    }

    /// A Write that created the file: tool_use plus a `create` result.
    pub fn write(&mut self, ts: &str, path: &str, content: &str) {
        let tool_id =
            self.assistant_tool_use(ts, "Write", json!({"file_path": path, "content": content}));
        self.push(json!({
            "type": "user",
            "timestamp": ts,
            "sessionId": self.session_id,
            "toolUseResult": {
                "type": "create",
                "filePath": path,
                "content": content,
                "structuredPatch": [],
                "originalFile": null,
            },
            "message": {
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": tool_id,
                    "content": format!("File created successfully at: {path}"),
                }],
            },
        }));
    }

    /// A Write that overwrote the file: tool_use plus an `update` result.
    pub fn write_update(&mut self, ts: &str, path: &str, content: &str, original: &str) {
        let tool_id =
            self.assistant_tool_use(ts, "Write", json!({"file_path": path, "content": content}));
        self.push(json!({
            "type": "user",
            "timestamp": ts,
            "sessionId": self.session_id,
            "toolUseResult": {
                "type": "update",
                "filePath": path,
                "content": content,
                "structuredPatch": [],
                "originalFile": original,
            },
            "message": {
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": tool_id,
                    "content": format!("File updated successfully at: {path}"),
                }],
            },
        }));
    }

    /// An Edit with its result entry; `original` is the pre-edit file state.
    pub fn edit(&mut self, ts: &str, path: &str, old: &str, new: &str, original: Option<&str>) {
        let tool_id = self.assistant_tool_use(
            ts,
            "Edit",
            json!({"file_path": path, "old_string": old, "new_string": new}),
        );
        self.push(json!({
            "type": "user",
            "timestamp": ts,
            "sessionId": self.session_id,
            "toolUseResult": {
                "filePath": path,
                "oldString": old,
                "newString": new,
                "originalFile": original,
                "replaceAll": false,
                "structuredPatch": [],
            },
            "message": {
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": tool_id,
                    "content": format!("The file {path} has been updated."),
                }],
            },
        }));
    }

    /// An Edit whose invocation never got a result entry.
    pub fn edit_without_result(&mut self, ts: &str, path: &str, old: &str, new: &str) {
        self.assistant_tool_use(
            ts,
            "Edit",
            json!({"file_path": path, "old_string": old, "new_string": new}),
        );
    }

    /// An Edit that failed with a wrapped tool_use_error.
    pub fn edit_error(&mut self, ts: &str, path: &str, old: &str, new: &str, message: &str) {
        let tool_id = self.assistant_tool_use(
            ts,
            "Edit",
            json!({"file_path": path, "old_string": old, "new_string": new}),
        );
        self.push(json!({
            "type": "user",
            "timestamp": ts,
            "sessionId": self.session_id,
            "message": {
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": tool_id,
                    "is_error": true,
                    "content": format!("<tool_use_error>{message}</tool_use_error>"),
                }],
            },
        }));
    }

    /// A full Read: no range parameters, line-numbered output, metadata
    /// spanning the whole file.
    pub fn read_full(&mut self, ts: &str, path: &str, content: &str) {
        let total = content.split('\n').count();
        let tool_id = self.assistant_tool_use(ts, "Read", json!({"file_path": path}));
        self.push(json!({
            "type": "user",
            "timestamp": ts,
            "sessionId": self.session_id,
            "toolUseResult": {
                "type": "text",
                "file": {
                    "filePath": path,
                    "content": content,
                    "startLine": 1,
                    "numLines": total,
                    "totalLines": total,
                },
            },
            "message": {
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": tool_id,
                    "content": add_line_numbers(content),
                }],
            },
        }));
    }

    /// A ranged Read covering `[start, start + num)` of a `total`-line file.
    pub fn read_partial(
        &mut self,
        ts: &str,
        path: &str,
        content: &str,
        start: usize,
        num: usize,
        total: usize,
    ) {
        let tool_id = self.assistant_tool_use(
            ts,
            "Read",
            json!({"file_path": path, "offset": start, "limit": num}),
        );
        self.push(json!({
            "type": "user",
            "timestamp": ts,
            "sessionId": self.session_id,
            "toolUseResult": {
                "type": "text",
                "file": {
                    "filePath": path,
                    "content": content,
                    "startLine": start,
                    "numLines": num,
                    "totalLines": total,
                },
            },
            "message": {
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": tool_id,
                    "content": content,
                }],
            },
        }));
    }

    /// A file-history snapshot entry tracking `(rel_path, backup_file_name,
    /// backup_time)` tuples.
    pub fn file_history(&mut self, ts: &str, backups: &[(&str, &str, &str)]) {
        let mut tracked = serde_json::Map::new();
        for (rel_path, backup_file, backup_time) in backups {
            tracked.insert(
                (*rel_path).to_string(),
                json!({"backupFileName": backup_file, "backupTime": backup_time}),
            );
        }
        self.push(json!({
            "type": "file-history-snapshot",
            "timestamp": ts,
            "snapshot": {"trackedFileBackups": tracked},
        }));
    }

    pub fn build(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// A fake `~/.claude` tree on disk.
pub struct FakeClaudeDir {
    pub dir: TempDir,
}

impl FakeClaudeDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn write_session(&self, slug: &str, session_id: &str, transcript: &str) -> PathBuf {
        let path = self
            .root()
            .join("projects")
            .join(slug)
            .join(format!("{session_id}.jsonl"));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, transcript).unwrap();
        path
    }

    pub fn write_backup_session(
        &self,
        slug: &str,
        session_id: &str,
        suffix: &str,
        transcript: &str,
    ) -> PathBuf {
        let path = self
            .root()
            .join("projects")
            .join(slug)
            .join(format!("{session_id}.jsonl.backup.{suffix}"));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, transcript).unwrap();
        path
    }

    pub fn write_subagent(
        &self,
        slug: &str,
        session_id: &str,
        agent_name: &str,
        transcript: &str,
    ) -> PathBuf {
        let path = self
            .root()
            .join("projects")
            .join(slug)
            .join(session_id)
            .join("subagents")
            .join(format!("{agent_name}.jsonl"));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, transcript).unwrap();
        path
    }

    pub fn write_history_backup(&self, session_id: &str, backup_name: &str, content: &str) {
        let path = self
            .root()
            .join("file-history")
            .join(session_id)
            .join(backup_name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
    }
}
