//! Integration tests for claude-salvage.
//!
//! These tests drive the full pipeline — synthetic transcript trees on
//! disk, scanning, optional passes, reconstruction — using the builders in
//! `common`.

mod common;

use claude_salvage::extract::{filter_by_timestamp, Extractor};
use claude_salvage::injection::{detect_injected_content, strip_injected_content};
use claude_salvage::model::OperationKind;
use claude_salvage::replay::{reconstruct_at_timestamp, reconstruct_latest};
use claude_salvage::scanner::Scanner;
use claude_salvage::symlinks::{detect_fs_symlinks, merge_file_index};

use common::{ts, FakeClaudeDir, TranscriptBuilder};
use serde_json::json;

mod scanning {
    use super::*;

    #[test]
    fn test_write_edit_read_chain() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1");
        session.progress(&ts(9));
        session.write(&ts(10), "/proj/app.py", "line1\nline2\nline3\n");
        session.edit(
            &ts(11),
            "/proj/app.py",
            "line2",
            "LINE2",
            Some("line1\nline2\nline3\n"),
        );
        session.read_full(&ts(12), "/proj/app.py", "line1\nLINE2\nline3\n");
        claude.write_session("-proj", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();

        assert_eq!(index.len(), 1);
        let timeline = &index["/proj/app.py"];
        let kinds: Vec<_> = timeline.operations.iter().map(|op| op.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OperationKind::WriteCreate,
                OperationKind::Edit,
                OperationKind::Read,
            ]
        );
        assert!(timeline.has_full_content());
        assert_eq!(
            reconstruct_latest(timeline).as_deref(),
            Some("line1\nLINE2\nline3\n")
        );
    }

    #[test]
    fn test_read_line_numbers_are_stripped() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1");
        session.read_full(&ts(10), "/proj/notes.txt", "alpha\nbeta");
        claude.write_session("-proj", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();
        let op = &index["/proj/notes.txt"].operations[0];
        assert_eq!(op.content.as_deref(), Some("alpha\nbeta"));
        assert!(op.is_full_read());
    }

    #[test]
    fn test_write_update_captures_original_file() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1");
        session.write(&ts(10), "/proj/f.txt", "v1");
        session.write_update(&ts(11), "/proj/f.txt", "v2", "v1");
        claude.write_session("-proj", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();
        let ops = &index["/proj/f.txt"].operations;
        assert_eq!(ops[0].kind, OperationKind::WriteCreate);
        assert_eq!(ops[0].original_file, None);
        assert_eq!(ops[1].kind, OperationKind::WriteUpdate);
        assert_eq!(ops[1].original_file.as_deref(), Some("v1"));
        assert_eq!(reconstruct_latest(&index["/proj/f.txt"]).as_deref(), Some("v2"));
    }

    #[test]
    fn test_noop_edit_is_eliminated() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1");
        session.write(&ts(10), "/proj/x.txt", "x");
        // "y" never occurs in the content; the edit cannot change anything.
        session.edit_without_result(&ts(11), "/proj/x.txt", "y", "z");
        claude.write_session("-proj", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();
        let timeline = &index["/proj/x.txt"];
        assert_eq!(timeline.operation_count(), 1);
        assert_eq!(timeline.operations[0].kind, OperationKind::WriteCreate);
    }

    #[test]
    fn test_errored_edit_is_kept_but_inert() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1");
        session.write(&ts(10), "/proj/f.txt", "content");
        session.edit_error(
            &ts(11),
            "/proj/f.txt",
            "missing",
            "replacement",
            "String to replace not found in file",
        );
        claude.write_session("-proj", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();
        let timeline = &index["/proj/f.txt"];
        assert_eq!(timeline.operation_count(), 2);

        let errored = &timeline.operations[1];
        assert!(errored.is_error);
        assert_eq!(
            errored.error_message.as_deref(),
            Some("String to replace not found in file")
        );
        assert_eq!(reconstruct_latest(timeline).as_deref(), Some("content"));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1");
        session.raw("this is not json at all");
        session.write(&ts(10), "/proj/ok.txt", "fine");
        session.raw("{\"type\": \"assistant\", \"truncated");
        claude.write_session("-proj", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();
        assert_eq!(index.len(), 1);
        assert_eq!(reconstruct_latest(&index["/proj/ok.txt"]).as_deref(), Some("fine"));
    }

    #[test]
    fn test_subagent_transcripts_are_marked_and_attributed() {
        let claude = FakeClaudeDir::new();
        let mut agent = TranscriptBuilder::new("ignored-by-scanner");
        agent.write(&ts(10), "/proj/sub.txt", "from subagent");
        claude.write_subagent("-proj", "parent-session", "agent-ab12cd", &agent.build());

        let index = Scanner::new(claude.root()).scan();
        let op = &index["/proj/sub.txt"].operations[0];
        assert!(op.is_subagent);
        assert_eq!(op.session_id, "parent-session");
    }

    #[test]
    fn test_backup_transcripts_share_the_session_id() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("abc-123");
        session.write(&ts(10), "/proj/b.txt", "backup copy");
        claude.write_backup_session("-proj", "abc-123", "1767265200", &session.build());

        let index = Scanner::new(claude.root()).scan();
        assert_eq!(index["/proj/b.txt"].operations[0].session_id, "abc-123");
    }

    #[test]
    fn test_cross_session_ordering_is_by_timestamp() {
        let claude = FakeClaudeDir::new();

        let mut first = TranscriptBuilder::new("session-a");
        first.write(&ts(10), "/proj/f.txt", "v1");
        first.edit(&ts(30), "/proj/f.txt", "v1", "v3", Some("v1"));
        claude.write_session("-proj", "session-a", &first.build());

        let mut second = TranscriptBuilder::new("session-b");
        second.write_update(&ts(20), "/proj/f.txt", "v2", "v1");
        claude.write_session("-proj", "session-b", &second.build());

        let index = Scanner::new(claude.root()).scan();
        let sessions: Vec<_> = index["/proj/f.txt"]
            .operations
            .iter()
            .map(|op| op.session_id.clone())
            .collect();
        assert_eq!(sessions, vec!["session-a", "session-b", "session-a"]);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let claude = FakeClaudeDir::new();
        for session_id in ["s-one", "s-two", "s-three"] {
            let mut session = TranscriptBuilder::new(session_id);
            session.write(&ts(10), &format!("/proj/{session_id}.txt"), session_id);
            session.write(&ts(11), "/proj/shared.txt", session_id);
            claude.write_session("-proj", session_id, &session.build());
        }

        let scanner = Scanner::new(claude.root()).with_workers(4);
        let first = scanner.scan();
        let second = scanner.scan();

        let first_keys: Vec<_> = first.keys().cloned().collect();
        let second_keys: Vec<_> = second.keys().cloned().collect();
        assert_eq!(first_keys, second_keys);

        let order = |index: &claude_salvage::FileIndex| -> Vec<(String, usize)> {
            index["/proj/shared.txt"]
                .operations
                .iter()
                .map(|op| (op.session_id.clone(), op.line_number))
                .collect()
        };
        assert_eq!(order(&first), order(&second));
    }

    #[test]
    fn test_progress_callback_reports_every_transcript() {
        let claude = FakeClaudeDir::new();
        for session_id in ["s1", "s2"] {
            let mut session = TranscriptBuilder::new(session_id);
            session.write(&ts(10), "/proj/f.txt", "x");
            claude.write_session("-proj", session_id, &session.build());
        }

        let mut ticks: Vec<(usize, usize)> = Vec::new();
        let mut on_progress = |completed: usize, total: usize| ticks.push((completed, total));
        let _ = Scanner::new(claude.root()).scan_with_progress(Some(&mut on_progress));

        ticks.sort_unstable();
        assert_eq!(ticks, vec![(1, 2), (2, 2)]);
    }
}

mod auxiliary_files {
    use super::*;

    #[test]
    fn test_file_history_snapshot_resolves_relative_paths() {
        let claude = FakeClaudeDir::new();
        claude.write_history_backup("session-1", "backup-0001.txt", "snapshot body\n");

        let mut session = TranscriptBuilder::new("session-1").with_cwd("/work/app");
        session.write(&ts(10), "/work/app/other.txt", "anchor cwd");
        session.file_history(&ts(11), &[("src/../src/config.toml", "backup-0001.txt", &ts(11))]);
        claude.write_session("-work-app", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();
        let timeline = &index["/work/app/src/config.toml"];
        assert_eq!(timeline.operation_count(), 1);
        let op = &timeline.operations[0];
        assert_eq!(op.kind, OperationKind::FileHistory);
        assert_eq!(op.content.as_deref(), Some("snapshot body\n"));
        assert_eq!(op.timestamp, ts(11));
    }

    #[test]
    fn test_missing_history_backup_is_skipped() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1").with_cwd("/work");
        session.write(&ts(10), "/work/present.txt", "x");
        session.file_history(&ts(11), &[("gone.txt", "no-such-backup.txt", &ts(11))]);
        claude.write_session("-work", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();
        assert_eq!(index.len(), 1);
        assert!(index.contains_key("/work/present.txt"));
    }

    #[test]
    fn test_persisted_output_replaces_marker() {
        let claude = FakeClaudeDir::new();
        let persisted = claude.root().join("persisted-read.txt");
        std::fs::write(&persisted, "full externalized output").unwrap();

        let mut session = TranscriptBuilder::new("session-1");
        session.raw(
            &json!({
                "type": "assistant",
                "timestamp": ts(10),
                "sessionId": "session-1",
                "message": {"role": "assistant", "content": [{
                    "type": "tool_use",
                    "id": "toolu_persist",
                    "name": "Read",
                    "input": {"file_path": "/proj/big.txt"},
                }]},
            })
            .to_string(),
        );
        session.raw(
            &json!({
                "type": "user",
                "timestamp": ts(10),
                "sessionId": "session-1",
                "toolUseResult": {"persistedOutputPath": persisted.to_string_lossy()},
                "message": {"role": "user", "content": [{
                    "type": "tool_result",
                    "tool_use_id": "toolu_persist",
                    "content": "<persisted-output>",
                }]},
            })
            .to_string(),
        );
        claude.write_session("-proj", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();
        let op = &index["/proj/big.txt"].operations[0];
        assert_eq!(op.content.as_deref(), Some("full externalized output"));
    }
}

mod passes {
    use super::*;

    #[test]
    fn test_symlink_detection_and_merge_end_to_end() {
        let claude = FakeClaudeDir::new();
        let canonical_dir = claude.root().join("real-project");
        std::fs::create_dir_all(&canonical_dir).unwrap();
        let alias_dir = claude.root().join("linked-project");
        #[cfg(unix)]
        std::os::unix::fs::symlink(&canonical_dir, &alias_dir).unwrap();
        #[cfg(not(unix))]
        return;

        let canonical_file = format!("{}/a.txt", canonical_dir.display());
        let alias_file = format!("{}/a.txt", alias_dir.display());

        let mut session = TranscriptBuilder::new("session-1");
        session.write(&ts(10), &canonical_file, "v1");
        session.edit(&ts(12), &canonical_file, "v1", "v2", Some("v1"));
        session.read_full(&ts(11), &alias_file, "v1");
        claude.write_session("-proj", "session-1", &session.build());

        let raw = Scanner::new(claude.root()).scan();
        assert_eq!(raw.len(), 2);
        let raw_total: usize = raw.values().map(|tl| tl.operation_count()).sum();

        let groups = detect_fs_symlinks(raw.keys().map(String::as_str));
        assert_eq!(groups.len(), 1);

        let merged = merge_file_index(&raw, &groups);
        assert_eq!(merged.len(), 1);
        let timeline = &merged[&canonical_file];
        assert_eq!(timeline.operation_count(), raw_total);

        // The aliased Read slots between the canonical write and edit.
        let kinds: Vec<_> = timeline.operations.iter().map(|op| op.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OperationKind::WriteCreate,
                OperationKind::Read,
                OperationKind::Edit,
            ]
        );
        assert_eq!(
            timeline.operations[1].source_path.as_deref(),
            Some(alias_file.as_str())
        );
        assert_eq!(reconstruct_latest(timeline).as_deref(), Some("v2"));
    }

    #[test]
    fn test_injection_detection_and_strip_end_to_end() {
        let suffix = "SYSTEM NOTE\nThis block was appended by the client.";
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1");
        session.read_full(&ts(10), "/proj/a.txt", &format!("real a\n\n{suffix}"));
        session.read_full(&ts(11), "/proj/b.txt", &format!("real b\n\n{suffix}"));
        session.read_full(&ts(12), "/proj/c.txt", "real c, clean");
        claude.write_session("-proj", "session-1", &session.build());

        let mut index = Scanner::new(claude.root()).scan();
        let patterns = detect_injected_content(&index, 0.20);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].content, suffix);
        assert_eq!(patterns[0].affected_file_count, 2);

        let modified = strip_injected_content(&mut index, &patterns);
        assert_eq!(modified, 2);
        assert_eq!(reconstruct_latest(&index["/proj/a.txt"]).as_deref(), Some("real a"));
        assert_eq!(reconstruct_latest(&index["/proj/b.txt"]).as_deref(), Some("real b"));
        assert_eq!(
            reconstruct_latest(&index["/proj/c.txt"]).as_deref(),
            Some("real c, clean")
        );
    }

    #[test]
    fn test_time_bounded_view() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1");
        session.write(&ts(10), "/proj/f.txt", "A");
        session.write_update(&ts(20), "/proj/f.txt", "B", "A");
        session.write_update(&ts(30), "/proj/f.txt", "C", "B");
        session.write(&ts(40), "/proj/late.txt", "late file");
        claude.write_session("-proj", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();

        let trimmed = filter_by_timestamp(&index, &ts(15));
        assert_eq!(trimmed.len(), 1);
        assert_eq!(reconstruct_latest(&trimmed["/proj/f.txt"]).as_deref(), Some("A"));

        assert_eq!(
            reconstruct_at_timestamp(&index["/proj/f.txt"], &ts(20)).as_deref(),
            Some("B")
        );
        assert_eq!(reconstruct_at_timestamp(&index["/proj/f.txt"], &ts(5)), None);
    }

    #[test]
    fn test_extraction_mirrors_paths_on_disk() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1");
        session.write(&ts(10), "/proj/src/main.rs", "fn main() {}\n");
        session.write(&ts(11), "/proj/README.md", "# readme\n");
        claude.write_session("-proj", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();
        let out = tempfile::tempdir().unwrap();
        let report = Extractor::new(out.path()).extract_all(&index, None);

        assert_eq!(report.written, 2);
        assert_eq!(
            std::fs::read_to_string(out.path().join("proj/src/main.rs")).unwrap(),
            "fn main() {}\n"
        );
        assert_eq!(
            std::fs::read_to_string(out.path().join("proj/README.md")).unwrap(),
            "# readme\n"
        );
    }
}

mod splicing {
    use super::*;

    #[test]
    fn test_partial_reads_grow_a_file_without_snapshots() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1");
        session.read_partial(&ts(10), "/proj/grown.txt", "C\nD", 3, 2, 5);
        session.read_partial(&ts(11), "/proj/grown.txt", "A\nB", 1, 2, 5);
        claude.write_session("-proj", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();
        let timeline = &index["/proj/grown.txt"];
        assert!(!timeline.has_full_content());
        assert_eq!(reconstruct_latest(timeline).as_deref(), Some("A\nB\nC\nD\n"));
    }

    #[test]
    fn test_partial_read_overlays_written_content() {
        let claude = FakeClaudeDir::new();
        let mut session = TranscriptBuilder::new("session-1");
        session.write(&ts(10), "/proj/f.txt", "a\nb\nc\nd\ne");
        session.read_partial(&ts(11), "/proj/f.txt", "B\nC", 2, 2, 5);
        claude.write_session("-proj", "session-1", &session.build());

        let index = Scanner::new(claude.root()).scan();
        assert_eq!(
            reconstruct_latest(&index["/proj/f.txt"]).as_deref(),
            Some("a\nB\nC\nd\ne")
        );
    }
}
