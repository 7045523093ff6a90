//! Folding aliased timelines onto canonical paths.

use indexmap::IndexMap;

use super::SymlinkGroup;
use crate::model::{FileIndex, FileTimeline};

/// Build a new file index with aliased paths merged into canonical entries.
///
/// For each path, the longest matching alias prefix wins; the canonical path
/// is the group's target plus the path remainder. Operations that moved get
/// `source_path` set to the path they were originally seen under. Timelines
/// that land on the same canonical path are folded together and re-sorted.
///
/// The input index is not mutated; the operation multiset is preserved.
#[must_use]
pub fn merge_file_index(files: &FileIndex, groups: &[SymlinkGroup]) -> FileIndex {
    let mut alias_to_canonical: IndexMap<&str, &str> = IndexMap::new();
    for group in groups {
        for alias in &group.aliases {
            alias_to_canonical.insert(alias.as_str(), group.canonical.as_str());
        }
    }

    // Longest alias first so the most specific prefix wins; ties broken
    // lexicographically for determinism.
    let mut sorted_aliases: Vec<&str> = alias_to_canonical.keys().copied().collect();
    sorted_aliases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let resolve = |path: &str| -> Option<String> {
        for alias in &sorted_aliases {
            if path == *alias || path.starts_with(&format!("{alias}/")) {
                let canonical = alias_to_canonical[alias];
                return Some(format!("{canonical}{}", &path[alias.len()..]));
            }
        }
        None
    };

    let mut merged: FileIndex = IndexMap::new();
    for (path, timeline) in files {
        let rewritten = resolve(path);
        let canonical_path = rewritten.clone().unwrap_or_else(|| path.clone());

        let target = merged
            .entry(canonical_path.clone())
            .or_insert_with(|| FileTimeline::new(canonical_path));
        for op in &timeline.operations {
            let mut op = op.clone();
            op.path.clone_from(&target.path);
            if rewritten.is_some() {
                op.source_path = Some(path.clone());
            }
            target.operations.push(op);
        }
    }

    for timeline in merged.values_mut() {
        timeline.sort_operations();
    }
    merged
}
