//! Filesystem-based symlink alias detection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{SymlinkGroup, DETECTED_BY_FS};
use crate::util::normalize_path;

/// Walk a path's directory prefixes from the root down and return the
/// shallowest prefix that is a symlink, or `None`.
///
/// `cache` maps already-probed prefixes to their resolved targets so
/// repeated syscalls across a large index are avoided.
pub fn find_symlink_prefix(
    file_path: &str,
    cache: &mut HashMap<PathBuf, Option<PathBuf>>,
) -> Option<PathBuf> {
    let path = Path::new(file_path);
    let mut prefixes: Vec<PathBuf> = path.ancestors().map(Path::to_path_buf).collect();
    prefixes.reverse();

    for prefix in prefixes {
        // The bare root can't be a symlink; skip the probing noise.
        if prefix.as_os_str().is_empty() || prefix == Path::new("/") {
            continue;
        }

        let target = cache
            .entry(prefix.clone())
            .or_insert_with(|| resolve_symlink(&prefix));
        if target.is_some() {
            return Some(prefix);
        }
    }

    None
}

/// Resolve a symlink to its normalized target, or `None` when the path is
/// not a symlink (or cannot be inspected).
fn resolve_symlink(path: &Path) -> Option<PathBuf> {
    let metadata = std::fs::symlink_metadata(path).ok()?;
    if !metadata.file_type().is_symlink() {
        return None;
    }
    let target = std::fs::read_link(path).ok()?;
    let absolute = if target.is_absolute() {
        target
    } else {
        path.parent()?.join(target)
    };
    Some(normalize_path(&absolute))
}

/// Detect symlinked directory prefixes by probing the live filesystem.
///
/// Walks each path's components from the root down, records the shallowest
/// symlinked prefix, then groups prefixes that resolve to the same target.
/// Groups are sorted by canonical path and each alias is tagged with the
/// `"FS"` detection method.
#[must_use]
pub fn detect_fs_symlinks<'a>(file_paths: impl IntoIterator<Item = &'a str>) -> Vec<SymlinkGroup> {
    let mut cache: HashMap<PathBuf, Option<PathBuf>> = HashMap::new();
    let mut alias_targets: HashMap<PathBuf, PathBuf> = HashMap::new();

    for file_path in file_paths {
        if let Some(prefix) = find_symlink_prefix(file_path, &mut cache) {
            if let Some(Some(target)) = cache.get(&prefix) {
                alias_targets.insert(prefix, target.clone());
            }
        }
    }

    let mut target_to_aliases: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
    for (alias, target) in alias_targets {
        target_to_aliases.entry(target).or_default().push(alias);
    }

    let mut groups: Vec<SymlinkGroup> = target_to_aliases
        .into_iter()
        .map(|(target, mut aliases)| {
            aliases.sort_unstable();
            let aliases: Vec<String> = aliases
                .into_iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect();
            let mut group = SymlinkGroup::new(target.to_string_lossy().into_owned(), aliases);
            for alias in &group.aliases {
                group
                    .detection_methods
                    .insert(alias.clone(), DETECTED_BY_FS.to_string());
            }
            group
        })
        .collect();
    groups.sort_by(|a, b| a.canonical.cmp(&b.canonical));
    groups
}
