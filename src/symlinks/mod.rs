//! Symlink alias detection and timeline merging.
//!
//! The same file is often reached through different absolute paths when a
//! directory prefix is symlinked (`/tmp` vs `/private/tmp`, worktree links,
//! …). Detection probes the live filesystem for symlinked prefixes; merging
//! folds every aliased timeline onto its canonical path. Mappings round-trip
//! through a YAML file so a reviewed set can be reused across runs.

mod detect;
mod merge;

pub use detect::*;
pub use merge::*;

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, SalvageError};

/// Detection method label for filesystem-probed aliases.
pub const DETECTED_BY_FS: &str = "FS";

/// A canonical path and its known alias prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymlinkGroup {
    /// The resolved target directory.
    pub canonical: String,
    /// Symlinked directory paths that resolve to `canonical`.
    pub aliases: Vec<String>,
    /// How each alias was detected. Display metadata only — never persisted
    /// to the YAML mapping.
    pub detection_methods: HashMap<String, String>,
}

impl SymlinkGroup {
    /// Create a group from a canonical path and its aliases.
    #[must_use]
    pub fn new(canonical: impl Into<String>, aliases: Vec<String>) -> Self {
        Self {
            canonical: canonical.into(),
            aliases,
            detection_methods: HashMap::new(),
        }
    }
}

/// Write symlink groups to a YAML mapping file.
///
/// Format:
///
/// ```yaml
/// /private/tmp/project:
///   - /tmp/project
/// ```
///
/// Groups without aliases are skipped; aliases are sorted so the output is
/// deterministic.
pub fn save_symlink_yaml(groups: &[SymlinkGroup], path: &Path) -> Result<()> {
    let mut data: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for group in groups {
        if group.aliases.is_empty() {
            continue;
        }
        let mut aliases: Vec<&str> = group.aliases.iter().map(String::as_str).collect();
        aliases.sort_unstable();
        data.insert(&group.canonical, aliases);
    }

    let yaml = serde_yaml::to_string(&data)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            SalvageError::io(format!("Failed to create {}", parent.display()), e)
        })?;
    }
    std::fs::write(path, yaml)
        .map_err(|e| SalvageError::io(format!("Failed to write {}", path.display()), e))
}

/// Load symlink groups from a YAML mapping file.
///
/// Returned groups carry no detection metadata (the YAML doesn't store it).
/// A document that is not a `canonical -> [aliases]` mapping yields an
/// empty list.
pub fn load_symlink_yaml(path: &Path) -> Result<Vec<SymlinkGroup>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SalvageError::io(format!("Failed to read {}", path.display()), e))?;

    let raw: serde_yaml::Value = serde_yaml::from_str(&text)?;
    let Some(mapping) = raw.as_mapping() else {
        return Ok(Vec::new());
    };

    let mut groups = Vec::new();
    for (key, value) in mapping {
        let (Some(canonical), Some(aliases)) = (key.as_str(), value.as_sequence()) else {
            continue;
        };
        let aliases: Vec<String> = aliases
            .iter()
            .filter_map(|a| a.as_str().map(str::to_string))
            .collect();
        groups.push(SymlinkGroup::new(canonical, aliases));
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_yaml_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("symlinks.yaml");

        let mut group = SymlinkGroup::new("/private/tmp/p", vec!["/tmp/p".to_string()]);
        group
            .detection_methods
            .insert("/tmp/p".to_string(), DETECTED_BY_FS.to_string());
        let empty = SymlinkGroup::new("/elsewhere", Vec::new());

        save_symlink_yaml(&[group, empty], &path).unwrap();
        let loaded = load_symlink_yaml(&path).unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].canonical, "/private/tmp/p");
        assert_eq!(loaded[0].aliases, vec!["/tmp/p"]);
        // Detection metadata is not persisted.
        assert!(loaded[0].detection_methods.is_empty());
    }

    #[test]
    fn test_load_rejects_non_mapping_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "- just\n- a\n- list\n").unwrap();

        assert!(load_symlink_yaml(&path).unwrap().is_empty());
    }
}
