//! Shared utilities: lexical path normalization.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: collapse `.` and `..` components without
/// touching the filesystem.
///
/// Used to resolve relative file-history paths against a session's working
/// directory and to normalize symlink targets.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut prefix = PathBuf::new();
    let mut absolute = false;
    let mut parts: Vec<std::ffi::OsString> = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => prefix.push(p.as_os_str()),
            Component::RootDir => absolute = true,
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.last().is_some_and(|p| p != "..") {
                    parts.pop();
                } else if !absolute {
                    // Leading ".." in a relative path is preserved; at the
                    // root it collapses away.
                    parts.push("..".into());
                }
            }
            Component::Normal(p) => parts.push(p.to_os_string()),
        }
    }

    let mut out = prefix;
    if absolute {
        out.push(Component::RootDir.as_os_str());
    }
    for part in parts {
        out.push(part);
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
