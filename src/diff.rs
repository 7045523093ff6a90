//! Before/after states and unified diffs for timeline inspection.

use similar::TextDiff;

use crate::model::{Operation, OperationKind};
use crate::replay::reconstruct_at;

/// Compute the before and after states for the operation at `index`.
///
/// `after` is the reconstruction through `index`. `before` is the Edit's
/// `original_file` when one was recorded (the authoritative pre-edit state),
/// otherwise the reconstruction through `index - 1`; the first operation
/// diffs against empty. Either side may be `None` when no content exists.
#[must_use]
pub fn compute_before_after(
    operations: &[Operation],
    index: usize,
) -> (Option<String>, Option<String>) {
    let after = reconstruct_at(operations, index);
    if after.is_none() {
        return (None, None);
    }
    if index == 0 {
        return (Some(String::new()), after);
    }

    let op = &operations[index];
    let before = if op.kind == OperationKind::Edit && op.original_file.is_some() {
        op.original_file.clone()
    } else {
        reconstruct_at(operations, index - 1)
    };

    (Some(before.unwrap_or_default()), after)
}

/// Render a unified diff between two versions of a file.
#[must_use]
pub fn unified_diff(before: &str, after: &str, path: &str) -> String {
    if before == after {
        return "[no changes]".to_string();
    }
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(3)
        .header(path, path)
        .to_string()
}
