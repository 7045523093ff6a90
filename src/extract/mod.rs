//! Time-bounded views and on-disk extraction of recovered files.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{Result, SalvageError};
use crate::model::{FileIndex, FileTimeline};
use crate::replay::{reconstruct_at_timestamp, reconstruct_latest};

/// Trim every timeline to operations at or before the cutoff.
///
/// Files left with no qualifying operations are dropped. An empty cutoff is
/// the identity.
#[must_use]
pub fn filter_by_timestamp(files: &FileIndex, cutoff: &str) -> FileIndex {
    if cutoff.is_empty() {
        return files.clone();
    }

    files
        .iter()
        .filter_map(|(path, timeline)| {
            let trimmed: Vec<_> = timeline
                .operations
                .iter()
                .filter(|op| op.timestamp.as_str() <= cutoff)
                .cloned()
                .collect();
            if trimmed.is_empty() {
                return None;
            }
            Some((
                path.clone(),
                FileTimeline {
                    path: path.clone(),
                    operations: trimmed,
                },
            ))
        })
        .collect()
}

/// Outcome counts of an extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Files written to the output directory.
    pub written: usize,
    /// Files skipped because no content could be reconstructed.
    pub skipped: usize,
    /// Files whose write failed.
    pub failed: usize,
}

/// Writes reconstructed files under an output directory, mirroring their
/// absolute paths with the leading `/` stripped.
#[derive(Debug, Clone)]
pub struct Extractor {
    output_dir: PathBuf,
    cutoff: Option<String>,
}

impl Extractor {
    /// Create an extractor targeting `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            cutoff: None,
        }
    }

    /// Reconstruct "at cutoff" instead of "latest". The cutoff must already
    /// be a normalized UTC timestamp string.
    #[must_use]
    pub fn with_cutoff(mut self, cutoff: impl Into<String>) -> Self {
        self.cutoff = Some(cutoff.into());
        self
    }

    /// The output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where a recovered absolute path lands on disk.
    #[must_use]
    pub fn output_path_for(&self, path: &str) -> PathBuf {
        self.output_dir.join(path.trim_start_matches('/'))
    }

    /// Reconstruct and write every file in the index.
    ///
    /// Single-file failures are counted and logged, never propagated — one
    /// unwritable path must not abort the rest of the recovery.
    pub fn extract_all(
        &self,
        files: &FileIndex,
        mut progress: Option<&mut (dyn FnMut(usize, usize) + Send)>,
    ) -> ExtractReport {
        let total = files.len();
        let mut report = ExtractReport::default();

        for (done, (path, timeline)) in files.iter().enumerate() {
            let content = match &self.cutoff {
                Some(cutoff) => reconstruct_at_timestamp(timeline, cutoff),
                None => reconstruct_latest(timeline),
            };

            match content {
                None => report.skipped += 1,
                Some(text) => match self.write_recovered(path, &text) {
                    Ok(()) => report.written += 1,
                    Err(e) => {
                        warn!("{e}");
                        report.failed += 1;
                    }
                },
            }

            if let Some(cb) = progress.as_deref_mut() {
                cb(done + 1, total);
            }
        }

        report
    }

    /// Reconstructed text goes through a staged temp file in the target
    /// directory and is renamed into place, so an interrupted run never
    /// leaves a half-written recovery on disk.
    fn write_recovered(&self, path: &str, text: &str) -> Result<()> {
        let out_path = self.output_path_for(path);
        stage_and_rename(&out_path, text).map_err(|source| SalvageError::WriteFailed {
            path: out_path,
            source,
        })
    }
}

fn stage_and_rename(out_path: &Path, text: &str) -> io::Result<()> {
    let parent = out_path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "output path has no parent"))?;
    std::fs::create_dir_all(parent)?;

    // Staged in the same directory so the rename cannot cross filesystems.
    let mut staged = NamedTempFile::new_in(parent)?;
    staged.write_all(text.as_bytes())?;
    staged.flush()?;
    staged.persist(out_path).map_err(|e| e.error)?;
    Ok(())
}
