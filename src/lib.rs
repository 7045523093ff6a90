//! claude-salvage: recover files created and modified by Claude Code from
//! session transcripts.
//!
//! Claude Code persists every session as an append-only JSONL transcript.
//! Each Write, Edit, and Read tool call — and each file-history backup — is
//! recorded there with enough payload to reconstruct the exact content a
//! file held at any point in time. This crate scans those transcripts,
//! builds a per-file operation timeline across sessions, and replays it
//! deterministically.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use claude_salvage::replay::reconstruct_latest;
//! use claude_salvage::scanner::Scanner;
//!
//! let index = Scanner::new("/home/user/.claude").scan();
//! for (path, timeline) in &index {
//!     if let Some(content) = reconstruct_latest(timeline) {
//!         println!("{path}: {} bytes recoverable", content.len());
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`model`]: operation records and per-file timelines
//! - [`scanner`]: transcript discovery, parsing, and aggregation
//! - [`replay`]: deterministic content reconstruction
//! - [`symlinks`]: alias detection and timeline merging
//! - [`injection`]: detection/stripping of client-injected Read suffixes
//! - [`extract`]: time-bounded views and on-disk extraction
//! - [`filter`]: fuzzy/glob/regex path filtering
//! - [`timestamp`]: cutoff normalization and local-time display
//! - [`diff`]: before/after states and unified diffs
//! - [`cli`]: command-line interface
//! - [`config`]: configuration management
//! - [`error`]: error types and exit codes

#![doc(html_root_url = "https://docs.rs/claude-salvage/0.1.0")]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod extract;
pub mod filter;
pub mod injection;
pub mod model;
pub mod replay;
pub mod scanner;
pub mod symlinks;
pub mod timestamp;
pub mod util;

// Re-export commonly used types at the crate root
pub use error::{Result, SalvageError};
pub use model::{FileIndex, FileTimeline, Operation, OperationKind};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Default Claude Code data directory name.
pub const CLAUDE_DIR_NAME: &str = ".claude";

/// Projects subdirectory name.
pub const PROJECTS_DIR_NAME: &str = "projects";

/// File history subdirectory name.
pub const FILE_HISTORY_DIR_NAME: &str = "file-history";

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, SalvageError};
    pub use crate::model::{FileIndex, FileTimeline, Operation, OperationKind};
    pub use crate::replay::{reconstruct_at, reconstruct_at_timestamp, reconstruct_latest};
    pub use crate::scanner::Scanner;
}
