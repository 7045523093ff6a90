//! Error types for claude-salvage.
//!
//! One structured error enum following the thiserror pattern. Scanner-internal
//! failures (malformed transcript lines, unreadable auxiliary files) are
//! swallowed at the point of occurrence and never surface here; the variants
//! below are the ones callers can actually observe.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for claude-salvage operations.
#[derive(Error, Debug)]
pub enum SalvageError {
    /// Timestamp input matched none of the accepted shapes.
    #[error("Cannot parse timestamp '{input}': {reason}")]
    BadTimestamp {
        /// The rejected input string.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Regex filter pattern failed to compile.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    BadRegex {
        /// The rejected pattern.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// Claude Code data directory not found.
    #[error("Claude Code data directory not found. Expected at: {expected_path}")]
    ClaudeDirectoryNotFound {
        /// Expected path to the data directory.
        expected_path: PathBuf,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// No recoverable file in the index matches the requested path.
    #[error("No recoverable file matches: {path}")]
    RecoverableFileNotFound {
        /// The requested path.
        path: String,
    },

    /// The requested path matches more than one recoverable file.
    #[error("Ambiguous path '{path}' matches {count} recoverable files; use a full path")]
    AmbiguousPath {
        /// The requested path.
        path: String,
        /// How many files matched.
        count: usize,
    },

    /// A recovered file could not be written to the output directory.
    #[error("Failed to write recovered file: {path}")]
    WriteFailed {
        /// Output path that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error with context.
    #[error("I/O error: {context}")]
    IoError {
        /// Operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {context}")]
    SerializationError {
        /// Operation that failed.
        context: String,
        /// Underlying serializer error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid configuration file.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// Invalid command-line argument.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Name of the invalid argument.
        name: String,
        /// Reason why the argument is invalid.
        reason: String,
    },
}

impl SalvageError {
    /// Create a timestamp error.
    #[must_use]
    pub fn bad_timestamp(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadTimestamp {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a regex error.
    #[must_use]
    pub fn bad_regex(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadRegex {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Get the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::BadTimestamp { .. } | Self::BadRegex { .. } | Self::InvalidArgument { .. } => 64,
            Self::ClaudeDirectoryNotFound { .. }
            | Self::FileNotFound { .. }
            | Self::RecoverableFileNotFound { .. }
            | Self::AmbiguousPath { .. } => 3,
            Self::InvalidConfig { .. } => 5,
            Self::WriteFailed { .. } | Self::IoError { .. } => 74,
            Self::SerializationError { .. } => 65,
        }
    }
}

/// Result type alias for claude-salvage operations.
pub type Result<T> = std::result::Result<T, SalvageError>;

impl From<std::io::Error> for SalvageError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SalvageError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            context: "JSON operation failed".to_string(),
            source: Box::new(err),
        }
    }
}

impl From<serde_yaml::Error> for SalvageError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerializationError {
            context: "YAML operation failed".to_string(),
            source: Box::new(err),
        }
    }
}

/// Exit codes for CLI operations.
pub mod exit_codes {
    /// Operation completed successfully.
    pub const EXIT_SUCCESS: i32 = 0;
    /// General/unspecified error.
    pub const EXIT_GENERAL_ERROR: i32 = 1;
    /// Specified file, directory, or session not found.
    pub const EXIT_NOT_FOUND: i32 = 3;
    /// Invalid configuration.
    pub const EXIT_CONFIG_ERROR: i32 = 5;
    /// Invalid command-line usage (BSD standard).
    pub const EXIT_USAGE_ERROR: i32 = 64;
    /// Input data format error (BSD standard).
    pub const EXIT_DATA_ERROR: i32 = 65;
    /// I/O error (BSD standard).
    pub const EXIT_IO_ERROR: i32 = 74;
}
