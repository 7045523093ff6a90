//! Configuration for claude-salvage.
//!
//! Small TOML file under the platform config directory covering the knobs
//! that are policy rather than semantics: scan parallelism, the injection
//! threshold, and output-directory naming.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SalvageError};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scanner settings.
    #[serde(default)]
    pub scan: ScanConfig,
    /// Injection-detection settings.
    #[serde(default)]
    pub injection: InjectionConfig,
    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = default_config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SalvageError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;
        toml::from_str(&content).map_err(|e| SalvageError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SalvageError::io(
                    format!("Failed to create config directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| SalvageError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;
        std::fs::write(path, content)
            .map_err(|e| SalvageError::io(format!("Failed to write config file: {}", path.display()), e))
    }
}

/// Scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Worker-pool width for transcript scanning.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// Injection-detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectionConfig {
    /// Fraction of Read-bearing files a trailing block must recur in.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Prefix for generated output directory names
    /// (`<prefix>-<local timestamp>`).
    #[serde(default = "default_dir_prefix")]
    pub dir_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir_prefix: default_dir_prefix(),
        }
    }
}

fn default_workers() -> usize {
    crate::scanner::DEFAULT_WORKERS
}

fn default_threshold() -> f64 {
    crate::injection::DEFAULT_THRESHOLD
}

fn default_dir_prefix() -> String {
    "recovered".to_string()
}

/// Get the default configuration path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| SalvageError::InvalidConfig {
        message: "cannot determine the platform config directory".to_string(),
    })?;
    Ok(config_dir.join("claude-salvage").join("config.toml"))
}
