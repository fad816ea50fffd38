//! Configuration file support for Stevedore.
//!
//! A single optional file, `<stevedore home>/config.toml`, with settings
//! for the transform output area. Missing file means defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Stevedore configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transform output settings
    pub transforms: TransformConfig,
}

/// Settings for the transform output area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Override for the directory extracted header archives are placed
    /// under. Defaults to `<stevedore home>/transforms`.
    pub output_root: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Config::default()
            })
        } else {
            Config::default()
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).context("failed to serialize config")?;

        if let Some(parent) = path.parent() {
            crate::util::fs::ensure_dir(parent)?;
        }

        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config: {}", path.display()))
    }
}
