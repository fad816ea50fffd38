//! Global context for Stevedore operations.
//!
//! Provides centralized access to configuration and the on-disk layout of
//! the transform output area. The home directory resolves in order:
//! `STEVEDORE_HOME`, the platform cache directory, then `~/.stevedore`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use directories::{ProjectDirs, UserDirs};

use crate::util::config::Config;

/// Environment variable overriding the stevedore home directory.
pub const HOME_ENV: &str = "STEVEDORE_HOME";

/// Project directories for Stevedore
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "stevedore", "stevedore"));

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Home directory for global Stevedore data
    home: PathBuf,

    /// Loaded configuration
    config: Config,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let home = if let Some(home) = std::env::var_os(HOME_ENV) {
            PathBuf::from(home)
        } else if let Some(dirs) = PROJECT_DIRS.as_ref() {
            dirs.cache_dir().to_path_buf()
        } else {
            // Fallback to ~/.stevedore
            UserDirs::new()
                .map(|u| u.home_dir().join(".stevedore"))
                .unwrap_or_else(|| PathBuf::from(".stevedore"))
        };

        Ok(Self::with_home(home))
    }

    /// Create a GlobalContext rooted at a specific home directory.
    pub fn with_home(home: PathBuf) -> Self {
        let config = Config::load_or_default(&home.join("config.toml"));
        GlobalContext { home, config }
    }

    /// Get the Stevedore home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Get the transform output root: where extracted header archives live.
    ///
    /// Honors the `[transforms] output_root` config override, otherwise
    /// `<home>/transforms`.
    pub fn transform_root(&self) -> PathBuf {
        self.config
            .transforms
            .output_root
            .clone()
            .unwrap_or_else(|| self.home.join("transforms"))
    }
}
