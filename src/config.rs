//! Host configuration loaded from `config.toml`.
//!
//! Every table is optional; missing keys fall back to defaults, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! [search]
//! sources = ["stackoverflow", "github"]
//! max_results = 8
//!
//! [search.rate_limits.github]
//! min_interval_ms = 2000
//!
//! [logging]
//! level = "debug"
//! ```

use std::path::{Path, PathBuf};

use devctx_search::GatherConfig;
use serde::{Deserialize, Serialize};

use crate::error::{HostError, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "DEVCTX_CONFIG";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Gather pipeline settings.
    pub search: GatherConfig,
    /// Diagnostic output settings.
    pub logging: LoggingConfig,
}

/// Diagnostic output settings. Logs always go to stderr.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,
    /// Colourise output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            ansi: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| HostError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HostError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/devctx/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("devctx").join("config.toml")
        } else if let Some(dir) = dirs::config_dir() {
            dir.join("devctx").join("config.toml")
        } else {
            PathBuf::from("/tmp/devctx-config/config.toml")
        }
    }

    /// Load the effective configuration.
    ///
    /// `DEVCTX_CONFIG` names a file that must exist. Otherwise the default
    /// path is read when present, and built-in defaults are used when not.
    /// The result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::load_from(explicit.as_deref(), &Self::default_config_path())
    }

    /// [`AppConfig::load`] with the paths supplied by the caller.
    pub fn load_from(explicit: Option<&Path>, default_path: &Path) -> Result<Self> {
        let config = match explicit {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config from {CONFIG_ENV_VAR}");
                Self::from_file(path)?
            }
            None if default_path.exists() => {
                tracing::debug!(path = %default_path.display(), "loading config");
                Self::from_file(default_path)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.logging.validate()
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        let level = self.level.trim().to_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            Ok(())
        } else {
            Err(HostError::Config(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )))
        }
    }
}
