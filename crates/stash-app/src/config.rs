//! Client core configuration
//!
//! Loaded from TOML; a missing file means defaults. `STASH_*` environment
//! variables override individual fields after loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "STASH_";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File exists but could not be read or written
    #[error("Failed to access config file {path}: {reason}")]
    Io {
        /// File path
        path: PathBuf,
        /// OS error
        reason: String,
    },

    /// File is not valid TOML for [`AppConfig`]
    #[error("Failed to parse config file {path}: {reason}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Environment override has the wrong type
    #[error("Invalid value for {var}: {value:?}")]
    InvalidOverride {
        /// Variable name
        var: String,
        /// Offending value
        value: String,
    },

    /// A field is out of range
    #[error("Invalid config field {field}: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// What is wrong
        reason: &'static str,
    },
}

/// Client core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Namespace for every persisted key (`<prefix>:attribution`, ...)
    pub storage_prefix: String,

    /// Days a first touch stays attributable
    pub attribution_window_days: u64,

    /// Hours a detected country stays cached
    pub country_cache_ttl_hours: u64,

    /// Direct deposit status polling interval
    pub direct_deposit_poll_interval_ms: u64,

    /// Default lifetime of non-error toasts
    pub toast_duration_ms: u64,

    /// Directory for filesystem storage; memory storage when unset
    pub storage_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_prefix: "stash".to_string(),
            attribution_window_days: crate::attribution::DEFAULT_WINDOW_DAYS,
            country_cache_ttl_hours: crate::country::DEFAULT_TTL_HOURS,
            direct_deposit_poll_interval_ms: 5_000,
            toast_duration_ms: 3_000,
            storage_dir: None,
        }
    }
}

impl AppConfig {
    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write as pretty TOML, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |e: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, raw).map_err(io_err)
    }

    /// Apply `STASH_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(std::env::vars())
    }

    /// Apply `STASH_*` overrides from `vars`. Unknown variables are ignored.
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        fn number(var: &str, value: &str) -> Result<u64, ConfigError> {
            value.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                var: var.to_string(),
                value: value.to_string(),
            })
        }

        for (var, value) in vars {
            let Some(name) = var.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "STORAGE_PREFIX" => self.storage_prefix = value.trim().to_string(),
                "ATTRIBUTION_WINDOW_DAYS" => self.attribution_window_days = number(&var, &value)?,
                "COUNTRY_CACHE_TTL_HOURS" => self.country_cache_ttl_hours = number(&var, &value)?,
                "DIRECT_DEPOSIT_POLL_INTERVAL_MS" => {
                    self.direct_deposit_poll_interval_ms = number(&var, &value)?
                }
                "TOAST_DURATION_MS" => self.toast_duration_ms = number(&var, &value)?,
                "STORAGE_DIR" => {
                    self.storage_dir = Some(value.trim())
                        .filter(|v| !v.is_empty())
                        .map(PathBuf::from)
                }
                _ => continue,
            }
            tracing::debug!(%var, "config override applied");
        }
        Ok(())
    }

    /// Reject values the core cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = self.storage_prefix.as_str();
        if prefix.is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage_prefix",
                reason: "must not be empty",
            });
        }
        if prefix.contains(':') || prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "storage_prefix",
                reason: "must not contain ':' or whitespace",
            });
        }
        let positive = [
            ("attribution_window_days", self.attribution_window_days),
            ("country_cache_ttl_hours", self.country_cache_ttl_hours),
            ("direct_deposit_poll_interval_ms", self.direct_deposit_poll_interval_ms),
            ("toast_duration_ms", self.toast_duration_ms),
        ];
        if let Some(&(field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid {
                field,
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}
