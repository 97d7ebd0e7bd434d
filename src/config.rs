//! Configuration System
//!
//! Layered configuration: built-in defaults, then the global config file (or
//! a file named with `--config`), then `BUCKETSCOPE__*` environment
//! variables. The result is validated before use.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::store::{DEFAULT_LOCK_TIMEOUT, DEFAULT_SCAN_BATCH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod merge;
mod sources;

pub use sources::environment::{ENV_PREFIX, ENV_SEPARATOR};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Defaults for command options not given on the command line
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Storage engine tuning
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Page size for `lsk`
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,

    /// Match limit for `search`
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Preview length for `get --mode head`
    #[serde(default = "default_head_bytes")]
    pub head_bytes: usize,

    #[serde(default)]
    pub case_sensitive: bool,
}

fn default_list_limit() -> usize {
    1000
}

fn default_search_limit() -> usize {
    100
}

fn default_head_bytes() -> usize {
    65536
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
            search_limit: default_search_limit(),
            head_bytes: default_head_bytes(),
            case_sensitive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Entries fetched per cursor refill
    #[serde(default = "default_scan_batch")]
    pub scan_batch: usize,

    /// How long to wait for another process to release the store file;
    /// 0 fails at once
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_scan_batch() -> usize {
    DEFAULT_SCAN_BATCH
}

fn default_lock_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_LOCK_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scan_batch: default_scan_batch(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl ScopeConfig {
    /// Validate the entire configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.defaults.list_limit == 0 {
            errors.push("defaults.list_limit must be greater than zero".to_string());
        }
        if self.defaults.search_limit == 0 {
            errors.push("defaults.search_limit must be greater than zero".to_string());
        }
        if self.store.scan_batch == 0 {
            errors.push("store.scan_batch must be greater than zero".to_string());
        }
        if let Err(e) = self.logging.validate() {
            errors.push(format!("logging: {}", e));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Builds a [`ScopeConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, environment.
    pub fn load() -> Result<ScopeConfig, ApiError> {
        Self::load_with(None)
    }

    /// Defaults, `path`, environment. A missing file is an error.
    pub fn load_from_file(path: &Path) -> Result<ScopeConfig, ApiError> {
        Self::load_with(Some(path))
    }

    /// Load from the explicit file when given, otherwise the global file.
    pub fn load_with(explicit: Option<&Path>) -> Result<ScopeConfig, ApiError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        builder = match explicit {
            Some(path) => sources::explicit_file::add_to_builder(builder, path)?,
            None => sources::global_file::add_to_builder(builder)?,
        };
        builder = sources::environment::add_to_builder(builder)?;

        let config: ScopeConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            ))
        })?;
        Ok(config)
    }

    /// Location of the global config file.
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }
}
