//! Merge rules: defaults first, then file, then environment.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("defaults.list_limit", 1000_i64)?
        .set_default("defaults.search_limit", 100_i64)?
        .set_default("defaults.head_bytes", 65536_i64)?
        .set_default("defaults.case_sensitive", false)?
        .set_default("store.scan_batch", 256_i64)?
        .set_default("store.lock_timeout_ms", 5000_i64)
}
