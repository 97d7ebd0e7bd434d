//! CLI route: single route table and run context. Dispatches to the engines and
//! presentation.

use crate::cli::help::{command_name, is_mutation};
use crate::cli::parse::{Commands, GetMode, OutputFormat, WriteOp};
use crate::cli::presentation::{
    format_buckets, format_export, format_head, format_list_page, format_meta, format_save,
    format_search_result, format_write,
};
use crate::config::ScopeConfig;
use crate::error::ApiError;
use crate::export::export;
use crate::listing::{list, list_bucket_names, ListRequest};
use crate::meta::{open_store, inspect};
use crate::mutation;
use crate::search::{search, SearchRequest};
use crate::store::{BucketStore, OpenMode};
use crate::tree::BucketPath;
use crate::value::{read_head, save};
use crate::wire::{decode_base64, JsonLinesSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Runtime context for one CLI invocation: store location, loaded config and
/// output settings.
pub struct RunContext {
    db_path: Option<PathBuf>,
    config: ScopeConfig,
    format: OutputFormat,
    color: bool,
}

impl RunContext {
    pub fn new(db_path: Option<PathBuf>, config: ScopeConfig, format: OutputFormat) -> Self {
        Self {
            db_path,
            config,
            format,
            color: false,
        }
    }

    /// Enable colored text output.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        let result = self.execute_inner(command);
        let elapsed_ms = saturating_millis(started.elapsed());
        match &result {
            Ok(_) => info!(command = %name, elapsed_ms, "command completed"),
            Err(e) => warn!(command = %name, kind = %e.kind(), elapsed_ms, "command failed: {}", e),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Meta => {
                let meta = inspect(self.db_path()?, &self.config.store)?;
                format_meta(&meta, self.format)
            }
            Commands::Lsb { path } => {
                let path = BucketPath::parse(path)?;
                let store = self.open(command)?;
                let names = list_bucket_names(&store, &path)?;
                format_buckets(&names, self.format, self.color)
            }
            Commands::Lsk {
                path,
                prefix,
                limit,
                after_key,
            } => {
                let path = BucketPath::parse(path)?;
                let mut request = ListRequest::new(limit.unwrap_or(self.config.defaults.list_limit))
                    .with_after_key(decode_optional("after-key", after_key.as_deref())?);
                if let Some(prefix) = prefix.as_deref().filter(|p| !p.is_empty()) {
                    request = request.with_prefix(prefix.as_bytes());
                }
                let store = self.open(command)?;
                let page = list(&store, &path, &request)?;
                format_list_page(&page, path.is_root(), self.format, self.color)
            }
            Commands::Get {
                path,
                key,
                mode,
                bytes,
                out,
            } => {
                let path = BucketPath::parse(path)?;
                let key = decode_base64("key", key)?;
                match mode {
                    GetMode::Head => {
                        let n = bytes.unwrap_or(self.config.defaults.head_bytes);
                        let store = self.open(command)?;
                        let head = read_head(&store, &path, &key, n)?;
                        format_head(&head, self.format)
                    }
                    GetMode::Save => {
                        let out = out.as_deref().ok_or_else(|| {
                            ApiError::InvalidArgument("--out is required for save mode".to_string())
                        })?;
                        let store = self.open(command)?;
                        let total = write_to_file(out, |writer| save(&store, &path, &key, writer))?;
                        format_save(total, out, self.format)
                    }
                }
            }
            Commands::Search {
                query,
                limit,
                case_sensitive,
                path,
            } => {
                let request =
                    SearchRequest::new(query.clone(), limit.unwrap_or(self.config.defaults.search_limit))
                        .case_sensitive(*case_sensitive || self.config.defaults.case_sensitive)
                        .within(BucketPath::parse(path)?);
                let store = self.open(command)?;
                let result = search(&store, &request)?;
                format_search_result(&result, self.format, self.color)
            }
            Commands::Export { path, prefix, out } => {
                let path = BucketPath::parse(path)?;
                let prefix = prefix.as_deref().filter(|p| !p.is_empty()).map(str::as_bytes);
                let store = self.open(command)?;
                let summary = write_to_file(out, |writer| {
                    let mut sink = JsonLinesSink::new(writer);
                    export(&store, &path, prefix, &mut sink)
                })?;
                format_export(summary.records(), out, self.format)
            }
            Commands::Write {
                op,
                path: raw_path,
                key,
                value,
            } => {
                let path = BucketPath::parse(raw_path)?;
                let store = self.open(command)?;
                match op {
                    WriteOp::CreateBucket => mutation::create_bucket(&store, &path)?,
                    WriteOp::DeleteBucket => mutation::delete_bucket(&store, &path)?,
                    WriteOp::Put => {
                        let key = require_base64("key", key.as_deref())?;
                        let value = require_base64("value", value.as_deref())?;
                        mutation::put(&store, &path, &key, &value)?
                    }
                    WriteOp::DeleteKey => {
                        let key = require_base64("key", key.as_deref())?;
                        mutation::delete_key(&store, &path, &key)?
                    }
                }
                format_write(*op, &path.to_string(), self.format)
            }
        }
    }

    fn db_path(&self) -> Result<&Path, ApiError> {
        self.db_path
            .as_deref()
            .ok_or_else(|| ApiError::InvalidArgument("--db is required".to_string()))
    }

    /// Open the store for one command: read-write for mutations only.
    fn open(&self, command: &Commands) -> Result<BucketStore, ApiError> {
        let mode = if is_mutation(command) {
            OpenMode::ReadWrite
        } else {
            OpenMode::ReadOnly
        };
        open_store(self.db_path()?, mode, &self.config.store)
    }
}

fn decode_optional(field: &str, value: Option<&str>) -> Result<Option<Vec<u8>>, ApiError> {
    match value {
        Some(v) if !v.is_empty() => decode_base64(field, v).map(Some),
        _ => Ok(None),
    }
}

fn require_base64(field: &str, value: Option<&str>) -> Result<Vec<u8>, ApiError> {
    let value = value.ok_or_else(|| ApiError::InvalidArgument(format!("--{} is required", field)))?;
    decode_base64(field, value)
}

/// Stream into `path`, removing the partial file if `f` fails.
fn write_to_file<T, F>(path: &Path, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<T, ApiError>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    match f(&mut writer).and_then(|out| {
        writer.flush()?;
        Ok(out)
    }) {
        Ok(out) => Ok(out),
        Err(e) => {
            drop(writer);
            if let Err(remove_err) = std::fs::remove_file(path) {
                debug!(path = %path.display(), "could not remove partial output: {}", remove_err);
            }
            Err(e)
        }
    }
}

/// Whole milliseconds in `elapsed`, clamped to `u64::MAX`.
fn saturating_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
