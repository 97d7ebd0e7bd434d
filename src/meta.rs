//! Store file inspection and the shared open path used by every command.

use crate::config::StoreConfig;
use crate::error::ApiError;
use crate::store::{BucketStore, OpenMode};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-level facts about a store that opened cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreMeta {
    pub path: PathBuf,
    pub size: u64,
    /// Last modification time, when the platform reports one.
    pub modified: Option<DateTime<Utc>>,
}

/// Open the store at `path`. A read-only open of a missing file is NotFound
/// rather than an engine error.
pub fn open_store(path: &Path, mode: OpenMode, settings: &StoreConfig) -> Result<BucketStore, ApiError> {
    if mode == OpenMode::ReadOnly && !path.exists() {
        return Err(ApiError::NotFound(format!(
            "store file not found: {}",
            path.display()
        )));
    }
    Ok(BucketStore::open_with_timeout(path, mode, settings.lock_timeout())?
        .with_scan_batch(settings.scan_batch))
}

/// Check that `path` is a readable store and report its size and mtime.
pub fn inspect(path: &Path, settings: &StoreConfig) -> Result<StoreMeta, ApiError> {
    let store = open_store(path, OpenMode::ReadOnly, settings)?;
    store.begin_read()?;
    drop(store);

    let metadata = std::fs::metadata(path)?;
    let meta = StoreMeta {
        path: path.to_path_buf(),
        size: metadata.len(),
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
    };
    debug!(path = %path.display(), size = meta.size, "store inspected");
    Ok(meta)
}
