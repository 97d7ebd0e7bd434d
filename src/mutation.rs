//! Mutation Engine
//!
//! Every operation runs in one write transaction: it either commits in full
//! or is rolled back with nothing observable. The root holds only buckets,
//! so value writes and key deletes there are refused.

use crate::error::ApiError;
use crate::store::{BucketId, BucketStore, EntrySource};
use crate::tree::path::{resolve, resolve_existing, BucketPath};
use tracing::{debug, info};

fn resolve_parent<S: EntrySource>(tx: &S, parent: &BucketPath) -> Result<BucketId, ApiError> {
    resolve(tx, parent)?
        .ok_or_else(|| ApiError::NotFound(format!("parent bucket not found: {}", parent)))
}

fn require_bucket_path<'p>(
    path: &'p BucketPath,
    action: &str,
) -> Result<(BucketPath, &'p [u8]), ApiError> {
    path.split_last().ok_or_else(|| {
        ApiError::InvalidOperation(format!("cannot {} at root level: bucket path required", action))
    })
}

fn reject_root(path: &BucketPath, action: &str) -> Result<(), ApiError> {
    if path.is_root() {
        return Err(ApiError::InvalidOperation(format!(
            "cannot {} at root level, only buckets",
            action
        )));
    }
    Ok(())
}

/// Create the bucket named by the last segment of `path` inside its parent.
pub fn create_bucket(store: &BucketStore, path: &BucketPath) -> Result<(), ApiError> {
    let (parent_path, name) = require_bucket_path(path, "create a bucket")?;
    store.update(|tx| {
        let parent = resolve_parent(tx, &parent_path)?;
        tx.create_bucket(parent, name)?;
        Ok::<_, ApiError>(())
    })?;
    info!(path = %path, "bucket created");
    Ok(())
}

/// Insert or overwrite `key` in the bucket at `path`.
pub fn put(store: &BucketStore, path: &BucketPath, key: &[u8], value: &[u8]) -> Result<(), ApiError> {
    reject_root(path, "put key-value")?;
    if key.is_empty() {
        return Err(ApiError::InvalidArgument("key required".to_string()));
    }
    store.update(|tx| {
        let bucket = resolve_existing(tx, path)?;
        tx.put(bucket, key, value)?;
        Ok::<_, ApiError>(())
    })?;
    debug!(path = %path, bytes = value.len(), "value stored");
    Ok(())
}

/// Remove `key` from the bucket at `path`. An absent key is not an error.
pub fn delete_key(store: &BucketStore, path: &BucketPath, key: &[u8]) -> Result<(), ApiError> {
    reject_root(path, "delete key")?;
    let removed = store.update(|tx| {
        let bucket = resolve_existing(tx, path)?;
        Ok::<_, ApiError>(tx.delete(bucket, key)?)
    })?;
    debug!(path = %path, removed, "key deleted");
    Ok(())
}

/// Delete the bucket at `path` and everything below it.
pub fn delete_bucket(store: &BucketStore, path: &BucketPath) -> Result<(), ApiError> {
    let (parent_path, name) = require_bucket_path(path, "delete a bucket")?;
    store.update(|tx| {
        let parent = resolve_parent(tx, &parent_path)?;
        if tx.bucket(parent, name)?.is_none() {
            return Err(ApiError::bucket_not_found(path));
        }
        tx.delete_bucket(parent, name)?;
        Ok::<_, ApiError>(())
    })?;
    info!(path = %path, "bucket deleted");
    Ok(())
}
