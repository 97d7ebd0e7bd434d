//! Value Accessor: bounded previews and full reads of stored values

use crate::error::ApiError;
use crate::store::{BucketStore, EntrySource, EntryValue};
use crate::tree::path::{resolve_existing, BucketPath};
use std::io::Write;
use tracing::debug;

/// Leading bytes of a value together with its real length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueHead {
    /// Full length of the value; `None` when the key holds no value.
    pub total_size: Option<usize>,
    pub head: Vec<u8>,
}

impl ValueHead {
    pub fn found(&self) -> bool {
        self.total_size.is_some()
    }
}

fn reject_root(path: &BucketPath) -> Result<(), ApiError> {
    if path.is_root() {
        return Err(ApiError::InvalidOperation(
            "cannot read values at root level, only buckets".to_string(),
        ));
    }
    Ok(())
}

/// Read at most `n` leading bytes of the value at `key` in bucket `path`.
///
/// A missing key, or a key naming a nested bucket, yields an empty head with
/// no total size.
pub fn read_head(
    store: &BucketStore,
    path: &BucketPath,
    key: &[u8],
    n: usize,
) -> Result<ValueHead, ApiError> {
    reject_root(path)?;
    store.view(|tx| {
        let bucket = resolve_existing(tx, path)?;
        let head = match tx.value_head(bucket, key, n)? {
            Some((total, head)) => ValueHead {
                total_size: Some(total),
                head,
            },
            None => ValueHead::default(),
        };
        debug!(
            path = %path,
            total = ?head.total_size,
            returned = head.head.len(),
            "value head read"
        );
        Ok(head)
    })
}

/// Write the full value at `key` to `sink`, returning its length.
pub fn save<W: Write>(
    store: &BucketStore,
    path: &BucketPath,
    key: &[u8],
    sink: &mut W,
) -> Result<usize, ApiError> {
    reject_root(path)?;
    let bytes = store.view(|tx| {
        let bucket = resolve_existing(tx, path)?;
        match tx.get(bucket, key)? {
            Some(EntryValue::Value(bytes)) => Ok(bytes),
            Some(EntryValue::Bucket(_)) | None => Err(ApiError::NotFound(format!(
                "key not found in bucket {}: {}",
                path,
                String::from_utf8_lossy(key)
            ))),
        }
    })?;
    sink.write_all(&bytes)?;
    sink.flush()?;
    debug!(path = %path, bytes = bytes.len(), "value saved");
    Ok(bytes.len())
}
