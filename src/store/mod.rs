//! Bucket Store
//!
//! Nested buckets over the embedded engine. Provides read and write
//! transactions, per-bucket cursors, and the structural bucket operations
//! (create, delete, put, delete key) the higher layers compose.

pub mod cursor;
pub mod encoding;
pub mod persistence;

pub use cursor::Cursor;
pub use encoding::{BucketId, Entry, EntryKind, EntryValue};
pub use persistence::{BucketStore, OpenMode, ReadTx, WriteTx, DEFAULT_LOCK_TIMEOUT};

use crate::error::StorageError;
use std::ops::Bound;

/// Default number of entries a cursor pulls from the engine at a time.
pub const DEFAULT_SCAN_BATCH: usize = 256;

/// Read access to bucket entries within one transaction.
pub trait EntrySource {
    /// Up to `limit` entries of `bucket` in key order, starting at `from`.
    /// Values are reported by length only.
    fn scan(
        &self,
        bucket: BucketId,
        from: Bound<&[u8]>,
        limit: usize,
    ) -> Result<Vec<Entry>, StorageError>;

    /// The entry at `key`, with the full value copied out.
    fn get(&self, bucket: BucketId, key: &[u8]) -> Result<Option<EntryValue>, StorageError>;

    fn kind(&self, bucket: BucketId, key: &[u8]) -> Result<Option<EntryKind>, StorageError> {
        Ok(self.get(bucket, key)?.map(|v| v.kind()))
    }

    /// Total length and at most `n` leading bytes of the value at `key`.
    /// Keys holding a nested bucket yield `None`.
    fn value_head(
        &self,
        bucket: BucketId,
        key: &[u8],
        n: usize,
    ) -> Result<Option<(usize, Vec<u8>)>, StorageError> {
        match self.get(bucket, key)? {
            Some(EntryValue::Value(mut bytes)) => {
                let total = bytes.len();
                bytes.truncate(n);
                Ok(Some((total, bytes)))
            }
            Some(EntryValue::Bucket(_)) | None => Ok(None),
        }
    }

    fn batch_size(&self) -> usize {
        DEFAULT_SCAN_BATCH
    }

    /// Nested bucket `name` of `parent`, if present. Values resolve to `None`.
    fn bucket(&self, parent: BucketId, name: &[u8]) -> Result<Option<BucketId>, StorageError> {
        Ok(self.kind(parent, name)?.and_then(|k| k.as_bucket()))
    }

    fn cursor(&self, bucket: BucketId) -> Cursor<'_, Self>
    where
        Self: Sized,
    {
        Cursor::new(self, bucket)
    }

    /// Number of entries in `bucket`, counted by full enumeration.
    fn count_entries(&self, bucket: BucketId) -> Result<usize, StorageError>
    where
        Self: Sized,
    {
        let mut cursor = self.cursor(bucket);
        let mut count = 0;
        let mut entry = cursor.first()?;
        while entry.is_some() {
            count += 1;
            entry = cursor.next()?;
        }
        Ok(count)
    }
}
