//! Export Engine
//!
//! Streams a whole subtree to a sink, one record per entry, in pre-order.
//! Export is always fully recursive, from the root or from any bucket. The
//! optional prefix narrows only the starting bucket's direct entries.

use crate::error::ApiError;
use crate::error::StorageError;
use crate::store::{BucketStore, Entry, EntryKind, EntrySource, EntryValue};
use crate::tree::path::{resolve_existing, BucketPath};
use crate::tree::walker::{WalkControl, Walker};
use tracing::debug;

/// One exported entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRecord<'a> {
    /// Buckets from the root to the entry's parent.
    pub path: &'a [Vec<u8>],
    pub key: &'a [u8],
    /// The value bytes; `None` when the entry is a nested bucket.
    pub value: Option<&'a [u8]>,
}

/// Destination for exported records. Each record is handed over before the
/// next entry is read.
pub trait ExportSink {
    fn write_record(&mut self, record: &ExportRecord<'_>) -> Result<(), ApiError>;

    fn finish(&mut self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportSummary {
    pub values: usize,
    pub buckets: usize,
}

impl ExportSummary {
    pub fn records(&self) -> usize {
        self.values + self.buckets
    }
}

pub fn export<K: ExportSink + ?Sized>(
    store: &BucketStore,
    path: &BucketPath,
    prefix: Option<&[u8]>,
    sink: &mut K,
) -> Result<ExportSummary, ApiError> {
    let mut summary = ExportSummary::default();
    store.view(|tx| -> Result<(), ApiError> {
        let start = resolve_existing(tx, path)?;
        Walker::new(tx, start, path.segments().to_vec())
            .with_prefix(prefix.map(<[u8]>::to_vec))
            .walk(|parent, bucket, entry: &Entry| -> Result<WalkControl, ApiError> {
                // Scans carry lengths only; values are loaded one at a time.
                let bytes = match entry.kind {
                    EntryKind::Value { .. } => match tx.get(bucket, &entry.key)? {
                        Some(EntryValue::Value(bytes)) => Some(bytes),
                        _ => {
                            return Err(StorageError::Corrupt(format!(
                                "value vanished during export: {}",
                                String::from_utf8_lossy(&entry.key)
                            ))
                            .into())
                        }
                    },
                    EntryKind::Bucket(_) => None,
                };
                match bytes {
                    Some(_) => summary.values += 1,
                    None => summary.buckets += 1,
                }
                sink.write_record(&ExportRecord {
                    path: parent,
                    key: &entry.key,
                    value: bytes.as_deref(),
                })?;
                Ok(WalkControl::Continue)
            })
    })?;
    sink.finish()?;
    debug!(
        path = %path,
        values = summary.values,
        buckets = summary.buckets,
        "export finished"
    );
    Ok(summary)
}
