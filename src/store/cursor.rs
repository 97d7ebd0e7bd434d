//! Forward cursor over one bucket's entries.
//!
//! Entries are pulled from the transaction in bounded batches; the cursor only
//! remembers the last key it loaded and resumes strictly after it.

use crate::error::StorageError;
use crate::store::encoding::{BucketId, Entry};
use crate::store::EntrySource;
use std::collections::VecDeque;
use std::ops::Bound;

pub struct Cursor<'s, S: EntrySource + ?Sized> {
    source: &'s S,
    bucket: BucketId,
    pending: VecDeque<Entry>,
    loaded_until: Option<Vec<u8>>,
    drained: bool,
}

impl<'s, S: EntrySource + ?Sized> Cursor<'s, S> {
    pub fn new(source: &'s S, bucket: BucketId) -> Self {
        Self {
            source,
            bucket,
            pending: VecDeque::new(),
            loaded_until: None,
            drained: true,
        }
    }

    pub fn bucket(&self) -> BucketId {
        self.bucket
    }

    /// Position on the first entry of the bucket.
    pub fn first(&mut self) -> Result<Option<Entry>, StorageError> {
        self.reload(Bound::Unbounded)?;
        self.advance()
    }

    /// Position on `key`, or on the next key in order if `key` is absent.
    pub fn seek(&mut self, key: &[u8]) -> Result<Option<Entry>, StorageError> {
        self.reload(Bound::Included(key))?;
        self.advance()
    }

    /// Step to the entry after the current one.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<Entry>, StorageError> {
        self.advance()
    }

    fn reload(&mut self, from: Bound<&[u8]>) -> Result<(), StorageError> {
        self.pending.clear();
        self.loaded_until = None;
        self.drained = false;
        self.fill(from)
    }

    fn fill(&mut self, from: Bound<&[u8]>) -> Result<(), StorageError> {
        let limit = self.source.batch_size().max(1);
        let batch = self.source.scan(self.bucket, from, limit)?;
        if batch.len() < limit {
            self.drained = true;
        }
        if let Some(last) = batch.last() {
            self.loaded_until = Some(last.key.clone());
        }
        self.pending.extend(batch);
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<Entry>, StorageError> {
        if self.pending.is_empty() && !self.drained {
            match self.loaded_until.take() {
                Some(last) => self.fill(Bound::Excluded(last.as_slice()))?,
                None => self.drained = true,
            }
        }
        Ok(self.pending.pop_front())
    }
}
