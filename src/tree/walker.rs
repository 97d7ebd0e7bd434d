//! Pre-order walker over a bucket subtree

use crate::error::StorageError;
use crate::store::{BucketId, Cursor, Entry, EntryKind, EntrySource};

/// What the walker does after a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Keep going, descending into the entry if it is a bucket.
    Continue,
    /// Keep going without descending into this entry.
    SkipChildren,
    /// Stop the walk immediately.
    Stop,
}

struct Frame<'s, S: EntrySource> {
    path: Vec<Vec<u8>>,
    cursor: Cursor<'s, S>,
    positioned: bool,
}

/// Walks every entry below a starting bucket in strict pre-order: a bucket
/// entry is visited before any of its children.
pub struct Walker<'s, S: EntrySource> {
    source: &'s S,
    start: BucketId,
    start_path: Vec<Vec<u8>>,
    prefix: Option<Vec<u8>>,
}

impl<'s, S: EntrySource> Walker<'s, S> {
    /// Create a walker rooted at `start`, whose entries report `start_path`.
    pub fn new(source: &'s S, start: BucketId, start_path: Vec<Vec<u8>>) -> Self {
        Self {
            source,
            start,
            start_path,
            prefix: None,
        }
    }

    /// Restrict the starting bucket's direct entries to keys with `prefix`.
    /// Buckets matched this way are still walked in full.
    pub fn with_prefix(mut self, prefix: Option<Vec<u8>>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    /// Visit entries until the tree is exhausted or `visit` returns `Stop`.
    ///
    /// `visit` receives the path and handle of the bucket holding the entry.
    pub fn walk<E, F>(self, mut visit: F) -> Result<(), E>
    where
        E: From<StorageError>,
        F: FnMut(&[Vec<u8>], BucketId, &Entry) -> Result<WalkControl, E>,
    {
        let mut stack = vec![Frame {
            path: self.start_path,
            cursor: Cursor::new(self.source, self.start),
            positioned: false,
        }];

        loop {
            let is_top = stack.len() == 1;
            let frame = match stack.last_mut() {
                Some(frame) => frame,
                None => break,
            };
            let next = if frame.positioned {
                frame.cursor.next()?
            } else {
                frame.positioned = true;
                match (&self.prefix, is_top) {
                    (Some(prefix), true) => frame.cursor.seek(prefix)?,
                    _ => frame.cursor.first()?,
                }
            };

            let entry = match next {
                Some(entry) => entry,
                None => {
                    stack.pop();
                    continue;
                }
            };

            if is_top {
                if let Some(prefix) = &self.prefix {
                    if !entry.key.starts_with(prefix) {
                        stack.pop();
                        continue;
                    }
                }
            }

            match visit(&frame.path, frame.cursor.bucket(), &entry)? {
                WalkControl::Stop => return Ok(()),
                WalkControl::SkipChildren => continue,
                WalkControl::Continue => {}
            }

            if let EntryKind::Bucket(child) = entry.kind {
                let mut path = frame.path.clone();
                path.push(entry.key);
                stack.push(Frame {
                    path,
                    cursor: Cursor::new(self.source, child),
                    positioned: false,
                });
            }
        }
        Ok(())
    }
}
