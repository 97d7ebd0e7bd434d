//! Listing Engine
//!
//! Paginated enumeration of one bucket's entries, or of the root's top-level
//! buckets. Pagination is key based: each page reports the last key it
//! returned, and the next call resumes strictly after it in a fresh snapshot.
//! Pages are only guaranteed to chain cleanly when no mutation interleaves.

use crate::error::{ApiError, StorageError};
use crate::store::{BucketId, BucketStore, Entry, EntryKind, EntrySource};
use crate::tree::path::{resolve_existing, BucketPath};
use tracing::debug;

/// Parameters of one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Keep only keys starting with these bytes.
    pub prefix: Option<Vec<u8>>,
    /// Resume strictly after this key.
    pub after_key: Option<Vec<u8>>,
    /// Maximum number of items in the page; must be positive.
    pub limit: usize,
}

impl ListRequest {
    pub fn new(limit: usize) -> Self {
        Self {
            prefix: None,
            after_key: None,
            limit,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_after_key(mut self, after_key: Option<Vec<u8>>) -> Self {
        self.after_key = after_key;
        self
    }

    fn validate(&self) -> Result<(), ApiError> {
        if self.limit == 0 {
            return Err(ApiError::InvalidArgument(
                "limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// One listed entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub key: Vec<u8>,
    /// Value length in bytes; for a root listing, the bucket's entry count.
    pub value_size: usize,
    pub is_bucket: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListPage {
    pub items: Vec<ListItem>,
    /// Last returned key, present only when more matching entries follow.
    pub next_after_key: Option<Vec<u8>>,
}

/// List the bucket at `path`, dispatching on root versus nested.
pub fn list(
    store: &BucketStore,
    path: &BucketPath,
    request: &ListRequest,
) -> Result<ListPage, ApiError> {
    match path {
        BucketPath::Root => list_root(store, request),
        BucketPath::Nested(_) => list_bucket(store, path, request),
    }
}

/// List top-level buckets with their entry counts.
///
/// Counting enumerates each returned bucket in full, so the cost of a page
/// grows with the size of the buckets on it.
pub fn list_root(store: &BucketStore, request: &ListRequest) -> Result<ListPage, ApiError> {
    request.validate()?;
    let page = store.view(|tx| {
        let raw = collect_page(tx, BucketId::ROOT, request, |entry| entry.kind.is_bucket())?;
        let mut items = Vec::with_capacity(raw.entries.len());
        for entry in raw.entries {
            let size = match entry.kind {
                EntryKind::Bucket(id) => tx.count_entries(id)?,
                EntryKind::Value { .. } => continue,
            };
            items.push(ListItem {
                key: entry.key,
                value_size: size,
                is_bucket: true,
            });
        }
        Ok::<_, StorageError>(ListPage {
            items,
            next_after_key: raw.next_after_key,
        })
    })?;
    debug!(
        returned = page.items.len(),
        more = page.next_after_key.is_some(),
        "listed root buckets"
    );
    Ok(page)
}

/// List the entries of a nested bucket.
pub fn list_bucket(
    store: &BucketStore,
    path: &BucketPath,
    request: &ListRequest,
) -> Result<ListPage, ApiError> {
    request.validate()?;
    let page = store.view(|tx| {
        let bucket = resolve_existing(tx, path)?;
        let raw = collect_page(tx, bucket, request, |_| true)?;
        let items = raw
            .entries
            .into_iter()
            .map(|entry| ListItem {
                value_size: entry.kind.value_len(),
                is_bucket: entry.kind.is_bucket(),
                key: entry.key,
            })
            .collect();
        Ok::<_, ApiError>(ListPage {
            items,
            next_after_key: raw.next_after_key,
        })
    })?;
    debug!(
        path = %path,
        returned = page.items.len(),
        more = page.next_after_key.is_some(),
        "listed bucket"
    );
    Ok(page)
}

/// Names of the buckets directly under `path` (values are skipped).
pub fn list_bucket_names(store: &BucketStore, path: &BucketPath) -> Result<Vec<Vec<u8>>, ApiError> {
    store.view(|tx| {
        let bucket = resolve_existing(tx, path)?;
        let mut names = Vec::new();
        let mut cursor = tx.cursor(bucket);
        let mut entry = cursor.first()?;
        while let Some(e) = entry {
            if e.kind.is_bucket() {
                names.push(e.key);
            }
            entry = cursor.next()?;
        }
        Ok(names)
    })
}

struct RawPage {
    entries: Vec<Entry>,
    next_after_key: Option<Vec<u8>>,
}

/// Collect up to `request.limit` entries accepted by `keep`, honouring the
/// prefix and resumption key.
fn collect_page<S, F>(
    source: &S,
    bucket: BucketId,
    request: &ListRequest,
    keep: F,
) -> Result<RawPage, StorageError>
where
    S: EntrySource,
    F: Fn(&Entry) -> bool,
{
    let prefix = request.prefix.as_deref().unwrap_or(&[]);
    let mut cursor = source.cursor(bucket);

    // Prefix matches are contiguous, so start at whichever of the prefix and
    // the resumption key sorts later.
    let mut entry = match request.after_key.as_deref() {
        Some(after) if after >= prefix => match cursor.seek(after)? {
            Some(landed) if landed.key == after => cursor.next()?,
            other => other,
        },
        _ if !prefix.is_empty() => cursor.seek(prefix)?,
        _ => cursor.first()?,
    };

    let mut entries: Vec<Entry> = Vec::new();
    while let Some(current) = entry {
        if !current.key.starts_with(prefix) {
            break;
        }
        if keep(&current) {
            if entries.len() >= request.limit {
                let next_after_key = entries.last().map(|last| last.key.clone());
                return Ok(RawPage {
                    entries,
                    next_after_key,
                });
            }
            entries.push(current);
        }
        entry = cursor.next()?;
    }
    Ok(RawPage {
        entries,
        next_after_key: None,
    })
}
