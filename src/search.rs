//! Search Engine
//!
//! Bounded substring search over entry names, walking the hierarchy (or one
//! subtree) in pre-order. The walk stops as soon as the match limit is
//! reached. Bucket sizes are not computed here; only values report a length.

use crate::error::ApiError;
use crate::store::{BucketStore, Entry};
use crate::tree::path::{resolve_existing, BucketPath};
use crate::tree::walker::{WalkControl, Walker};
use bstr::ByteSlice;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub case_sensitive: bool,
    /// Subtree to search; the root searches everything.
    pub scope: BucketPath,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, limit: usize) -> Self {
        Self {
            query: query.into(),
            limit,
            case_sensitive: false,
            scope: BucketPath::Root,
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn within(mut self, scope: BucketPath) -> Self {
        self.scope = scope;
        self
    }

    fn validate(&self) -> Result<(), ApiError> {
        if self.query.is_empty() {
            return Err(ApiError::InvalidArgument(
                "search query must not be empty".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(ApiError::InvalidArgument(
                "limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchItem {
    /// Buckets from the root to the item's parent.
    pub path: Vec<Vec<u8>>,
    pub key: Vec<u8>,
    /// Value length; 0 for buckets.
    pub value_size: usize,
    pub is_bucket: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResult {
    pub items: Vec<SearchItem>,
    pub total: usize,
    /// The limit was reached; further matches may exist.
    pub limited: bool,
}

/// Substring test on raw key bytes, optionally case-folded.
struct Matcher {
    needle: Vec<u8>,
    case_sensitive: bool,
}

impl Matcher {
    fn new(query: &str, case_sensitive: bool) -> Self {
        let needle = if case_sensitive {
            query.as_bytes().to_vec()
        } else {
            query.as_bytes().to_lowercase()
        };
        Self {
            needle,
            case_sensitive,
        }
    }

    fn matches(&self, key: &[u8]) -> bool {
        if self.case_sensitive {
            key.contains_str(&self.needle)
        } else {
            key.to_lowercase().contains_str(&self.needle)
        }
    }
}

/// Running state of one search, threaded through the walk.
pub struct SearchContext {
    limit: usize,
    items: Vec<SearchItem>,
}

impl SearchContext {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            items: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    /// Record a match; returns whether the search should continue.
    pub fn try_emit(&mut self, item: SearchItem) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push(item);
        !self.is_full()
    }

    pub fn finish(self) -> SearchResult {
        let total = self.items.len();
        SearchResult {
            limited: total >= self.limit,
            total,
            items: self.items,
        }
    }
}

pub fn search(store: &BucketStore, request: &SearchRequest) -> Result<SearchResult, ApiError> {
    request.validate()?;
    let matcher = Matcher::new(&request.query, request.case_sensitive);
    let mut context = SearchContext::new(request.limit);

    store.view(|tx| -> Result<(), ApiError> {
        let start = resolve_existing(tx, &request.scope)?;
        Walker::new(tx, start, request.scope.segments().to_vec()).walk(
            |path, _, entry: &Entry| -> Result<WalkControl, ApiError> {
                if context.is_full() {
                    return Ok(WalkControl::Stop);
                }
                if matcher.matches(&entry.key) {
                    let item = SearchItem {
                        path: path.to_vec(),
                        key: entry.key.clone(),
                        value_size: entry.kind.value_len(),
                        is_bucket: entry.kind.is_bucket(),
                    };
                    if !context.try_emit(item) {
                        return Ok(WalkControl::Stop);
                    }
                }
                Ok(WalkControl::Continue)
            },
        )
    })?;

    let result = context.finish();
    debug!(
        query = %request.query,
        scope = %request.scope,
        total = result.total,
        limited = result.limited,
        "search finished"
    );
    Ok(result)
}
