//! Bucket paths and their resolution to bucket handles

use crate::error::{ApiError, StorageError};
use crate::store::{BucketId, EntrySource};
use std::fmt;

/// Location of a bucket, from the store root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BucketPath {
    /// The implicit root, which holds only top-level buckets.
    #[default]
    Root,
    /// Bucket names from the root down; never empty.
    Nested(Vec<Vec<u8>>),
}

impl BucketPath {
    /// Parse a slash-separated path.
    ///
    /// `""` and `"/"` denote the root. Leading and trailing slashes are
    /// ignored; an empty inner segment is rejected.
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let trimmed = raw.trim_start_matches('/').trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(BucketPath::Root);
        }
        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return Err(ApiError::InvalidArgument(format!(
                    "empty segment in bucket path: {}",
                    raw
                )));
            }
            segments.push(segment.as_bytes().to_vec());
        }
        Ok(BucketPath::Nested(segments))
    }

    pub fn from_segments(segments: Vec<Vec<u8>>) -> Self {
        if segments.is_empty() {
            BucketPath::Root
        } else {
            BucketPath::Nested(segments)
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, BucketPath::Root)
    }

    pub fn segments(&self) -> &[Vec<u8>] {
        match self {
            BucketPath::Root => &[],
            BucketPath::Nested(segments) => segments,
        }
    }

    pub fn depth(&self) -> usize {
        self.segments().len()
    }

    /// Parent path and the final segment; `None` at the root.
    pub fn split_last(&self) -> Option<(BucketPath, &[u8])> {
        match self {
            BucketPath::Root => None,
            BucketPath::Nested(segments) => {
                let (last, parent) = segments.split_last()?;
                Some((BucketPath::from_segments(parent.to_vec()), last.as_slice()))
            }
        }
    }

    pub fn child(&self, name: &[u8]) -> BucketPath {
        let mut segments = self.segments().to_vec();
        segments.push(name.to_vec());
        BucketPath::Nested(segments)
    }

    /// Segments rendered as text, invalid UTF-8 replaced.
    pub fn display_segments(&self) -> Vec<String> {
        self.segments()
            .iter()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect()
    }
}

impl fmt::Display for BucketPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketPath::Root => f.write_str("/"),
            BucketPath::Nested(_) => f.write_str(&self.display_segments().join("/")),
        }
    }
}

/// Resolve `path` to a bucket handle by descending name by name.
///
/// Returns `None` if any segment is missing or names a value instead of a
/// bucket. The root always resolves.
pub fn resolve<S: EntrySource + ?Sized>(
    source: &S,
    path: &BucketPath,
) -> Result<Option<BucketId>, StorageError> {
    let mut current = BucketId::ROOT;
    for segment in path.segments() {
        match source.bucket(current, segment)? {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Resolve `path` or fail with `NotFound`.
pub fn resolve_existing<S: EntrySource + ?Sized>(
    source: &S,
    path: &BucketPath,
) -> Result<BucketId, ApiError> {
    resolve(source, path)?.ok_or_else(|| ApiError::bucket_not_found(path))
}
