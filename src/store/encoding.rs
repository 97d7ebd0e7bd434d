//! On-disk layout of buckets inside the engine's single entries table.
//!
//! Every bucket owns a numeric id. An entry `key` of bucket `id` lives at
//! `be64(id) || key`, so one bucket's entries form a contiguous range ordered
//! by raw key bytes. The stored slot is tagged: `0x00 || bytes` for a value,
//! `0x01 || be64(child)` for a nested bucket.

use crate::error::StorageError;
use std::ops::Bound;

const ID_LEN: usize = 8;
const TAG_VALUE: u8 = 0x00;
const TAG_BUCKET: u8 = 0x01;

/// Handle of a bucket within the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketId(u64);

impl BucketId {
    /// The implicit root bucket; holds only nested buckets.
    pub const ROOT: BucketId = BucketId(0);

    pub fn new(raw: u64) -> Self {
        BucketId(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_root(self) -> bool {
        self.0 == 0
    }
}

/// A stored value, or the handle of a nested bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    Value(Vec<u8>),
    Bucket(BucketId),
}

impl EntryValue {
    pub fn is_bucket(&self) -> bool {
        matches!(self, EntryValue::Bucket(_))
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            EntryValue::Value(bytes) => EntryKind::Value { len: bytes.len() },
            EntryValue::Bucket(id) => EntryKind::Bucket(*id),
        }
    }
}

/// What an entry holds, without the value bytes. Scans yield this so that
/// enumerating a bucket never copies its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Value { len: usize },
    Bucket(BucketId),
}

impl EntryKind {
    pub fn is_bucket(&self) -> bool {
        matches!(self, EntryKind::Bucket(_))
    }

    /// Byte length of a value; nested buckets report 0.
    pub fn value_len(&self) -> usize {
        match self {
            EntryKind::Value { len } => *len,
            EntryKind::Bucket(_) => 0,
        }
    }

    pub fn as_bucket(&self) -> Option<BucketId> {
        match self {
            EntryKind::Bucket(id) => Some(*id),
            EntryKind::Value { .. } => None,
        }
    }
}

/// One key of a bucket together with what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub kind: EntryKind,
}

pub fn entry_key(bucket: BucketId, key: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(ID_LEN + key.len());
    raw.extend_from_slice(&bucket.0.to_be_bytes());
    raw.extend_from_slice(key);
    raw
}

/// Split a stored key into its bucket id and the entry key.
pub fn split_entry_key(raw: &[u8]) -> Result<(BucketId, &[u8]), StorageError> {
    if raw.len() < ID_LEN {
        return Err(StorageError::Corrupt(format!(
            "entry key shorter than bucket prefix ({} bytes)",
            raw.len()
        )));
    }
    let (id, key) = raw.split_at(ID_LEN);
    let mut buf = [0u8; ID_LEN];
    buf.copy_from_slice(id);
    Ok((BucketId(u64::from_be_bytes(buf)), key))
}

/// Stored-key bounds covering `bucket`'s entries from `from` onward.
pub fn bucket_range(bucket: BucketId, from: Bound<&[u8]>) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let lower = match from {
        Bound::Unbounded => Bound::Included(entry_key(bucket, &[])),
        Bound::Included(key) => Bound::Included(entry_key(bucket, key)),
        Bound::Excluded(key) => Bound::Excluded(entry_key(bucket, key)),
    };
    let upper = match bucket.0.checked_add(1) {
        Some(next) => Bound::Excluded(next.to_be_bytes().to_vec()),
        None => Bound::Unbounded,
    };
    (lower, upper)
}

pub fn encode_value(value: &[u8]) -> Vec<u8> {
    let mut slot = Vec::with_capacity(1 + value.len());
    slot.push(TAG_VALUE);
    slot.extend_from_slice(value);
    slot
}

pub fn encode_bucket(child: BucketId) -> Vec<u8> {
    let mut slot = Vec::with_capacity(1 + ID_LEN);
    slot.push(TAG_BUCKET);
    slot.extend_from_slice(&child.0.to_be_bytes());
    slot
}

pub fn is_bucket_slot(slot: &[u8]) -> bool {
    slot.first() == Some(&TAG_BUCKET)
}

/// Classify a slot without copying its payload.
pub fn slot_kind(slot: &[u8]) -> Result<EntryKind, StorageError> {
    match slot.split_first() {
        Some((&TAG_VALUE, bytes)) => Ok(EntryKind::Value { len: bytes.len() }),
        Some((&TAG_BUCKET, id)) if id.len() == ID_LEN => {
            let mut buf = [0u8; ID_LEN];
            buf.copy_from_slice(id);
            Ok(EntryKind::Bucket(BucketId(u64::from_be_bytes(buf))))
        }
        Some((tag, rest)) => Err(StorageError::Corrupt(format!(
            "unknown slot tag {:#04x} ({} payload bytes)",
            tag,
            rest.len()
        ))),
        None => Err(StorageError::Corrupt("empty slot".to_string())),
    }
}

/// The value bytes of a value slot, borrowed from the slot.
pub fn value_bytes(slot: &[u8]) -> Option<&[u8]> {
    match slot.split_first() {
        Some((&TAG_VALUE, bytes)) => Some(bytes),
        _ => None,
    }
}

pub fn decode_slot(slot: &[u8]) -> Result<EntryValue, StorageError> {
    match slot_kind(slot)? {
        EntryKind::Bucket(id) => Ok(EntryValue::Bucket(id)),
        EntryKind::Value { .. } => Ok(EntryValue::Value(slot[1..].to_vec())),
    }
}
