//! Persistence layer for the Bucket Store

use crate::error::StorageError;
use crate::store::encoding::{self, BucketId, Entry, EntryKind, EntryValue};
use crate::store::{EntrySource, DEFAULT_SCAN_BATCH};
use parking_lot::Mutex;
use redb::{Database, DatabaseError, ReadOnlyTable, ReadableTable, Table, TableDefinition};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const ENTRIES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("entries");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const FORMAT_VERSION_KEY: &str = "format_version";
const NEXT_BUCKET_ID_KEY: &str = "next_bucket_id";
const FORMAT_VERSION: u64 = 1;

/// Keys removed per range pass when purging a bucket.
const PURGE_BATCH: usize = 512;

/// How long an open waits for another process to release the store file.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY_START: Duration = Duration::from_millis(5);
const LOCK_RETRY_MAX: Duration = Duration::from_millis(200);

/// Engine handles open in this process, keyed by canonical path. The engine
/// locks its file per handle, so all stores on one file share one handle.
static OPEN_DATABASES: Mutex<BTreeMap<PathBuf, Weak<Database>>> =
    parking_lot::const_mutex(BTreeMap::new());

/// How a store file is opened for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file only; write transactions are refused.
    ReadOnly,
    /// File is created if absent.
    ReadWrite,
}

/// redb-backed store of nested buckets
pub struct BucketStore {
    db: Arc<Database>,
    path: PathBuf,
    mode: OpenMode,
    scan_batch: usize,
}

impl BucketStore {
    /// Open the store at `path`, waiting up to [`DEFAULT_LOCK_TIMEOUT`] for
    /// another process to release it.
    ///
    /// `ReadWrite` initialises the bucket tables on first use; `ReadOnly`
    /// treats a file without them as an empty store.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self, StorageError> {
        Self::open_with_timeout(path, mode, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn open_with_timeout<P: AsRef<Path>>(
        path: P,
        mode: OpenMode,
        lock_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let db = acquire(&path, mode, lock_timeout)?;
        let store = Self {
            db,
            path,
            mode,
            scan_batch: DEFAULT_SCAN_BATCH,
        };
        match mode {
            OpenMode::ReadWrite => store.initialize()?,
            OpenMode::ReadOnly => store.check_format()?,
        }
        debug!(path = %store.path.display(), ?mode, "bucket store opened");
        Ok(store)
    }

    /// Override the cursor batch size (entries pulled per engine scan).
    pub fn with_scan_batch(mut self, scan_batch: usize) -> Self {
        self.scan_batch = scan_batch.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn begin_read(&self) -> Result<ReadTx, StorageError> {
        Ok(ReadTx {
            tx: self.db.begin_read()?,
            batch: self.scan_batch,
        })
    }

    /// Start the single write transaction; blocks while another writer is active.
    pub fn begin_write(&self) -> Result<WriteTx, StorageError> {
        if self.mode == OpenMode::ReadOnly {
            return Err(StorageError::ReadOnly);
        }
        Ok(WriteTx {
            tx: self.db.begin_write()?,
            batch: self.scan_batch,
        })
    }

    /// Run `f` against a snapshot; the transaction is discarded afterwards.
    pub fn view<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StorageError>,
        F: FnOnce(&ReadTx) -> Result<T, E>,
    {
        let tx = self.begin_read()?;
        f(&tx)
    }

    /// Run `f` in a write transaction, committing on `Ok` and aborting on `Err`.
    pub fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StorageError>,
        F: FnOnce(&WriteTx) -> Result<T, E>,
    {
        let tx = self.begin_write()?;
        match f(&tx) {
            Ok(out) => {
                tx.commit()?;
                Ok(out)
            }
            Err(err) => {
                tx.rollback();
                Err(err)
            }
        }
    }

    fn initialize(&self) -> Result<(), StorageError> {
        let tx = self.db.begin_write()?;
        {
            let _entries = tx.open_table(ENTRIES)?;
            let mut meta = tx.open_table(META)?;
            let version = meta.get(FORMAT_VERSION_KEY)?.map(|g| g.value());
            match version {
                None => {
                    meta.insert(FORMAT_VERSION_KEY, FORMAT_VERSION)?;
                    meta.insert(NEXT_BUCKET_ID_KEY, 1u64)?;
                }
                Some(found) if found != FORMAT_VERSION => {
                    return Err(unsupported_format(found));
                }
                Some(_) => {}
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn check_format(&self) -> Result<(), StorageError> {
        let tx = self.db.begin_read()?;
        let meta = match tx.open_table(META) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        match meta.get(FORMAT_VERSION_KEY)?.map(|g| g.value()) {
            Some(found) if found != FORMAT_VERSION => Err(unsupported_format(found)),
            _ => Ok(()),
        }
    }
}

/// Get the engine handle for `path`, retrying with backoff while another
/// process holds the file.
fn acquire(path: &Path, mode: OpenMode, timeout: Duration) -> Result<Arc<Database>, StorageError> {
    let deadline = Instant::now() + timeout;
    let mut backoff = LOCK_RETRY_START;
    let mut waited = false;
    loop {
        if let Some(db) = try_acquire(path, mode)? {
            if waited {
                debug!(path = %path.display(), "store lock acquired after waiting");
            }
            return Ok(db);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(StorageError::LockTimeout(format!(
                "{} is held by another process (waited {:?})",
                path.display(),
                timeout
            )));
        }
        if !waited {
            debug!(path = %path.display(), "store locked by another process, waiting");
            waited = true;
        }
        std::thread::sleep(backoff.min(deadline - now));
        backoff = (backoff * 2).min(LOCK_RETRY_MAX);
    }
}

/// One attempt at [`acquire`]; `None` means the file lock is held elsewhere.
fn try_acquire(path: &Path, mode: OpenMode) -> Result<Option<Arc<Database>>, StorageError> {
    let mut open = OPEN_DATABASES.lock();
    open.retain(|_, handle| handle.strong_count() > 0);
    if let Ok(canonical) = path.canonicalize() {
        if let Some(db) = open.get(&canonical).and_then(Weak::upgrade) {
            return Ok(Some(db));
        }
    }

    let opened = match mode {
        OpenMode::ReadOnly => Database::open(path),
        OpenMode::ReadWrite => Database::create(path),
    };
    let db = match opened {
        Ok(db) => Arc::new(db),
        Err(DatabaseError::DatabaseAlreadyOpen) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    open.insert(canonical, Arc::downgrade(&db));
    Ok(Some(db))
}

fn unsupported_format(found: u64) -> StorageError {
    StorageError::Corrupt(format!(
        "unsupported bucket format version {} (expected {})",
        found, FORMAT_VERSION
    ))
}

/// Snapshot read transaction
pub struct ReadTx {
    tx: redb::ReadTransaction,
    batch: usize,
}

impl ReadTx {
    /// Run `f` on the entries table; a store without one reads as `missing`.
    fn with_entries<T, F>(&self, missing: T, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&ReadOnlyTable<&'static [u8], &'static [u8]>) -> Result<T, StorageError>,
    {
        match self.tx.open_table(ENTRIES) {
            Ok(table) => f(&table),
            Err(redb::TableError::TableDoesNotExist(_)) => Ok(missing),
            Err(e) => Err(e.into()),
        }
    }
}

impl EntrySource for ReadTx {
    fn scan(
        &self,
        bucket: BucketId,
        from: Bound<&[u8]>,
        limit: usize,
    ) -> Result<Vec<Entry>, StorageError> {
        self.with_entries(Vec::new(), |table| scan_table(table, bucket, from, limit))
    }

    fn get(&self, bucket: BucketId, key: &[u8]) -> Result<Option<EntryValue>, StorageError> {
        self.with_entries(None, |table| get_slot(table, bucket, key))
    }

    fn kind(&self, bucket: BucketId, key: &[u8]) -> Result<Option<EntryKind>, StorageError> {
        self.with_entries(None, |table| kind_of(table, bucket, key))
    }

    fn value_head(
        &self,
        bucket: BucketId,
        key: &[u8],
        n: usize,
    ) -> Result<Option<(usize, Vec<u8>)>, StorageError> {
        self.with_entries(None, |table| head_of(table, bucket, key, n))
    }

    fn batch_size(&self) -> usize {
        self.batch
    }
}

/// Exclusive write transaction
pub struct WriteTx {
    tx: redb::WriteTransaction,
    batch: usize,
}

impl EntrySource for WriteTx {
    fn scan(
        &self,
        bucket: BucketId,
        from: Bound<&[u8]>,
        limit: usize,
    ) -> Result<Vec<Entry>, StorageError> {
        let table = self.tx.open_table(ENTRIES)?;
        scan_table(&table, bucket, from, limit)
    }

    fn get(&self, bucket: BucketId, key: &[u8]) -> Result<Option<EntryValue>, StorageError> {
        let table = self.tx.open_table(ENTRIES)?;
        get_slot(&table, bucket, key)
    }

    fn kind(&self, bucket: BucketId, key: &[u8]) -> Result<Option<EntryKind>, StorageError> {
        let table = self.tx.open_table(ENTRIES)?;
        kind_of(&table, bucket, key)
    }

    fn value_head(
        &self,
        bucket: BucketId,
        key: &[u8],
        n: usize,
    ) -> Result<Option<(usize, Vec<u8>)>, StorageError> {
        let table = self.tx.open_table(ENTRIES)?;
        head_of(&table, bucket, key, n)
    }

    fn batch_size(&self) -> usize {
        self.batch
    }
}

impl WriteTx {
    /// Create bucket `name` inside `parent` and return its handle.
    pub fn create_bucket(&self, parent: BucketId, name: &[u8]) -> Result<BucketId, StorageError> {
        match self.kind(parent, name)? {
            Some(EntryKind::Bucket(_)) => return Err(StorageError::BucketExists(lossy(name))),
            Some(EntryKind::Value { .. }) => {
                return Err(StorageError::IncompatibleValue(format!(
                    "key {} already holds a value",
                    lossy(name)
                )))
            }
            None => {}
        }
        let child = self.allocate_bucket_id()?;
        let mut entries = self.tx.open_table(ENTRIES)?;
        entries.insert(
            encoding::entry_key(parent, name).as_slice(),
            encoding::encode_bucket(child).as_slice(),
        )?;
        debug!(parent = parent.get(), child = child.get(), "bucket created");
        Ok(child)
    }

    /// Delete bucket `name` of `parent` together with everything below it.
    pub fn delete_bucket(&self, parent: BucketId, name: &[u8]) -> Result<(), StorageError> {
        let target = match self.kind(parent, name)? {
            Some(EntryKind::Bucket(id)) => id,
            Some(EntryKind::Value { .. }) => {
                return Err(StorageError::IncompatibleValue(format!(
                    "key {} holds a value, not a bucket",
                    lossy(name)
                )))
            }
            None => return Err(StorageError::BucketNotFound(lossy(name))),
        };
        let doomed = self.collect_subtree(target)?;
        let mut entries = self.tx.open_table(ENTRIES)?;
        for bucket in &doomed {
            purge_bucket(&mut entries, *bucket)?;
        }
        entries.remove(encoding::entry_key(parent, name).as_slice())?;
        debug!(
            parent = parent.get(),
            buckets = doomed.len(),
            "bucket subtree deleted"
        );
        Ok(())
    }

    /// Insert or overwrite a value.
    pub fn put(&self, bucket: BucketId, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let mut entries = self.tx.open_table(ENTRIES)?;
        let raw = encoding::entry_key(bucket, key);
        let holds_bucket = entries
            .get(raw.as_slice())?
            .map(|slot| encoding::is_bucket_slot(slot.value()))
            .unwrap_or(false);
        if holds_bucket {
            return Err(StorageError::IncompatibleValue(format!(
                "key {} is a bucket",
                lossy(key)
            )));
        }
        entries.insert(raw.as_slice(), encoding::encode_value(value).as_slice())?;
        Ok(())
    }

    /// Remove a value; returns whether the key was present.
    pub fn delete(&self, bucket: BucketId, key: &[u8]) -> Result<bool, StorageError> {
        let mut entries = self.tx.open_table(ENTRIES)?;
        let raw = encoding::entry_key(bucket, key);
        let holds_bucket = entries
            .get(raw.as_slice())?
            .map(|slot| encoding::is_bucket_slot(slot.value()))
            .unwrap_or(false);
        if holds_bucket {
            return Err(StorageError::IncompatibleValue(format!(
                "key {} is a bucket",
                lossy(key)
            )));
        }
        let removed = entries.remove(raw.as_slice())?.is_some();
        Ok(removed)
    }

    pub fn commit(self) -> Result<(), StorageError> {
        self.tx.commit()?;
        Ok(())
    }

    pub fn rollback(self) {
        if let Err(e) = self.tx.abort() {
            warn!("write transaction abort failed: {}", e);
        }
    }

    fn allocate_bucket_id(&self) -> Result<BucketId, StorageError> {
        let mut meta = self.tx.open_table(META)?;
        let next = meta
            .get(NEXT_BUCKET_ID_KEY)?
            .map(|g| g.value())
            .unwrap_or(1);
        let following = next
            .checked_add(1)
            .ok_or_else(|| StorageError::Corrupt("bucket id space exhausted".to_string()))?;
        meta.insert(NEXT_BUCKET_ID_KEY, following)?;
        Ok(BucketId::new(next))
    }

    fn collect_subtree(&self, top: BucketId) -> Result<Vec<BucketId>, StorageError> {
        let mut pending = vec![top];
        let mut found = Vec::new();
        while let Some(bucket) = pending.pop() {
            found.push(bucket);
            let mut cursor = self.cursor(bucket);
            let mut entry = cursor.first()?;
            while let Some(e) = entry {
                if let EntryKind::Bucket(child) = e.kind {
                    pending.push(child);
                }
                entry = cursor.next()?;
            }
        }
        Ok(found)
    }
}

fn scan_table<T>(
    table: &T,
    bucket: BucketId,
    from: Bound<&[u8]>,
    limit: usize,
) -> Result<Vec<Entry>, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let (lower, upper) = encoding::bucket_range(bucket, from);
    let mut entries = Vec::new();
    if limit == 0 {
        return Ok(entries);
    }
    for item in table.range::<&[u8]>((as_slice_bound(&lower), as_slice_bound(&upper)))? {
        let (raw_key, slot) = item?;
        let (_, key) = encoding::split_entry_key(raw_key.value())?;
        entries.push(Entry {
            key: key.to_vec(),
            kind: encoding::slot_kind(slot.value())?,
        });
        if entries.len() >= limit {
            break;
        }
    }
    Ok(entries)
}

fn get_slot<T>(table: &T, bucket: BucketId, key: &[u8]) -> Result<Option<EntryValue>, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let raw = encoding::entry_key(bucket, key);
    match table.get(raw.as_slice())? {
        Some(slot) => Ok(Some(encoding::decode_slot(slot.value())?)),
        None => Ok(None),
    }
}

fn kind_of<T>(table: &T, bucket: BucketId, key: &[u8]) -> Result<Option<EntryKind>, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let raw = encoding::entry_key(bucket, key);
    match table.get(raw.as_slice())? {
        Some(slot) => Ok(Some(encoding::slot_kind(slot.value())?)),
        None => Ok(None),
    }
}

/// Copy at most `n` leading value bytes straight out of the stored slot.
fn head_of<T>(
    table: &T,
    bucket: BucketId,
    key: &[u8],
    n: usize,
) -> Result<Option<(usize, Vec<u8>)>, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let raw = encoding::entry_key(bucket, key);
    let guard = match table.get(raw.as_slice())? {
        Some(guard) => guard,
        None => return Ok(None),
    };
    let slot = guard.value();
    match encoding::slot_kind(slot)? {
        EntryKind::Value { len } => {
            let head = encoding::value_bytes(slot)
                .map(|bytes| bytes[..len.min(n)].to_vec())
                .unwrap_or_default();
            Ok(Some((len, head)))
        }
        EntryKind::Bucket(_) => Ok(None),
    }
}

fn purge_bucket(
    table: &mut Table<'_, &'static [u8], &'static [u8]>,
    bucket: BucketId,
) -> Result<(), StorageError> {
    let (lower, upper) = encoding::bucket_range(bucket, Bound::Unbounded);
    loop {
        let mut keys = Vec::new();
        for item in table.range::<&[u8]>((as_slice_bound(&lower), as_slice_bound(&upper)))? {
            let (raw_key, _) = item?;
            keys.push(raw_key.value().to_vec());
            if keys.len() >= PURGE_BATCH {
                break;
            }
        }
        if keys.is_empty() {
            return Ok(());
        }
        for raw in &keys {
            table.remove(raw.as_slice())?;
        }
    }
}

fn as_slice_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(v) => Bound::Included(v.as_slice()),
        Bound::Excluded(v) => Bound::Excluded(v.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
