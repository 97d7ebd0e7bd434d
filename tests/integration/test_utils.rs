//! Shared test utilities for integration tests
//!
//! Stores live in a `TempDir`. Seeding goes through the public mutation API so
//! the fixtures exercise the same paths as real writes.

#![allow(dead_code)]

use bucketscope::listing::ListPage;
use bucketscope::mutation;
use bucketscope::store::{BucketStore, OpenMode};
use bucketscope::tree::BucketPath;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes tests that change process environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("store.db")
}

pub fn open_rw(path: &Path) -> BucketStore {
    BucketStore::open(path, OpenMode::ReadWrite).unwrap()
}

pub fn open_ro(path: &Path) -> BucketStore {
    BucketStore::open(path, OpenMode::ReadOnly).unwrap()
}

pub fn path(raw: &str) -> BucketPath {
    BucketPath::parse(raw).unwrap()
}

/// Create every bucket along `raw`, ignoring ones that already exist.
pub fn mkdirs(store: &BucketStore, raw: &str) {
    let mut prefix = String::new();
    for segment in raw.split('/') {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);
        let _ = mutation::create_bucket(store, &path(&prefix));
    }
}

pub fn put(store: &BucketStore, bucket: &str, key: &str, value: &[u8]) {
    mutation::put(store, &path(bucket), key.as_bytes(), value).unwrap();
}

/// Open a fresh store at `path`, run `f`, then close it so other handles can
/// open the file.
pub fn seed<F: FnOnce(&BucketStore)>(path: &Path, f: F) {
    let store = open_rw(path);
    f(&store);
}

pub fn keys(page: &ListPage) -> Vec<String> {
    page.items
        .iter()
        .map(|item| String::from_utf8(item.key.clone()).unwrap())
        .collect()
}

/// Run `f` with the given environment variables set, restoring them after.
pub fn with_env<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(name, _)| (name.to_string(), std::env::var(name).ok()))
        .collect();
    for (name, value) in vars {
        match value {
            Some(v) => std::env::set_var(name, v),
            None => std::env::remove_var(name),
        }
    }

    let result = f();

    for (name, value) in saved {
        match value {
            Some(v) => std::env::set_var(&name, v),
            None => std::env::remove_var(&name),
        }
    }
    result
}
