//! Concurrency model: shared readers, snapshot isolation and the single writer

use super::test_utils::{keys, mkdirs, path, put, seed, store_path};
use bucketscope::config::StoreConfig;
use bucketscope::listing::{list, ListRequest};
use bucketscope::meta::open_store;
use bucketscope::mutation;
use bucketscope::store::{BucketId, EntrySource, EntryValue, OpenMode};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn seeded(temp_dir: &TempDir) -> std::path::PathBuf {
    let db = store_path(temp_dir);
    seed(&db, |store| {
        mkdirs(store, "cfg");
        put(store, "cfg", "a", b"1");
        put(store, "cfg", "b", b"2");
    });
    db
}

#[test]
fn test_two_read_only_opens_list_side_by_side() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded(&temp_dir);
    let settings = StoreConfig::default();

    let first = open_store(&db, OpenMode::ReadOnly, &settings).unwrap();
    let second = open_store(&db, OpenMode::ReadOnly, &settings).unwrap();

    let request = ListRequest::new(10);
    assert_eq!(keys(&list(&first, &path("cfg"), &request).unwrap()), vec!["a", "b"]);
    assert_eq!(keys(&list(&second, &path("cfg"), &request).unwrap()), vec!["a", "b"]);
}

#[test]
fn test_reader_opens_while_writer_holds_store() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded(&temp_dir);
    let settings = StoreConfig::default();

    let writer = open_store(&db, OpenMode::ReadWrite, &settings).unwrap();
    let reader = open_store(&db, OpenMode::ReadOnly, &settings).unwrap();

    mutation::put(&writer, &path("cfg"), b"c", b"3").unwrap();
    let page = list(&reader, &path("cfg"), &ListRequest::new(10)).unwrap();
    assert_eq!(keys(&page), vec!["a", "b", "c"]);
}

#[test]
fn test_readers_on_many_threads() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded(&temp_dir);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let db = db.clone();
            thread::spawn(move || {
                let store = open_store(&db, OpenMode::ReadOnly, &StoreConfig::default())?;
                list(&store, &path("cfg"), &ListRequest::new(10))
            })
        })
        .collect();

    for handle in handles {
        let page = handle.join().unwrap().unwrap();
        assert_eq!(keys(&page), vec!["a", "b"]);
    }
}

#[test]
fn test_read_snapshot_ignores_later_commits() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded(&temp_dir);
    let store = open_store(&db, OpenMode::ReadWrite, &StoreConfig::default()).unwrap();

    let snapshot = store.begin_read().unwrap();
    let bucket = snapshot.bucket(BucketId::ROOT, b"cfg").unwrap().unwrap();

    mutation::put(&store, &path("cfg"), b"a", b"changed").unwrap();
    mutation::delete_key(&store, &path("cfg"), b"b").unwrap();
    mutation::delete_bucket(&store, &path("cfg")).unwrap();

    assert_eq!(
        snapshot.get(bucket, b"a").unwrap(),
        Some(EntryValue::Value(b"1".to_vec()))
    );
    assert_eq!(
        snapshot.get(bucket, b"b").unwrap(),
        Some(EntryValue::Value(b"2".to_vec()))
    );
    assert_eq!(snapshot.count_entries(bucket).unwrap(), 2);

    let fresh = store.begin_read().unwrap();
    assert_eq!(fresh.bucket(BucketId::ROOT, b"cfg").unwrap(), None);
}

#[test]
fn test_second_writer_waits_for_commit() {
    let temp_dir = TempDir::new().unwrap();
    let db = seeded(&temp_dir);
    let first = open_store(&db, OpenMode::ReadWrite, &StoreConfig::default()).unwrap();

    let tx = first.begin_write().unwrap();
    let cfg = tx.bucket(BucketId::ROOT, b"cfg").unwrap().unwrap();
    tx.put(cfg, b"first", b"1").unwrap();

    let other = db.clone();
    let second = thread::spawn(move || {
        let store = open_store(&other, OpenMode::ReadWrite, &StoreConfig::default())?;
        mutation::put(&store, &path("cfg"), b"second", b"2")
    });

    thread::sleep(Duration::from_millis(200));
    assert!(!second.is_finished(), "writer must wait for the open transaction");

    tx.commit().unwrap();
    second.join().unwrap().unwrap();

    let page = list(&first, &path("cfg"), &ListRequest::new(10)).unwrap();
    assert_eq!(keys(&page), vec!["a", "b", "first", "second"]);
}
