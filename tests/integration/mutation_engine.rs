//! Mutation engine: bucket lifecycle, conflicts and read-only refusal

use super::test_utils::{mkdirs, open_ro, open_rw, path, put, seed, store_path};
use bucketscope::error::ErrorKind;
use bucketscope::listing::{list, ListRequest};
use bucketscope::mutation;
use bucketscope::store::{BucketId, EntrySource};
use bucketscope::tree::{resolve, BucketPath};
use tempfile::TempDir;

#[test]
fn test_create_nested_bucket_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));

    let err = mutation::create_bucket(&store, &path("a/b")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    mutation::create_bucket(&store, &path("a")).unwrap();
    mutation::create_bucket(&store, &path("a/b")).unwrap();

    let err = mutation::create_bucket(&store, &path("a/b")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn test_bucket_and_value_names_collide() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "a/sub");
    put(&store, "a", "leaf", b"v");

    let err = mutation::create_bucket(&store, &path("a/leaf")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = mutation::put(&store, &path("a"), b"sub", b"v").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Failed writes leave the bucket untouched.
    let page = list(&store, &path("a/sub"), &ListRequest::new(10)).unwrap();
    assert!(page.items.is_empty());
}

#[test]
fn test_delete_bucket_removes_whole_subtree() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "a/b/c");
    put(&store, "a/b/c", "deep", b"v");
    put(&store, "a", "top", b"v");
    mkdirs(&store, "other");

    mutation::delete_bucket(&store, &path("a")).unwrap();

    for raw in ["a", "a/b", "a/b/c"] {
        let err = list(&store, &path(raw), &ListRequest::new(10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "path {}", raw);
    }
    let root = list(&store, &BucketPath::Root, &ListRequest::new(10)).unwrap();
    assert_eq!(root.items.len(), 1);
    assert_eq!(root.items[0].key, b"other");

    // The name is free again and the new bucket starts empty.
    mutation::create_bucket(&store, &path("a")).unwrap();
    let page = list(&store, &path("a"), &ListRequest::new(10)).unwrap();
    assert!(page.items.is_empty());
}

#[test]
fn test_delete_nested_bucket_keeps_siblings() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "a/x");
    mkdirs(&store, "a/y");
    put(&store, "a/y", "k", b"v");

    mutation::delete_bucket(&store, &path("a/x")).unwrap();

    let found = store
        .view(|tx| {
            let y = resolve(tx, &path("a/y"))?;
            let x = resolve(tx, &path("a/x"))?;
            Ok::<_, bucketscope::error::StorageError>((x, y))
        })
        .unwrap();
    assert!(found.0.is_none());
    assert!(found.1.is_some());
}

#[test]
fn test_root_value_writes_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));

    let err = mutation::put(&store, &BucketPath::Root, b"k", b"v").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    let err = mutation::delete_bucket(&store, &BucketPath::Root).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    let count = store.view(|tx| tx.count_entries(BucketId::ROOT)).unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_read_only_store_refuses_writes() {
    let temp_dir = TempDir::new().unwrap();
    let db = store_path(&temp_dir);
    seed(&db, |store| mkdirs(store, "a"));

    let store = open_ro(&db);
    let err = mutation::create_bucket(&store, &path("b")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    let err = mutation::put(&store, &path("a"), b"k", b"v").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
}

#[test]
fn test_mutations_persist_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db = store_path(&temp_dir);
    seed(&db, |store| {
        mkdirs(store, "a/b");
        put(store, "a/b", "k", b"persisted");
    });

    let store = open_ro(&db);
    let page = list(&store, &path("a/b"), &ListRequest::new(10)).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].value_size, 9);
}
