//! Value accessor: head reads, full saves and root rejection

use super::test_utils::{mkdirs, open_rw, path, put, store_path};
use bucketscope::error::ErrorKind;
use bucketscope::mutation;
use bucketscope::tree::BucketPath;
use bucketscope::value::{read_head, save};
use tempfile::TempDir;

#[test]
fn test_put_then_read_head() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b");
    let value: Vec<u8> = (0u8..=255).collect();
    mutation::put(&store, &path("b"), b"bin", &value).unwrap();

    let full = read_head(&store, &path("b"), b"bin", value.len()).unwrap();
    assert_eq!(full.total_size, Some(value.len()));
    assert_eq!(full.head, value);

    let partial = read_head(&store, &path("b"), b"bin", 10).unwrap();
    assert_eq!(partial.total_size, Some(256));
    assert_eq!(partial.head.len(), 10);
    assert_eq!(partial.head, &value[..10]);
}

#[test]
fn test_overwrite_is_last_writer_wins() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b");
    put(&store, "b", "k", b"first value");
    put(&store, "b", "k", b"2nd");

    let head = read_head(&store, &path("b"), b"k", 100).unwrap();
    assert_eq!(head.total_size, Some(3));
    assert_eq!(head.head, b"2nd");
}

#[test]
fn test_empty_value_is_present() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b");
    put(&store, "b", "empty", b"");

    let head = read_head(&store, &path("b"), b"empty", 10).unwrap();
    assert_eq!(head.total_size, Some(0));
    assert!(head.found());
}

#[test]
fn test_root_reads_are_invalid_operations() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b");

    let err = read_head(&store, &BucketPath::Root, b"b", 10).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    let mut sink = Vec::new();
    let err = save(&store, &BucketPath::Root, b"b", &mut sink).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
}

#[test]
fn test_missing_bucket_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    let err = read_head(&store, &path("ghost"), b"k", 10).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_save_streams_full_value() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b/nested");
    let value = vec![7u8; 100_000];
    mutation::put(&store, &path("b"), b"big", &value).unwrap();

    let mut sink = Vec::new();
    assert_eq!(save(&store, &path("b"), b"big", &mut sink).unwrap(), value.len());
    assert_eq!(sink, value);

    let err = save(&store, &path("b"), b"nested", &mut Vec::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
