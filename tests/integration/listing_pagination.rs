//! Listing: root counts, prefixes and key-based page chaining

use super::test_utils::{keys, mkdirs, open_rw, path, put, store_path};
use bucketscope::error::ErrorKind;
use bucketscope::listing::{list, list_bucket_names, ListRequest};
use bucketscope::mutation;
use bucketscope::tree::BucketPath;
use tempfile::TempDir;

/// Follow `nextAfterKey` until exhaustion.
fn collect_all(
    store: &bucketscope::store::BucketStore,
    bucket: &BucketPath,
    limit: usize,
) -> Vec<String> {
    let mut all = Vec::new();
    let mut after = None;
    loop {
        let page = list(store, bucket, &ListRequest::new(limit).with_after_key(after)).unwrap();
        assert!(page.items.len() <= limit);
        all.extend(keys(&page));
        match page.next_after_key {
            Some(next) => after = Some(next),
            None => break,
        }
    }
    all
}

#[test]
fn test_root_listing_counts_entries_of_returned_buckets() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "alpha/inner");
    put(&store, "alpha", "k1", b"v");
    put(&store, "alpha", "k2", b"v");
    mkdirs(&store, "beta");
    mkdirs(&store, "gamma");
    put(&store, "gamma", "only", b"v");

    let page = list(&store, &BucketPath::Root, &ListRequest::new(2)).unwrap();
    assert_eq!(keys(&page), vec!["alpha", "beta"]);
    assert!(page.items.iter().all(|item| item.is_bucket));
    // alpha holds k1, k2 and the nested bucket
    assert_eq!(page.items[0].value_size, 3);
    assert_eq!(page.items[1].value_size, 0);
    assert_eq!(page.next_after_key, Some(b"beta".to_vec()));

    let page = list(
        &store,
        &BucketPath::Root,
        &ListRequest::new(2).with_after_key(page.next_after_key),
    )
    .unwrap();
    assert_eq!(keys(&page), vec!["gamma"]);
    assert_eq!(page.items[0].value_size, 1);
    assert!(page.next_after_key.is_none());
}

#[test]
fn test_root_prefix_filter() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    for name in ["app", "apple", "banana", "apricot"] {
        mkdirs(&store, name);
    }
    let page = list(&store, &BucketPath::Root, &ListRequest::new(10).with_prefix("ap")).unwrap();
    assert_eq!(keys(&page), vec!["app", "apple", "apricot"]);
}

#[test]
fn test_chained_pages_match_full_scan() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir)).with_scan_batch(2);
    mkdirs(&store, "b");
    for i in 0..7 {
        put(&store, "b", &format!("key-{:02}", i), b"x");
    }
    mkdirs(&store, "b/sub");

    let bucket = path("b");
    let full = collect_all(&store, &bucket, 1000);
    assert_eq!(full.len(), 8);
    let mut sorted = full.clone();
    sorted.sort();
    assert_eq!(full, sorted);

    for limit in [1, full.len(), full.len() + 1] {
        assert_eq!(collect_all(&store, &bucket, limit), full, "limit {}", limit);
    }
}

#[test]
fn test_nested_listing_reports_sizes_and_kinds() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b/child");
    put(&store, "b", "blob", b"12345");

    let page = list(&store, &path("b"), &ListRequest::new(10)).unwrap();
    assert_eq!(keys(&page), vec!["blob", "child"]);
    assert_eq!(page.items[0].value_size, 5);
    assert!(!page.items[0].is_bucket);
    assert!(page.items[1].is_bucket);
    assert_eq!(page.items[1].value_size, 0);
}

#[test]
fn test_deleted_key_never_listed() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b");
    for key in ["a", "b", "c"] {
        put(&store, "b", key, b"v");
    }

    mutation::delete_key(&store, &path("b"), b"b").unwrap();
    let page = list(&store, &path("b"), &ListRequest::new(10)).unwrap();
    assert_eq!(keys(&page), vec!["a", "c"]);

    mutation::delete_key(&store, &path("b"), b"zzz").unwrap();
    let again = list(&store, &path("b"), &ListRequest::new(10)).unwrap();
    assert_eq!(again, page);
}

#[test]
fn test_resume_after_deleted_token() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b");
    for key in ["a", "b", "c", "d"] {
        put(&store, "b", key, b"v");
    }

    let first = list(&store, &path("b"), &ListRequest::new(2)).unwrap();
    assert_eq!(first.next_after_key, Some(b"b".to_vec()));

    // The token key disappears between pages; the next page must still start at "c".
    mutation::delete_key(&store, &path("b"), b"b").unwrap();
    let second = list(
        &store,
        &path("b"),
        &ListRequest::new(2).with_after_key(first.next_after_key),
    )
    .unwrap();
    assert_eq!(keys(&second), vec!["c", "d"]);
}

#[test]
fn test_listing_missing_or_value_path_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b");
    put(&store, "b", "leaf", b"v");

    for raw in ["nope", "b/leaf", "b/leaf/deeper"] {
        let err = list(&store, &path(raw), &ListRequest::new(10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "path {}", raw);
    }
}

#[test]
fn test_list_bucket_names_skips_values() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b/x");
    mkdirs(&store, "b/y");
    put(&store, "b", "value", b"v");

    let names = list_bucket_names(&store, &path("b")).unwrap();
    assert_eq!(names, vec![b"x".to_vec(), b"y".to_vec()]);

    let roots = list_bucket_names(&store, &BucketPath::Root).unwrap();
    assert_eq!(roots, vec![b"b".to_vec()]);
}
