//! Search: case folding, limits, pre-order paths and subtree scope

use super::test_utils::{mkdirs, open_rw, path, put, store_path};
use bucketscope::error::ErrorKind;
use bucketscope::mutation;
use bucketscope::search::{search, SearchRequest};
use tempfile::TempDir;

fn found_keys(result: &bucketscope::search::SearchResult) -> Vec<String> {
    result
        .items
        .iter()
        .map(|item| String::from_utf8(item.key.clone()).unwrap())
        .collect()
}

#[test]
fn test_case_folding() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b");
    for key in ["Alpha", "beta", "ALPHABET"] {
        put(&store, "b", key, b"v");
    }

    let folded = search(&store, &SearchRequest::new("alpha", 10)).unwrap();
    let mut keys = found_keys(&folded);
    keys.sort();
    assert_eq!(keys, vec!["ALPHABET", "Alpha"]);

    let exact = search(&store, &SearchRequest::new("Alpha", 10).case_sensitive(true)).unwrap();
    assert_eq!(found_keys(&exact), vec!["Alpha"]);
}

#[test]
fn test_limit_cutoff() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "b");
    for i in 0..5 {
        put(&store, "b", &format!("match-{}", i), b"v");
    }
    put(&store, "b", "other", b"v");

    let one = search(&store, &SearchRequest::new("match", 1)).unwrap();
    assert_eq!(one.items.len(), 1);
    assert_eq!(one.total, 1);
    assert!(one.limited);

    let ten = search(&store, &SearchRequest::new("match", 10)).unwrap();
    assert_eq!(ten.items.len(), 5);
    assert!(!ten.limited);

    // Exactly as many matches as the limit is still reported as limited.
    let five = search(&store, &SearchRequest::new("match", 5)).unwrap();
    assert_eq!(five.items.len(), 5);
    assert!(five.limited);
}

#[test]
fn test_pre_order_with_paths_and_sizes() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "cfg/cfg-nested");
    put(&store, "cfg/cfg-nested", "cfg-leaf", b"abc");
    put(&store, "cfg", "zzz-cfg", b"12");

    let result = search(&store, &SearchRequest::new("cfg", 100)).unwrap();
    let rows: Vec<(Vec<String>, String, bool, usize)> = result
        .items
        .iter()
        .map(|item| {
            (
                item.path
                    .iter()
                    .map(|s| String::from_utf8(s.clone()).unwrap())
                    .collect(),
                String::from_utf8(item.key.clone()).unwrap(),
                item.is_bucket,
                item.value_size,
            )
        })
        .collect();

    let expected: Vec<(Vec<String>, String, bool, usize)> = vec![
        (vec![], "cfg".to_string(), true, 0),
        (vec!["cfg".to_string()], "cfg-nested".to_string(), true, 0),
        (
            vec!["cfg".to_string(), "cfg-nested".to_string()],
            "cfg-leaf".to_string(),
            false,
            3,
        ),
        (vec!["cfg".to_string()], "zzz-cfg".to_string(), false, 2),
    ];
    assert_eq!(rows, expected);
}

#[test]
fn test_recurses_into_non_matching_buckets() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "outer/middle");
    put(&store, "outer/middle", "needle", b"v");

    let result = search(&store, &SearchRequest::new("needle", 10)).unwrap();
    assert_eq!(found_keys(&result), vec!["needle"]);
    assert_eq!(
        result.items[0].path,
        vec![b"outer".to_vec(), b"middle".to_vec()]
    );
}

#[test]
fn test_scope_restricts_to_subtree() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "a");
    mkdirs(&store, "b");
    put(&store, "a", "key", b"v");
    put(&store, "b", "key", b"v");

    let result = search(&store, &SearchRequest::new("key", 10).within(path("b"))).unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(result.items[0].path, vec![b"b".to_vec()]);

    let err = search(&store, &SearchRequest::new("key", 10).within(path("zzz"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_deleted_subtree_is_gone() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    mkdirs(&store, "a/b/c");
    put(&store, "a/b/c", "secret", b"v");
    mkdirs(&store, "keep");

    mutation::delete_bucket(&store, &path("a")).unwrap();

    let result = search(&store, &SearchRequest::new("secret", 10)).unwrap();
    assert!(result.items.is_empty());
    let err = search(&store, &SearchRequest::new("c", 10).within(path("a/b"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_invalid_requests() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_rw(&store_path(&temp_dir));
    for request in [SearchRequest::new("", 10), SearchRequest::new("x", 0)] {
        let err = search(&store, &request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
