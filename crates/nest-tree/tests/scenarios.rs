//! End-to-end behaviour of the resource tree through its public API.

use std::sync::{Arc, Barrier};
use std::thread;

use serde_json::json;

use nest_patch::parse_patch;
use nest_tree::{PutOutcome, ResourceTree, TreeError};
use nest_types::ResourcePath;

fn path(s: &str) -> ResourcePath {
    ResourcePath::parse(s).unwrap()
}

fn tree_with_db() -> ResourceTree {
    let tree = ResourceTree::with_defaults();
    tree.create_database("db", "admin").unwrap();
    tree
}

// ---- Scenario 1: database creation is create-only ----

#[test]
fn second_database_create_conflicts() {
    let tree = ResourceTree::with_defaults();
    assert_eq!(tree.create_database("db", "admin").unwrap().to_string(), "/db");
    let err = tree.create_database("db", "admin").unwrap_err();
    assert_eq!(err, TreeError::Conflict("/db".into()));
}

// ---- Scenario 2: put then get round-trips path, body, and metadata ----

#[test]
fn put_then_get_document() {
    let tree = tree_with_db();
    let put = tree
        .put_document(&path("/db/doc"), json!({"a": 1}), "alice", None)
        .unwrap();
    assert_eq!(put.outcome, PutOutcome::Created);

    let got = tree.get_document(&path("/db/doc")).unwrap();
    assert_eq!(got.path, "/doc");
    assert_eq!(got.doc, json!({"a": 1}));
    assert_eq!(got.meta.created_at, got.meta.last_modified_at);
    assert_eq!(got.meta.created_by, "alice");
    assert_eq!(got, put.representation);
}

// ---- Scenario 3: collections are create-only ----

#[test]
fn collection_put_conflicts_on_retry() {
    let tree = tree_with_db();
    tree.put_document(&path("/db/doc"), json!({"a": 1}), "alice", None)
        .unwrap();

    tree.put_collection(&path("/db/doc/col"), "alice").unwrap();
    let err = tree.put_collection(&path("/db/doc/col"), "alice").unwrap_err();
    assert!(matches!(err, TreeError::Conflict(_)));
}

// ---- Scenario 4: a failed patch leaves the document unchanged ----

#[test]
fn patch_with_missing_target_fails_cleanly() {
    let tree = tree_with_db();
    tree.put_document(&path("/db/doc"), json!({"a": 1}), "alice", None)
        .unwrap();
    let before = tree.get_document(&path("/db/doc")).unwrap();

    let ops = parse_patch(&json!([{"op": "ArrayAdd", "path": "/x", "value": 1}])).unwrap();
    let err = tree
        .patch_document(&path("/db/doc"), &ops, "bob")
        .unwrap_err();
    assert!(matches!(err, TreeError::PatchTargetNotFound { index: 0, .. }));
    assert_eq!(tree.get_document(&path("/db/doc")).unwrap(), before);
}

// ---- Scenario 5: deleted documents are gone ----

#[test]
fn delete_then_get_is_not_found() {
    let tree = tree_with_db();
    tree.put_document(&path("/db/doc"), json!({"a": 1}), "alice", None)
        .unwrap();
    tree.delete_document(&path("/db/doc")).unwrap();

    let err = tree.get_document(&path("/db/doc")).unwrap_err();
    assert!(matches!(err, TreeError::NotFound(_)));
    let db = tree.get_database("db").unwrap();
    assert!(nest_tree::DocumentContainer::get_child(db.as_ref(), "doc").is_none());
}

// ---- Scenario 6: racing puts of one name create exactly once ----

#[test]
fn concurrent_puts_create_once() {
    for _ in 0..50 {
        let tree = Arc::new(tree_with_db());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let tree = Arc::clone(&tree);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    tree.put_document(&path("/db/doc"), json!({"writer": i}), "u", None)
                        .unwrap()
                        .outcome
                })
            })
            .collect();
        let outcomes: Vec<PutOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(
            outcomes.iter().filter(|o| **o == PutOutcome::Created).count(),
            1
        );
        assert_eq!(
            outcomes.iter().filter(|o| **o == PutOutcome::Replaced).count(),
            1
        );
    }
}

// ---- Beyond the basics ----

#[test]
fn timestamp_precondition_guards_replace() {
    let tree = tree_with_db();
    let created = tree
        .put_document(&path("/db/doc"), json!({"v": 1}), "u", None)
        .unwrap();
    let stamp = created.representation.meta.last_modified_at;

    let err = tree
        .put_document(&path("/db/doc"), json!({"v": 2}), "u", Some(stamp + 1))
        .unwrap_err();
    assert!(matches!(err, TreeError::PreconditionFailed { .. }));

    let replaced = tree
        .put_document(&path("/db/doc"), json!({"v": 2}), "u", Some(stamp))
        .unwrap();
    assert_eq!(replaced.outcome, PutOutcome::Replaced);
}

#[test]
fn nested_interval_listing() {
    let tree = tree_with_db();
    tree.put_document(&path("/db/doc"), json!({}), "u", None).unwrap();
    tree.put_collection(&path("/db/doc/msgs"), "u").unwrap();
    for name in ["m1", "m2", "m3", "m4"] {
        tree.put_document(&path(&format!("/db/doc/msgs/{name}")), json!({"n": name}), "u", None)
            .unwrap();
    }

    let listed = tree
        .list_documents(&path("/db/doc/msgs"), Some("m2"), Some("m3"))
        .unwrap();
    let paths: Vec<&str> = listed.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["/doc/msgs/m2", "/doc/msgs/m3"]);
}
