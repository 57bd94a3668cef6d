//! Integration tests for loading fixture trees from disk.

use std::fs;

use comply_core::{FixtureError, load_fixtures};
use tempfile::TempDir;

fn write(dir: &TempDir, rel: &str, contents: &str) {
    let path = dir.path().join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn test_loads_tree_recursively_in_sorted_order() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "v1/node/version.json",
        r#"{"method": "GET", "route": "/eth/v1/node/version"}"#,
    );
    write(
        &dir,
        "v1/beacon/states/fork.json",
        r#"{"method": "GET", "route": "/eth/v1/beacon/states/head/fork", "awaitSlot": 2}"#,
    );
    write(
        &dir,
        "v1/beacon/genesis.json",
        r#"{"Method": "GET", "Route": "/eth/v1/beacon/genesis", "ExpectedRespStatus": 200}"#,
    );

    let cases = load_fixtures(dir.path()).unwrap();
    let routes: Vec<&str> = cases.iter().map(|c| c.spec.route.as_str()).collect();
    assert_eq!(
        routes,
        vec![
            "/eth/v1/beacon/genesis",
            "/eth/v1/beacon/states/head/fork",
            "/eth/v1/node/version",
        ]
    );
    assert_eq!(cases[0].spec.expected_status(), Some(200));
    assert_eq!(cases[1].spec.await_slot(), Some(2));
    assert!(cases[2].path.ends_with("v1/node/version.json"));
}

#[test]
fn test_malformed_fixture_fails_whole_load() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "a/good.json",
        r#"{"method": "GET", "route": "/eth/v1/node/version"}"#,
    );
    write(&dir, "b/bad.json", r#"{"method": "GET", "route": "#);

    let err = load_fixtures(dir.path()).unwrap_err();
    match &err {
        FixtureError::Parse { path, .. } => assert!(path.ends_with("b/bad.json")),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("bad.json"));
}

#[test]
fn test_non_fixture_file_fails_load() {
    let dir = TempDir::new().unwrap();
    write(&dir, "README.md", "# fixtures\n");

    let err = load_fixtures(dir.path()).unwrap_err();
    assert!(matches!(err, FixtureError::Parse { .. }));
}

#[test]
fn test_missing_root_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_fixtures(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, FixtureError::Io { .. }));
}

#[test]
fn test_empty_tree_loads_nothing() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("empty/nested")).unwrap();
    assert!(load_fixtures(dir.path()).unwrap().is_empty());
}
