//! End-to-end session protocol tests through the dispatch entry point,
//! the way a transport would drive the registry.

use memkv_engine::{with_transaction, Database};
use memkv_wire::api::{FetchResponse, GetResponse, StatusResponse};
use memkv_wire::SessionRegistry;
use std::sync::Arc;

fn seeded_registry() -> SessionRegistry {
    let db = Database::new();
    with_transaction(&db, |tx| {
        for (key, value) in [("a", "1"), ("b", "2"), ("c", "3")] {
            tx.set(key, value.as_bytes())?;
        }
        Ok(())
    })
    .unwrap();
    SessionRegistry::new(db)
}

fn ok(reg: &SessionRegistry, path: &str, body: &str) {
    let resp: StatusResponse = serde_json::from_str(&reg.dispatch(path, body)).unwrap();
    assert!(resp.is_ok(), "{path}: {}", resp.error);
}

fn fetch(reg: &SessionRegistry, iterator: &str, advance: bool) -> FetchResponse {
    let body = format!(r#"{{"iterator":"{iterator}","advance":{advance}}}"#);
    serde_json::from_str(&reg.dispatch("/it/fetch", &body)).unwrap()
}

#[test]
fn snapshot_iterator_walk_to_eof() {
    let reg = seeded_registry();
    ok(&reg, "/new-snapshot", r#"{"name":"s1"}"#);
    ok(
        &reg,
        "/snap/ascend",
        r#"{"snapshot":"s1","begin":"","end":"","name":"walk"}"#,
    );

    let mut keys = Vec::new();
    let mut resp = fetch(&reg, "walk", false);
    while resp.error.is_empty() {
        keys.push(resp.key.clone());
        resp = fetch(&reg, "walk", true);
    }
    assert_eq!(resp.error, "EOF");
    assert_eq!(keys, vec!["a", "b", "c"]);

    // Draining past the end keeps answering EOF.
    assert_eq!(fetch(&reg, "walk", true).error, "EOF");

    ok(&reg, "/snap/discard", r#"{"snapshot":"s1"}"#);
}

#[test]
fn descend_iterator_reverses() {
    let reg = seeded_registry();
    ok(&reg, "/new-snapshot", r#"{"name":"s1"}"#);
    ok(
        &reg,
        "/snap/descend",
        r#"{"snapshot":"s1","begin":"a","end":"c","name":"rev"}"#,
    );

    let mut keys = Vec::new();
    let mut resp = fetch(&reg, "rev", false);
    while resp.error.is_empty() {
        keys.push(resp.key.clone());
        resp = fetch(&reg, "rev", true);
    }
    assert_eq!(keys, vec!["b", "a"]);
}

#[test]
fn inverted_range_reports_err_invalid() {
    let reg = seeded_registry();
    ok(&reg, "/new-snapshot", r#"{"name":"s1"}"#);

    let raw = reg.dispatch(
        "/snap/ascend",
        r#"{"snapshot":"s1","begin":"z","end":"a","name":"bad"}"#,
    );
    let resp: StatusResponse = serde_json::from_str(&raw).unwrap();
    assert_eq!(resp.error, "ErrInvalid");
}

#[test]
fn missing_key_reports_err_not_exist() {
    let reg = seeded_registry();
    ok(&reg, "/new-snapshot", r#"{"name":"s1"}"#);

    let raw = reg.dispatch("/snap/get", r#"{"snapshot":"s1","key":"nope"}"#);
    let resp: GetResponse = serde_json::from_str(&raw).unwrap();
    assert_eq!(resp.error, "ErrNotExist");
}

#[test]
fn transaction_iterator_observes_private_writes() {
    let reg = seeded_registry();
    ok(&reg, "/new-transaction", r#"{"name":"t1"}"#);
    ok(
        &reg,
        "/tx/set",
        r#"{"transaction":"t1","key":"ab","value":[120]}"#,
    );
    ok(&reg, "/tx/delete", r#"{"transaction":"t1","key":"b"}"#);
    ok(
        &reg,
        "/tx/ascend",
        r#"{"transaction":"t1","begin":"","end":"","name":"mine"}"#,
    );

    let mut keys = Vec::new();
    let mut resp = fetch(&reg, "mine", false);
    while resp.error.is_empty() {
        keys.push(resp.key.clone());
        resp = fetch(&reg, "mine", true);
    }
    // "ab" (private write) appears, "b" (private tombstone) does not.
    assert_eq!(keys, vec!["a", "ab", "c"]);

    ok(&reg, "/tx/rollback", r#"{"transaction":"t1"}"#);
}

#[test]
fn two_sessions_commit_with_conflict_detection() {
    let reg = seeded_registry();
    ok(&reg, "/new-transaction", r#"{"name":"t1"}"#);
    ok(&reg, "/new-transaction", r#"{"name":"t2"}"#);

    for tx in ["t1", "t2"] {
        let raw = reg.dispatch("/tx/get", &format!(r#"{{"transaction":"{tx}","key":"a"}}"#));
        let resp: GetResponse = serde_json::from_str(&raw).unwrap();
        assert!(resp.error.is_empty());
    }

    ok(
        &reg,
        "/tx/set",
        r#"{"transaction":"t1","key":"a","value":[49,49]}"#,
    );
    ok(
        &reg,
        "/tx/set",
        r#"{"transaction":"t2","key":"a","value":[50,50]}"#,
    );

    ok(&reg, "/tx/commit", r#"{"transaction":"t1"}"#);
    let raw = reg.dispatch("/tx/commit", r#"{"transaction":"t2"}"#);
    let resp: StatusResponse = serde_json::from_str(&raw).unwrap();
    assert!(resp.error.contains("commit conflict"), "{}", resp.error);

    // Verify the winner through a fresh snapshot session.
    ok(&reg, "/new-snapshot", r#"{"name":"check"}"#);
    let raw = reg.dispatch("/snap/get", r#"{"snapshot":"check","key":"a"}"#);
    let resp: GetResponse = serde_json::from_str(&raw).unwrap();
    assert_eq!(resp.value, b"11".to_vec());
}

#[test]
fn snapshot_session_is_isolated_from_commits() {
    let reg = seeded_registry();
    ok(&reg, "/new-snapshot", r#"{"name":"old"}"#);

    // Commit an update through a transaction session.
    ok(&reg, "/new-transaction", r#"{"name":"w"}"#);
    ok(
        &reg,
        "/tx/set",
        r#"{"transaction":"w","key":"a","value":[57]}"#,
    );
    ok(&reg, "/tx/commit", r#"{"transaction":"w"}"#);

    let raw = reg.dispatch("/snap/get", r#"{"snapshot":"old","key":"a"}"#);
    let resp: GetResponse = serde_json::from_str(&raw).unwrap();
    assert_eq!(resp.value, b"1".to_vec());
}
