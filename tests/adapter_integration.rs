//! Adapter integration tests.
//!
//! Drives [`GraphClient`] through the public [`Db`] contract against the
//! in-memory connector:
//! - Insert/read round trips and field projection
//! - Full-overwrite updates
//! - Idempotent deletes
//! - Ordered, bounded scans
//! - Shared connection reference counting under concurrency

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use graphkv::storage::InMemoryConnector;
use graphkv::{ConnectionSettings, Db, FieldSet, GraphClient, GraphContext, KEY_PROPERTY, Status};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

const TABLE: &str = "usertable";

fn context_with(connector: InMemoryConnector) -> Arc<GraphContext> {
    Arc::new(GraphContext::new(ConnectionSettings::default(), connector))
}

fn ready_client() -> (Arc<GraphContext>, GraphClient) {
    let context = context_with(InMemoryConnector::new());
    let mut client = context.client();
    client.init().expect("init should succeed");
    (context, client)
}

fn values(pairs: &[(&str, &str)]) -> FieldSet {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn field_names(names: &[&str]) -> HashSet<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

// ============================================================================
// Read / Insert
// ============================================================================

#[test]
fn test_insert_then_read_requested_fields() {
    let (_ctx, client) = ready_client();

    let record = values(&[("name", "alice"), ("city", "paris")]);
    assert_eq!(client.insert(TABLE, "user1", &record), Status::Ok);

    let mut result = FieldSet::new();
    let status = client.read(TABLE, "user1", Some(&field_names(&["name", "city"])), &mut result);

    assert_eq!(status, Status::Ok);
    assert_eq!(result, record);
}

#[test]
fn test_read_without_fields_returns_all_but_key() {
    let (_ctx, client) = ready_client();
    assert_eq!(client.insert(TABLE, "user1", &values(&[("name", "alice"), ("age", "30")])), Status::Ok);

    let mut result = FieldSet::new();
    assert_eq!(client.read(TABLE, "user1", None, &mut result), Status::Ok);

    assert_eq!(result, values(&[("name", "alice"), ("age", "30")]));
    assert!(!result.contains_key(KEY_PROPERTY));
}

#[test]
fn test_read_projection_skips_missing_fields() {
    let (_ctx, client) = ready_client();
    assert_eq!(client.insert(TABLE, "user1", &values(&[("name", "alice")])), Status::Ok);

    let mut result = FieldSet::new();
    let status = client.read(TABLE, "user1", Some(&field_names(&["name", "email"])), &mut result);

    assert_eq!(status, Status::Ok);
    assert_eq!(result, values(&[("name", "alice")]));
}

#[test]
fn test_read_missing_key_is_not_found() {
    let (_ctx, client) = ready_client();

    let mut result = FieldSet::new();
    assert_eq!(client.read(TABLE, "ghost", None, &mut result), Status::NotFound);
    assert!(result.is_empty());
}

#[test]
fn test_tables_are_isolated() {
    let (_ctx, client) = ready_client();
    assert_eq!(client.insert("orders", "k1", &values(&[("total", "10")])), Status::Ok);

    let mut result = FieldSet::new();
    assert_eq!(client.read(TABLE, "k1", None, &mut result), Status::NotFound);
}

#[test]
fn test_duplicate_insert_without_constraint_succeeds() {
    let (_ctx, client) = ready_client();

    assert_eq!(client.insert(TABLE, "user1", &values(&[("v", "1")])), Status::Ok);
    assert_eq!(client.insert(TABLE, "user1", &values(&[("v", "2")])), Status::Ok);

    let mut rows = Vec::new();
    assert_eq!(client.scan(TABLE, "user1", 10, None, &mut rows), Status::Ok);
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_duplicate_insert_with_constraint_is_error() {
    let context = context_with(InMemoryConnector::new().with_unique_keys());
    let mut client = context.client();
    client.init().expect("init");

    assert_eq!(client.insert(TABLE, "user1", &FieldSet::new()), Status::Ok);
    assert_eq!(client.insert(TABLE, "user1", &FieldSet::new()), Status::Error);
}

// ============================================================================
// Update / Delete
// ============================================================================

#[test]
fn test_update_overwrites_whole_record() {
    let (_ctx, client) = ready_client();
    assert_eq!(client.insert(TABLE, "user1", &values(&[("name", "alice"), ("city", "paris")])), Status::Ok);

    assert_eq!(client.update(TABLE, "user1", &values(&[("name", "bob")])), Status::Ok);

    let mut result = FieldSet::new();
    let status = client.read(TABLE, "user1", Some(&field_names(&["name", "city"])), &mut result);
    assert_eq!(status, Status::Ok);
    assert_eq!(result, values(&[("name", "bob")]));
}

#[test]
fn test_update_keeps_key_addressable() {
    let (_ctx, client) = ready_client();
    assert_eq!(client.insert(TABLE, "user1", &values(&[("name", "alice")])), Status::Ok);

    // A caller-supplied _key must not move the node.
    let status = client.update(TABLE, "user1", &values(&[(KEY_PROPERTY, "other"), ("name", "bob")]));
    assert_eq!(status, Status::Ok);

    let mut result = FieldSet::new();
    assert_eq!(client.read(TABLE, "user1", None, &mut result), Status::Ok);
    assert_eq!(result, values(&[("name", "bob")]));
}

#[test]
fn test_update_missing_key_is_ok() {
    let (_ctx, client) = ready_client();

    assert_eq!(client.update(TABLE, "ghost", &values(&[("a", "b")])), Status::Ok);

    let mut result = FieldSet::new();
    assert_eq!(client.read(TABLE, "ghost", None, &mut result), Status::NotFound);
}

#[test]
fn test_delete_is_idempotent() {
    let (_ctx, client) = ready_client();
    assert_eq!(client.insert(TABLE, "user1", &values(&[("name", "alice")])), Status::Ok);

    assert_eq!(client.delete(TABLE, "user1"), Status::Ok);
    assert_eq!(client.delete(TABLE, "user1"), Status::Ok);

    let mut result = FieldSet::new();
    assert_eq!(client.read(TABLE, "user1", None, &mut result), Status::NotFound);
    assert!(result.is_empty());
}

#[test]
fn test_usertable_walkthrough() {
    let (_ctx, client) = ready_client();

    assert_eq!(client.insert("usertable", "user1", &values(&[("name", "alice")])), Status::Ok);

    let mut result = FieldSet::new();
    let status = client.read("usertable", "user1", Some(&field_names(&["name"])), &mut result);
    assert_eq!(status, Status::Ok);
    assert_eq!(result, values(&[("name", "alice")]));

    assert_eq!(client.delete("usertable", "user1"), Status::Ok);

    let mut after = FieldSet::new();
    let status = client.read("usertable", "user1", Some(&field_names(&["name"])), &mut after);
    assert_ne!(status, Status::Ok);
    assert!(after.get("name").is_none());
}

// ============================================================================
// Scan
// ============================================================================

fn seed(client: &GraphClient, keys: &[&str]) {
    for key in keys {
        let status = client.insert(TABLE, key, &values(&[("id", key)]));
        assert_eq!(status, Status::Ok);
    }
}

#[test]
fn test_scan_is_ordered_and_bounded() {
    let (_ctx, client) = ready_client();
    seed(&client, &["user5", "user1", "user3", "user2", "user4"]);

    let mut rows = Vec::new();
    assert_eq!(client.scan(TABLE, "user2", 3, None, &mut rows), Status::Ok);

    let ids: Vec<&str> = rows.iter().map(|row| row["id"].as_str()).collect();
    assert_eq!(ids, vec!["user2", "user3", "user4"]);
}

#[test]
fn test_scan_past_end_is_empty() {
    let (_ctx, client) = ready_client();
    seed(&client, &["a", "b"]);

    let mut rows = Vec::new();
    assert_eq!(client.scan(TABLE, "z", 10, None, &mut rows), Status::Ok);
    assert!(rows.is_empty());
}

#[test]
fn test_scan_projects_fields() {
    let (_ctx, client) = ready_client();
    assert_eq!(client.insert(TABLE, "k1", &values(&[("a", "1"), ("b", "2")])), Status::Ok);

    let mut rows = Vec::new();
    let status = client.scan(TABLE, "k", 5, Some(&field_names(&["b"])), &mut rows);
    assert_eq!(status, Status::Ok);
    assert_eq!(rows, vec![values(&[("b", "2")])]);
}

#[test]
fn test_repeated_scans_agree() {
    let (_ctx, client) = ready_client();
    seed(&client, &["k3", "k1", "k2"]);

    let mut first = Vec::new();
    let mut second = Vec::new();
    assert_eq!(client.scan(TABLE, "k1", 10, None, &mut first), Status::Ok);
    assert_eq!(client.scan(TABLE, "k1", 10, None, &mut second), Status::Ok);
    assert_eq!(first, second);
}

// ============================================================================
// Validation and lifecycle
// ============================================================================

#[test]
fn test_injection_table_is_rejected_before_query() {
    let (_ctx, client) = ready_client();
    assert_eq!(client.insert(TABLE, "user1", &values(&[("name", "alice")])), Status::Ok);

    let hostile = "usertable`) DETACH DELETE n //";
    assert_eq!(client.delete(hostile, "user1"), Status::BadRequest);

    let mut result = FieldSet::new();
    assert_eq!(client.read(TABLE, "user1", None, &mut result), Status::Ok);
}

#[test]
fn test_operations_after_cleanup_fail() {
    let (_ctx, mut client) = ready_client();
    client.cleanup().expect("cleanup");

    assert_eq!(client.insert(TABLE, "user1", &FieldSet::new()), Status::Error);
}

#[test]
fn test_clients_share_data_through_context() {
    let context = context_with(InMemoryConnector::new());
    let mut writer = context.client();
    let mut reader = context.client();
    writer.init().expect("init writer");
    reader.init().expect("init reader");

    assert_eq!(writer.insert(TABLE, "user1", &values(&[("name", "alice")])), Status::Ok);

    let mut result = FieldSet::new();
    assert_eq!(reader.read(TABLE, "user1", None, &mut result), Status::Ok);
    assert_eq!(result, values(&[("name", "alice")]));
}

#[test]
fn test_concurrent_init_and_cleanup_connect_once() {
    const WORKERS: usize = 16;

    let connector = InMemoryConnector::new();
    let stats = connector.stats();
    let context = context_with(connector);

    let init_barrier = Arc::new(Barrier::new(WORKERS));
    let cleanup_barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let mut client = context.client();
            let init_barrier = Arc::clone(&init_barrier);
            let cleanup_barrier = Arc::clone(&cleanup_barrier);
            thread::spawn(move || {
                init_barrier.wait();
                client.init().expect("init");

                let key = format!("user{worker}");
                assert_eq!(client.insert(TABLE, &key, &FieldSet::new()), Status::Ok);

                cleanup_barrier.wait();
                client.cleanup().expect("cleanup");
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    assert_eq!(stats.opened(), 1);
    assert_eq!(stats.closed(), 1);
    assert_eq!(context.active_users(), 0);
    assert!(!context.is_connected());
}

#[test]
fn test_unreachable_database_fails_init() {
    let context = context_with(InMemoryConnector::unreachable());
    let mut client = context.client();

    assert!(client.init().is_err());
    assert!(!client.is_initialized());

    let mut result = FieldSet::new();
    assert_eq!(client.read(TABLE, "user1", None, &mut result), Status::Error);
}
