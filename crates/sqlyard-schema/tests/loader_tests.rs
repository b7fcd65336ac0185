//! Integration tests for fetch-through schema loading

mod common;

use common::MockBackend;
use pretty_assertions::assert_eq;
use sqlyard_core::{ColumnDescriptor, ConnectionId, TableSchema};
use sqlyard_schema::{SchemaCache, SchemaLoader};
use std::sync::Arc;
use std::time::Duration;

fn users_schema() -> TableSchema {
    TableSchema::new(
        "users",
        vec![
            ColumnDescriptor::new("id", "integer").primary_key(),
            ColumnDescriptor::new("name", "text"),
        ],
    )
}

fn loader(backend: &MockBackend, ttl: Duration) -> SchemaLoader {
    SchemaLoader::new(Arc::new(SchemaCache::new(ttl)), Arc::new(backend.clone()))
}

#[tokio::test(start_paused = true)]
async fn test_load_fetches_once_then_hits_cache() {
    let backend = MockBackend::new().with_schema(users_schema());
    let loader = loader(&backend, Duration::from_secs(60));
    let conn = ConnectionId::from("c1");

    assert_eq!(loader.load(&conn, "users").await, Some(users_schema()));
    assert_eq!(loader.load(&conn, "users").await, Some(users_schema()));
    assert_eq!(backend.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_entry_triggers_refetch() {
    let backend = MockBackend::new().with_schema(users_schema());
    let loader = loader(&backend, Duration::from_secs(60));
    let conn = ConnectionId::from("c1");

    loader.load(&conn, "users").await;
    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(loader.cache().is_expired(&conn, "users"));

    assert!(loader.load(&conn, "users").await.is_some());
    assert_eq!(backend.fetch_count(), 2);
    assert!(!loader.cache().is_expired(&conn, "users"));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_degrades_to_none() {
    let backend = MockBackend::new();
    let loader = loader(&backend, Duration::from_secs(60));
    let conn = ConnectionId::from("c1");

    assert_eq!(loader.load(&conn, "missing").await, None);
    assert_eq!(loader.cache().entry_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_load_many_counts_cached_tables() {
    let backend = MockBackend::new().with_schema(users_schema());
    let loader = loader(&backend, Duration::from_secs(60));
    let conn = ConnectionId::from("c1");

    let loaded = loader.load_many(&conn, ["users", "missing"]).await;
    assert_eq!(loaded, 1);
    assert_eq!(*backend.fetch_log.lock(), vec!["users", "missing"]);
}

#[tokio::test]
async fn test_list_tables_failure_is_empty() {
    let backend = MockBackend::new()
        .with_schema(users_schema())
        .with_failing_listing();
    let loader = loader(&backend, Duration::from_secs(60));

    assert!(loader.list_tables(&ConnectionId::from("c1")).await.is_empty());
}
