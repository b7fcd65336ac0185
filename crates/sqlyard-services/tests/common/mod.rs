//! Common test utilities and mocks

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlyard_core::{
    CanonicalKey, ColumnDescriptor, ConnectionId, MutationResult, PrimaryKey, RemoteBackend,
    Result, RowData, SqlyardError, TableDescriptor, TableSchema,
};
use std::collections::HashMap;
use std::sync::Arc;

/// How the mock answers a mutation for a given row
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// `Ok(None)`
    Reject,
    /// `Err(_)`
    Fail(String),
    /// Never answers
    Hang,
}

/// Mock backend for testing service-layer logic without a real database.
///
/// Mutations succeed unless an outcome is registered for the row's canonical
/// key. Every mutation is logged as `"<kind> <key>"`.
#[derive(Clone, Default)]
pub struct MockBackend {
    schemas: HashMap<String, TableSchema>,
    tables: Vec<TableDescriptor>,
    outcomes: HashMap<String, MockOutcome>,
    pub schema_fetches: Arc<Mutex<usize>>,
    pub table_listings: Arc<Mutex<usize>>,
    pub mutation_log: Arc<Mutex<Vec<String>>>,
    pub applied_data: Arc<Mutex<Vec<RowData>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableDescriptor, schema: TableSchema) -> Self {
        self.schemas.insert(table.display_name(), schema);
        self.tables.push(table);
        self
    }

    /// Register a non-successful outcome for `table` + primary key
    pub fn with_outcome(mut self, table: &str, primary_key: &PrimaryKey, outcome: MockOutcome) -> Self {
        self.outcomes.insert(
            CanonicalKey::for_row(table, primary_key).to_string(),
            outcome,
        );
        self
    }

    pub fn mutation_log(&self) -> Vec<String> {
        self.mutation_log.lock().clone()
    }

    pub fn schema_fetches(&self) -> usize {
        *self.schema_fetches.lock()
    }

    pub fn table_listings(&self) -> usize {
        *self.table_listings.lock()
    }

    async fn mutate(
        &self,
        kind: &str,
        table_name: &str,
        primary_key: &PrimaryKey,
        data: Option<&RowData>,
    ) -> Result<Option<MutationResult>> {
        let key = CanonicalKey::for_row(table_name, primary_key).to_string();
        self.mutation_log.lock().push(format!("{} {}", kind, key));

        match self.outcomes.get(&key) {
            Some(MockOutcome::Reject) => Ok(None),
            Some(MockOutcome::Fail(message)) => Err(SqlyardError::Query(message.clone())),
            Some(MockOutcome::Hang) => {
                std::future::pending::<()>().await;
                Ok(None)
            }
            None => {
                if let Some(data) = data {
                    self.applied_data.lock().push(data.clone());
                }
                Ok(Some(MutationResult::affected(1)))
            }
        }
    }
}

#[async_trait]
impl RemoteBackend for MockBackend {
    async fn fetch_table_schema(
        &self,
        _connection_id: &ConnectionId,
        table_name: &str,
    ) -> Result<TableSchema> {
        *self.schema_fetches.lock() += 1;
        self.schemas
            .get(table_name)
            .cloned()
            .ok_or_else(|| SqlyardError::NotFound(format!("table {}", table_name)))
    }

    async fn list_tables(&self, _connection_id: &ConnectionId) -> Result<Vec<TableDescriptor>> {
        *self.table_listings.lock() += 1;
        Ok(self.tables.clone())
    }

    async fn apply_insert(
        &self,
        _connection_id: &ConnectionId,
        table_name: &str,
        new_data: &RowData,
    ) -> Result<Option<MutationResult>> {
        self.mutate("insert", table_name, &PrimaryKey::new(), Some(new_data))
            .await
    }

    async fn apply_update(
        &self,
        _connection_id: &ConnectionId,
        table_name: &str,
        primary_key: &PrimaryKey,
        new_data: &RowData,
    ) -> Result<Option<MutationResult>> {
        self.mutate("update", table_name, primary_key, Some(new_data))
            .await
    }

    async fn apply_delete(
        &self,
        _connection_id: &ConnectionId,
        table_name: &str,
        primary_key: &PrimaryKey,
    ) -> Result<Option<MutationResult>> {
        self.mutate("delete", table_name, primary_key, None).await
    }
}

/// `users(id PK, name NULL)`
pub fn users_table() -> (TableDescriptor, TableSchema) {
    (
        TableDescriptor::new("users").with_schema("public"),
        TableSchema::new(
            "users",
            vec![
                ColumnDescriptor::new("id", "integer").primary_key(),
                ColumnDescriptor::new("name", "text"),
            ],
        )
        .with_schema("public"),
    )
}
