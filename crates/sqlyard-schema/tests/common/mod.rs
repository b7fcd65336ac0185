//! Shared test utilities

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlyard_core::{
    ConnectionId, MutationResult, PrimaryKey, Result, RemoteBackend, RowData, SqlyardError,
    TableDescriptor, TableSchema,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Backend serving fixed schemas and counting fetches
#[derive(Clone, Default)]
pub struct MockBackend {
    schemas: HashMap<String, TableSchema>,
    tables: Vec<TableDescriptor>,
    fail_listing: bool,
    pub fetch_log: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: TableSchema) -> Self {
        self.tables.push(TableDescriptor::new(schema.table.clone()));
        self.schemas.insert(schema.table.clone(), schema);
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_log.lock().len()
    }
}

#[async_trait]
impl RemoteBackend for MockBackend {
    async fn fetch_table_schema(
        &self,
        _connection_id: &ConnectionId,
        table_name: &str,
    ) -> Result<TableSchema> {
        self.fetch_log.lock().push(table_name.to_string());
        self.schemas
            .get(table_name)
            .cloned()
            .ok_or_else(|| SqlyardError::NotFound(format!("table {}", table_name)))
    }

    async fn list_tables(&self, _connection_id: &ConnectionId) -> Result<Vec<TableDescriptor>> {
        if self.fail_listing {
            return Err(SqlyardError::Connection("backend unavailable".into()));
        }
        Ok(self.tables.clone())
    }

    async fn apply_insert(
        &self,
        _connection_id: &ConnectionId,
        _table_name: &str,
        _new_data: &RowData,
    ) -> Result<Option<MutationResult>> {
        Ok(None)
    }

    async fn apply_update(
        &self,
        _connection_id: &ConnectionId,
        _table_name: &str,
        _primary_key: &PrimaryKey,
        _new_data: &RowData,
    ) -> Result<Option<MutationResult>> {
        Ok(None)
    }

    async fn apply_delete(
        &self,
        _connection_id: &ConnectionId,
        _table_name: &str,
        _primary_key: &PrimaryKey,
    ) -> Result<Option<MutationResult>> {
        Ok(None)
    }
}
