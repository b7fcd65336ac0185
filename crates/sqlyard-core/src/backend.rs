//! Remote backend boundary

use async_trait::async_trait;

use crate::{
    ConnectionId, MutationResult, PrimaryKey, Result, RowData, TableDescriptor, TableSchema,
};

/// Request/response interface to the database backend.
///
/// Row mutations follow the backend's convention: `Ok(None)` means the
/// backend rejected the change, `Err(_)` means the call itself failed.
/// Callers treat both as a failed mutation.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Fetch the column metadata of one table
    async fn fetch_table_schema(
        &self,
        connection_id: &ConnectionId,
        table_name: &str,
    ) -> Result<TableSchema>;

    /// List the tables and views visible on a connection
    async fn list_tables(&self, connection_id: &ConnectionId) -> Result<Vec<TableDescriptor>>;

    async fn apply_insert(
        &self,
        connection_id: &ConnectionId,
        table_name: &str,
        new_data: &RowData,
    ) -> Result<Option<MutationResult>>;

    async fn apply_update(
        &self,
        connection_id: &ConnectionId,
        table_name: &str,
        primary_key: &PrimaryKey,
        new_data: &RowData,
    ) -> Result<Option<MutationResult>>;

    async fn apply_delete(
        &self,
        connection_id: &ConnectionId,
        table_name: &str,
        primary_key: &PrimaryKey,
    ) -> Result<Option<MutationResult>>;
}
