//! Fetch-through schema loading

use std::sync::Arc;

use sqlyard_core::{ConnectionId, RemoteBackend, TableDescriptor, TableSchema};

use crate::SchemaCache;

/// Reads schemas through the cache, filling misses from the backend.
///
/// Backend failures are logged and degrade to "no schema"; they never
/// surface as errors.
#[derive(Clone)]
pub struct SchemaLoader {
    cache: Arc<SchemaCache>,
    backend: Arc<dyn RemoteBackend>,
}

impl SchemaLoader {
    pub fn new(cache: Arc<SchemaCache>, backend: Arc<dyn RemoteBackend>) -> Self {
        Self { cache, backend }
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// Cached schema if fresh, otherwise fetch and cache it
    pub async fn load(&self, connection_id: &ConnectionId, table_name: &str) -> Option<TableSchema> {
        if let Some(schema) = self.cache.get(connection_id, table_name) {
            return Some(schema);
        }

        let stale = self.cache.is_expired(connection_id, table_name);
        tracing::debug!(
            connection_id = %connection_id,
            table = %table_name,
            stale,
            "fetching table schema"
        );

        match self.backend.fetch_table_schema(connection_id, table_name).await {
            Ok(schema) => {
                self.cache.put(connection_id, table_name, schema.clone());
                Some(schema)
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    table = %table_name,
                    error = %e,
                    "failed to fetch table schema"
                );
                None
            }
        }
    }

    /// Warm several tables one after another. Returns how many are now cached.
    pub async fn load_many<I, S>(&self, connection_id: &ConnectionId, tables: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut loaded = 0;
        for table in tables {
            if self.load(connection_id, table.as_ref()).await.is_some() {
                loaded += 1;
            }
        }
        loaded
    }

    /// Table directory of a connection, empty when the backend call fails
    pub async fn list_tables(&self, connection_id: &ConnectionId) -> Vec<TableDescriptor> {
        match self.backend.list_tables(connection_id).await {
            Ok(tables) => {
                tracing::debug!(connection_id = %connection_id, table_count = tables.len(), "listed tables");
                tables
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "failed to list tables");
                Vec::new()
            }
        }
    }
}
