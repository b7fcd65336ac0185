//! Schema cache with lazy time-based expiry

use parking_lot::RwLock;
use sqlyard_core::{ConnectionId, TableSchema};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Default lifetime of a cached table schema (15 minutes)
pub const DEFAULT_SCHEMA_TTL: Duration = Duration::from_secs(15 * 60);

/// Cached schema with the time it was fetched
#[derive(Debug, Clone)]
struct CachedTableSchema {
    schema: TableSchema,
    fetched_at: Instant,
}

impl CachedTableSchema {
    fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            fetched_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() > ttl
    }
}

/// Snapshot of cache occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaCacheStats {
    pub connections: usize,
    pub entries: usize,
    pub expired: usize,
}

/// Table schemas per connection.
///
/// Expiry is checked when an entry is read. Stale entries stay in the map
/// until they are overwritten by `put` or evicted by `clear`/`clear_all`.
pub struct SchemaCache {
    /// Entries per connection, keyed by table name exactly as stored
    cache: RwLock<HashMap<ConnectionId, HashMap<String, CachedTableSchema>>>,

    ttl: Duration,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_TTL)
    }
}

impl SchemaCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a schema, replacing any previous entry for the table
    pub fn put(&self, connection_id: &ConnectionId, table_name: &str, schema: TableSchema) {
        tracing::debug!(
            connection_id = %connection_id,
            table = %table_name,
            column_count = schema.columns.len(),
            "caching table schema"
        );
        self.cache
            .write()
            .entry(connection_id.clone())
            .or_default()
            .insert(table_name.to_string(), CachedTableSchema::new(schema));
    }

    /// Get a schema unless it is missing or older than the TTL
    pub fn get(&self, connection_id: &ConnectionId, table_name: &str) -> Option<TableSchema> {
        let cache = self.cache.read();
        let entry = cache
            .get(connection_id)
            .and_then(|tables| tables.get(table_name));

        match entry {
            Some(cached) if !cached.is_expired(self.ttl) => {
                tracing::debug!(connection_id = %connection_id, table = %table_name, "cache hit for table schema");
                Some(cached.schema.clone())
            }
            Some(_) => {
                tracing::debug!(connection_id = %connection_id, table = %table_name, "cached table schema expired");
                None
            }
            None => {
                tracing::debug!(connection_id = %connection_id, table = %table_name, "cache miss for table schema");
                None
            }
        }
    }

    /// Every non-expired schema of a connection, keyed by table name
    pub fn get_all(&self, connection_id: &ConnectionId) -> HashMap<String, TableSchema> {
        let cache = self.cache.read();
        cache
            .get(connection_id)
            .map(|tables| {
                tables
                    .iter()
                    .filter(|(_, cached)| !cached.is_expired(self.ttl))
                    .map(|(name, cached)| (name.clone(), cached.schema.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when the table has an entry that has outlived the TTL.
    ///
    /// A table that was never cached is not expired, so callers can tell
    /// "unknown" apart from "known but stale".
    pub fn is_expired(&self, connection_id: &ConnectionId, table_name: &str) -> bool {
        tracing::trace!(connection_id = %connection_id, table = %table_name, "checking schema expiry");
        self.cache
            .read()
            .get(connection_id)
            .and_then(|tables| tables.get(table_name))
            .is_some_and(|cached| cached.is_expired(self.ttl))
    }

    /// Evict every entry of one connection
    pub fn clear(&self, connection_id: &ConnectionId) {
        let removed = self.cache.write().remove(connection_id);
        tracing::info!(
            connection_id = %connection_id,
            entries = removed.map(|tables| tables.len()).unwrap_or(0),
            "schema cache cleared for connection"
        );
    }

    /// Evict everything
    pub fn clear_all(&self) {
        self.cache.write().clear();
        tracing::info!("schema cache cleared");
    }

    /// Number of stored entries, stale ones included
    pub fn entry_count(&self) -> usize {
        self.cache.read().values().map(HashMap::len).sum()
    }

    pub fn stats(&self) -> SchemaCacheStats {
        let cache = self.cache.read();
        let mut stats = SchemaCacheStats {
            connections: cache.len(),
            ..Default::default()
        };
        for cached in cache.values().flat_map(HashMap::values) {
            stats.entries += 1;
            if cached.is_expired(self.ttl) {
                stats.expired += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
