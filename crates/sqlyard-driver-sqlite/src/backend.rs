//! SQLite `RemoteBackend` implementation

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rusqlite::{
    Connection as RusqliteConnection, ErrorCode, OptionalExtension, params_from_iter,
};
use sqlyard_core::{
    ColumnDescriptor, ConnectionId, MutationResult, PrimaryKey, RemoteBackend, Result, RowData,
    SqlyardError, TableDescriptor, TableSchema, TableType, unquote_identifier,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::statements::{delete_statement, insert_statement, update_statement};

type SharedConnection = Arc<Mutex<RusqliteConnection>>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Lock contention past the busy timeout surfaces as `Timeout`
fn statement_error(error: rusqlite::Error) -> SqlyardError {
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            SqlyardError::Timeout(format!("Database is locked: {}", error))
        }
        _ => SqlyardError::Query(format!("Failed to execute statement: {}", error)),
    }
}

/// SQLite databases keyed by connection id.
///
/// Each database sits behind its own mutex; calls run on the blocking pool.
#[derive(Default)]
pub struct SqliteBackend {
    connections: RwLock<HashMap<ConnectionId, SharedConnection>>,
}

impl SqliteBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or create) a database file and register it
    pub fn open(&self, connection_id: ConnectionId, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        tracing::info!(connection_id = %connection_id, path = %path.display(), "opening SQLite database");

        let conn = RusqliteConnection::open(path).map_err(|e| {
            SqlyardError::Connection(format!(
                "Failed to open SQLite database at '{}': {}",
                path.display(),
                e
            ))
        })?;
        self.register(connection_id, conn)
    }

    pub fn open_in_memory(&self, connection_id: ConnectionId) -> Result<()> {
        tracing::info!(connection_id = %connection_id, "opening in-memory SQLite database");
        let conn = RusqliteConnection::open_in_memory().map_err(|e| {
            SqlyardError::Connection(format!("Failed to open in-memory database: {}", e))
        })?;
        self.register(connection_id, conn)
    }

    /// Drop a registered database. Returns false when it was not open.
    pub fn close(&self, connection_id: &ConnectionId) -> bool {
        let closed = self.connections.write().remove(connection_id).is_some();
        if closed {
            tracing::info!(connection_id = %connection_id, "SQLite database closed");
        }
        closed
    }

    /// Run raw SQL (schema setup, seeding)
    pub async fn execute_batch(&self, connection_id: &ConnectionId, sql: &str) -> Result<()> {
        let sql = sql.to_string();
        self.with_connection(connection_id, move |conn| {
            conn.execute_batch(&sql)
                .map_err(|e| SqlyardError::Query(format!("Failed to execute batch: {}", e)))
        })
        .await
    }

    fn register(&self, connection_id: ConnectionId, conn: RusqliteConnection) -> Result<()> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| SqlyardError::Connection(format!("Failed to enable foreign keys: {}", e)))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| SqlyardError::Connection(format!("Failed to set busy timeout: {}", e)))?;
        self.connections
            .write()
            .insert(connection_id, Arc::new(Mutex::new(conn)));
        Ok(())
    }

    fn connection(&self, connection_id: &ConnectionId) -> Result<SharedConnection> {
        self.connections
            .read()
            .get(connection_id)
            .cloned()
            .ok_or_else(|| {
                SqlyardError::Connection(format!("Connection not open: {}", connection_id))
            })
    }

    async fn with_connection<T, F>(&self, connection_id: &ConnectionId, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&RusqliteConnection) -> Result<T> + Send + 'static,
    {
        let conn = self.connection(connection_id)?;
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| SqlyardError::Other(format!("SQLite task failed: {}", e)))?
    }

    /// Execute a mutation and map "no rows touched" to the `None` convention
    async fn mutate(
        &self,
        connection_id: &ConnectionId,
        statement: (String, Vec<rusqlite::types::Value>),
    ) -> Result<Option<MutationResult>> {
        let (sql, params) = statement;
        let affected = self
            .with_connection(connection_id, move |conn| {
                conn.execute(&sql, params_from_iter(params.iter()))
                    .map_err(statement_error)
            })
            .await?;

        tracing::debug!(connection_id = %connection_id, affected_rows = affected, "statement executed");
        if affected == 0 {
            return Ok(None);
        }
        Ok(Some(MutationResult::affected(affected as u64)))
    }
}

#[async_trait]
impl RemoteBackend for SqliteBackend {
    async fn fetch_table_schema(
        &self,
        connection_id: &ConnectionId,
        table_name: &str,
    ) -> Result<TableSchema> {
        let unquoted = unquote_identifier(table_name);
        // `main.users` and `users` name the same table
        let table = match unquoted.split_once('.') {
            Some((schema, rest)) if schema.eq_ignore_ascii_case("main") => rest.to_string(),
            _ => unquoted.clone(),
        };

        let (actual, columns) = self
            .with_connection(connection_id, move |conn| {
                let exists: Option<String> = conn
                    .query_row(
                        "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE",
                        [&table],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(|e| SqlyardError::Schema(e.to_string()))?;
                let Some(actual) = exists else {
                    return Err(SqlyardError::NotFound(format!("table {}", table)));
                };

                let mut stmt = conn
                    .prepare(r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?1)"#)
                    .map_err(|e| SqlyardError::Schema(e.to_string()))?;
                let rows = stmt
                    .query_map([&actual], |row| {
                        let name: String = row.get(0)?;
                        let data_type: String = row.get(1)?;
                        let not_null: bool = row.get(2)?;
                        let pk: i64 = row.get(3)?;
                        Ok(ColumnDescriptor {
                            name,
                            data_type: if data_type.is_empty() {
                                "DYNAMIC".to_string()
                            } else {
                                data_type
                            },
                            nullable: !not_null && pk == 0,
                            is_primary_key: pk > 0,
                        })
                    })
                    .map_err(|e| SqlyardError::Schema(e.to_string()))?;

                let columns = rows
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(|e| SqlyardError::Schema(e.to_string()))?;
                Ok((actual, columns))
            })
            .await?;

        tracing::debug!(
            connection_id = %connection_id,
            table = %actual,
            column_count = columns.len(),
            "fetched SQLite table schema"
        );
        Ok(TableSchema::new(actual, columns))
    }

    async fn list_tables(&self, connection_id: &ConnectionId) -> Result<Vec<TableDescriptor>> {
        tracing::debug!(connection_id = %connection_id, "listing tables from sqlite_master");
        self.with_connection(connection_id, |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT name, type FROM sqlite_master WHERE type IN ('table', 'view') AND substr(name, 1, 7) <> 'sqlite_' ORDER BY name",
                )
                .map_err(|e| SqlyardError::Query(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| {
                    let name: String = row.get(0)?;
                    let kind: String = row.get(1)?;
                    Ok(TableDescriptor::new(name).with_type(TableType::from_catalog(&kind)))
                })
                .map_err(|e| SqlyardError::Query(e.to_string()))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| SqlyardError::Query(e.to_string()))
        })
        .await
    }

    async fn apply_insert(
        &self,
        connection_id: &ConnectionId,
        table_name: &str,
        new_data: &RowData,
    ) -> Result<Option<MutationResult>> {
        self.mutate(connection_id, insert_statement(table_name, new_data))
            .await
    }

    async fn apply_update(
        &self,
        connection_id: &ConnectionId,
        table_name: &str,
        primary_key: &PrimaryKey,
        new_data: &RowData,
    ) -> Result<Option<MutationResult>> {
        self.mutate(
            connection_id,
            update_statement(table_name, primary_key, new_data)?,
        )
        .await
    }

    async fn apply_delete(
        &self,
        connection_id: &ConnectionId,
        table_name: &str,
        primary_key: &PrimaryKey,
    ) -> Result<Option<MutationResult>> {
        self.mutate(connection_id, delete_statement(table_name, primary_key)?)
            .await
    }
}
