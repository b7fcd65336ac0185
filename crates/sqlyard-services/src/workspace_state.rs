//! Application-wide workspace state
//!
//! Created once by the shell on startup and handed to whatever needs it.
//! Owns the schema cache and one pending edit ledger per connection.

use parking_lot::RwLock;
use sqlyard_core::{
    ConnectionId, PendingChange, PrimaryKey, RemoteBackend, TableDescriptor, TableSchema, Value,
};
use sqlyard_lsp::{
    CachedSchemaLookup, CompletionCandidate, CompletionContext, CompletionResolver, TableDirectory,
};
use sqlyard_schema::{SchemaCache, SchemaLoader};
use sqlyard_settings::WorkspaceSettings;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

use crate::{
    BackendMutator, CommitCoordinator, CommitReport, PendingEditLedger, ServiceResult,
    StageOutcome, validate_change,
};

/// Table listing of one connection, kept for the schema cache TTL
struct CachedTables {
    tables: Arc<Vec<TableDescriptor>>,
    fetched_at: Instant,
}

pub struct WorkspaceState {
    settings: WorkspaceSettings,
    backend: Arc<dyn RemoteBackend>,
    schema_cache: Arc<SchemaCache>,
    loader: SchemaLoader,
    resolver: CompletionResolver,
    ledgers: RwLock<HashMap<ConnectionId, Arc<RwLock<PendingEditLedger>>>>,
    table_lists: RwLock<HashMap<ConnectionId, CachedTables>>,
}

impl WorkspaceState {
    pub fn new(settings: WorkspaceSettings, backend: Arc<dyn RemoteBackend>) -> Self {
        let schema_cache = Arc::new(SchemaCache::new(settings.schema_cache.ttl()));
        let loader = SchemaLoader::new(schema_cache.clone(), backend.clone());
        let resolver = CompletionResolver::new()
            .with_default_schema(settings.completion.default_schema.clone())
            .with_keywords(settings.completion.include_keywords);

        tracing::info!(
            ttl_secs = settings.schema_cache.ttl_secs,
            default_schema = %settings.completion.default_schema,
            "workspace state created"
        );

        Self {
            settings,
            backend,
            schema_cache,
            loader,
            resolver,
            ledgers: RwLock::new(HashMap::new()),
            table_lists: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &WorkspaceSettings {
        &self.settings
    }

    pub fn schema_cache(&self) -> &Arc<SchemaCache> {
        &self.schema_cache
    }

    pub fn loader(&self) -> &SchemaLoader {
        &self.loader
    }

    /// Completion candidates for the text before the cursor.
    ///
    /// Lists the connection's tables and warms the schemas of the tables the
    /// context refers to before resolving.
    pub async fn completions(
        &self,
        connection_id: &ConnectionId,
        text_before_cursor: &str,
    ) -> Vec<CompletionCandidate> {
        let tables = self.tables(connection_id).await;
        let context = self.resolver.analyze(text_before_cursor);

        let to_warm: Vec<String> = {
            let directory = TableDirectory::new(&tables)
                .with_default_schema(&self.settings.completion.default_schema);
            let references: Vec<&str> = match &context {
                CompletionContext::MemberAccess {
                    qualifier,
                    aliased_table,
                    ..
                } => std::iter::once(qualifier.as_str())
                    .chain(aliased_table.as_deref())
                    .collect(),
                CompletionContext::TablePosition { .. } => Vec::new(),
                CompletionContext::General {
                    referenced_tables, ..
                } => referenced_tables.iter().map(String::as_str).collect(),
            };
            references
                .into_iter()
                .filter_map(|reference| directory.resolve(reference))
                .map(|table| directory.display_name(table))
                .collect()
        };

        if !to_warm.is_empty() {
            self.loader.load_many(connection_id, &to_warm).await;
        }

        let lookup = CachedSchemaLookup::new(&self.schema_cache, connection_id);
        self.resolver.resolve_context(&context, &tables, &lookup)
    }

    /// Known tables of a connection.
    ///
    /// The listing is reused until the schema cache TTL lapses. An empty
    /// listing (possibly a failed one) is never kept.
    pub async fn tables(&self, connection_id: &ConnectionId) -> Arc<Vec<TableDescriptor>> {
        let ttl = self.schema_cache.ttl();
        let cached = self
            .table_lists
            .read()
            .get(connection_id)
            .filter(|cached| cached.fetched_at.elapsed() <= ttl)
            .map(|cached| cached.tables.clone());
        if let Some(tables) = cached {
            return tables;
        }

        let tables = Arc::new(self.loader.list_tables(connection_id).await);
        if !tables.is_empty() {
            self.table_lists.write().insert(
                connection_id.clone(),
                CachedTables {
                    tables: tables.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
        tables
    }

    /// Drop the cached table listing so the next lookup lists again
    pub fn invalidate_tables(&self, connection_id: &ConnectionId) {
        self.table_lists.write().remove(connection_id);
    }

    /// Fetch a table schema from the backend, bypassing and refreshing the cache
    pub async fn refresh_schema(
        &self,
        connection_id: &ConnectionId,
        table_name: &str,
    ) -> ServiceResult<TableSchema> {
        let schema = self
            .backend
            .fetch_table_schema(connection_id, table_name)
            .await?;
        self.schema_cache
            .put(connection_id, table_name, schema.clone());
        Ok(schema)
    }

    /// The ledger of a connection, created on first use
    pub fn ledger(&self, connection_id: &ConnectionId) -> Arc<RwLock<PendingEditLedger>> {
        if let Some(ledger) = self.ledgers.read().get(connection_id) {
            return ledger.clone();
        }
        self.ledgers
            .write()
            .entry(connection_id.clone())
            .or_default()
            .clone()
    }

    /// Stage a change after checking it against the cached schema.
    ///
    /// A cold cache skips validation.
    pub fn stage_validated(
        &self,
        connection_id: &ConnectionId,
        change: PendingChange,
    ) -> ServiceResult<StageOutcome> {
        match self.schema_cache.get(connection_id, &change.table_name) {
            Some(schema) => validate_change(&change, &schema)?,
            None => tracing::debug!(
                connection_id = %connection_id,
                table = %change.table_name,
                "no cached schema, staging without validation"
            ),
        }
        Ok(self.ledger(connection_id).write().stage(change))
    }

    /// Stage one grid cell edit, merged with earlier edits of the same row
    pub fn stage_cell_edit(
        &self,
        connection_id: &ConnectionId,
        table_name: &str,
        primary_key: PrimaryKey,
        column: &str,
        value: Value,
    ) -> ServiceResult<StageOutcome> {
        if let Some(schema) = self.schema_cache.get(connection_id, table_name) {
            let mut data = sqlyard_core::RowData::new();
            data.insert(column.to_string(), value.clone());
            let probe = PendingChange::update(table_name, primary_key.clone(), data);
            validate_change(&probe, &schema)?;
        }
        Ok(self
            .ledger(connection_id)
            .write()
            .stage_cell_edit(table_name, primary_key, column, value))
    }

    /// Commit the connection's ledger through the backend
    pub async fn commit(&self, connection_id: &ConnectionId) -> CommitReport {
        let mut coordinator = CommitCoordinator::new(self.ledger(connection_id));
        if let Some(timeout) = self.settings.commit.mutation_timeout() {
            coordinator = coordinator.with_mutation_timeout(timeout);
        }
        let mutator = BackendMutator::new(self.backend.clone(), connection_id.clone());
        coordinator.commit(&mutator).await
    }

    /// Forget everything about one connection
    pub fn disconnect(&self, connection_id: &ConnectionId) {
        self.schema_cache.clear(connection_id);
        self.invalidate_tables(connection_id);
        if let Some(ledger) = self.ledgers.write().remove(connection_id) {
            ledger.write().clear();
        }
        tracing::info!(connection_id = %connection_id, "connection state reset");
    }

    /// Forget everything
    pub fn reset(&self) {
        self.schema_cache.clear_all();
        self.table_lists.write().clear();
        let ledgers: Vec<_> = self.ledgers.write().drain().map(|(_, l)| l).collect();
        for ledger in ledgers {
            ledger.write().clear();
        }
        tracing::info!("workspace state reset");
    }
}
