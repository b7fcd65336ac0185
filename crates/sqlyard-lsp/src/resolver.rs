//! Completion candidate resolution

use std::collections::{HashMap, HashSet};

use sqlyard_core::{ColumnDescriptor, ConnectionId, DEFAULT_SCHEMA, TableDescriptor, TableSchema};
use sqlyard_schema::SchemaCache;

use crate::{
    CompletionCandidate, CompletionContext, ContextAnalyzer, HeuristicContextAnalyzer,
    SQL_KEYWORDS, TableDirectory,
};

/// Column source for resolved tables. A cold cache simply returns `None`.
pub trait SchemaLookup {
    fn columns(&self, table: &str) -> Option<Vec<ColumnDescriptor>>;
}

impl SchemaLookup for HashMap<String, TableSchema> {
    fn columns(&self, table: &str) -> Option<Vec<ColumnDescriptor>> {
        self.get(table).map(|schema| schema.columns.clone())
    }
}

/// `SchemaLookup` over one connection's entries in a `SchemaCache`
pub struct CachedSchemaLookup<'a> {
    cache: &'a SchemaCache,
    connection_id: &'a ConnectionId,
}

impl<'a> CachedSchemaLookup<'a> {
    pub fn new(cache: &'a SchemaCache, connection_id: &'a ConnectionId) -> Self {
        Self {
            cache,
            connection_id,
        }
    }
}

impl SchemaLookup for CachedSchemaLookup<'_> {
    fn columns(&self, table: &str) -> Option<Vec<ColumnDescriptor>> {
        self.cache
            .get(self.connection_id, table)
            .map(|schema| schema.columns)
    }
}

/// Produces completion candidates for the text before the cursor
pub struct CompletionResolver<A = HeuristicContextAnalyzer> {
    analyzer: A,
    default_schema: String,
    include_keywords: bool,
}

impl Default for CompletionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionResolver {
    pub fn new() -> Self {
        Self::with_analyzer(HeuristicContextAnalyzer::new())
    }
}

impl<A: ContextAnalyzer> CompletionResolver<A> {
    pub fn with_analyzer(analyzer: A) -> Self {
        Self {
            analyzer,
            default_schema: DEFAULT_SCHEMA.to_string(),
            include_keywords: true,
        }
    }

    pub fn with_default_schema(mut self, default_schema: impl Into<String>) -> Self {
        self.default_schema = default_schema.into();
        self
    }

    /// Whether the general context offers SQL keywords
    pub fn with_keywords(mut self, include_keywords: bool) -> Self {
        self.include_keywords = include_keywords;
        self
    }

    pub fn analyze(&self, text_before_cursor: &str) -> CompletionContext {
        self.analyzer.analyze(text_before_cursor)
    }

    /// Resolve candidates for the text before the cursor. Never fails: an
    /// unknown reference or a cold cache just contributes nothing.
    pub fn resolve(
        &self,
        text_before_cursor: &str,
        known_tables: &[TableDescriptor],
        lookup: &dyn SchemaLookup,
    ) -> Vec<CompletionCandidate> {
        let context = self.analyze(text_before_cursor);
        self.resolve_context(&context, known_tables, lookup)
    }

    pub fn resolve_context(
        &self,
        context: &CompletionContext,
        known_tables: &[TableDescriptor],
        lookup: &dyn SchemaLookup,
    ) -> Vec<CompletionCandidate> {
        let directory = TableDirectory::new(known_tables).with_default_schema(&self.default_schema);

        let candidates = match context {
            CompletionContext::MemberAccess {
                qualifier,
                aliased_table,
                ..
            } => self.member_candidates(&directory, qualifier, aliased_table.as_deref(), lookup),
            CompletionContext::TablePosition { .. } => table_candidates(&directory),
            CompletionContext::General {
                referenced_tables, ..
            } => self.general_candidates(&directory, referenced_tables, lookup),
        };

        tracing::debug!(count = candidates.len(), context = ?context, "resolved completions");
        candidates
    }

    fn member_candidates(
        &self,
        directory: &TableDirectory<'_>,
        qualifier: &str,
        aliased_table: Option<&str>,
        lookup: &dyn SchemaLookup,
    ) -> Vec<CompletionCandidate> {
        let table = directory
            .resolve(qualifier)
            .or_else(|| aliased_table.and_then(|t| directory.resolve(t)));

        let Some(table) = table else {
            tracing::debug!(qualifier = %qualifier, "unresolved member access qualifier");
            return Vec::new();
        };

        let display = directory.display_name(table);
        columns_for(directory, table, lookup)
            .into_iter()
            .map(|column| {
                CompletionCandidate::field(column.name.clone(), column_detail(&column))
                    .with_documentation(format!("{}.{}", display, column.name))
            })
            .collect()
    }

    fn general_candidates(
        &self,
        directory: &TableDirectory<'_>,
        referenced_tables: &[String],
        lookup: &dyn SchemaLookup,
    ) -> Vec<CompletionCandidate> {
        let mut candidates = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for reference in referenced_tables {
            let Some(table) = directory.resolve(reference) else {
                continue;
            };
            let display = directory.display_name(table);
            for column in columns_for(directory, table, lookup) {
                let qualified = format!("{}.{}", display, column.name);
                if seen.insert(qualified.to_lowercase()) {
                    candidates.push(
                        CompletionCandidate::field(column.name.clone(), qualified)
                            .with_documentation(column.data_type.clone()),
                    );
                }
            }
        }

        candidates.extend(table_candidates(directory));

        if self.include_keywords {
            candidates.extend(SQL_KEYWORDS.iter().map(|kw| CompletionCandidate::keyword(kw)));
        }
        candidates
    }
}

fn table_candidates(directory: &TableDirectory<'_>) -> Vec<CompletionCandidate> {
    directory
        .tables()
        .iter()
        .map(|table| {
            let detail = match &table.schema {
                Some(schema) => format!("{} in {}", table.table_type.label(), schema),
                None => table.table_type.label().to_string(),
            };
            CompletionCandidate::table(directory.display_name(table), detail)
        })
        .collect()
}

/// Columns of a resolved table: display name, then bare name (only when no
/// other known table shares it), then the schema-qualified name.
fn columns_for(
    directory: &TableDirectory<'_>,
    table: &TableDescriptor,
    lookup: &dyn SchemaLookup,
) -> Vec<ColumnDescriptor> {
    let display_name = directory.display_name(table);
    let mut keys = vec![display_name.clone()];
    if table.name != display_name && !directory.is_name_shared(table) {
        keys.push(table.name.clone());
    }
    let qualified = table.qualified_name();
    if !keys.contains(&qualified) {
        keys.push(qualified);
    }

    keys.iter()
        .find_map(|key| lookup.columns(key))
        .unwrap_or_else(|| {
            tracing::trace!(table = %display_name, "no cached columns");
            Vec::new()
        })
}

fn column_detail(column: &ColumnDescriptor) -> String {
    let mut detail = column.data_type.clone();
    if column.is_primary_key {
        detail.push_str(" PK");
    }
    detail.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
    detail
}
