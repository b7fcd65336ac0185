//! Subcommand implementations

use anyhow::{Context, Result};
use indexmap::IndexSet;
use lsp_types::CompletionItem;
use sqlyard_core::{ConnectionId, PendingChange};
use sqlyard_services::WorkspaceState;
use std::path::Path;

use crate::output::{self, InvalidChange};

pub async fn tables(state: &WorkspaceState, connection_id: &ConnectionId) -> Result<bool> {
    let tables = state.tables(connection_id).await;
    if tables.is_empty() {
        println!("No tables");
    } else {
        let default_schema = &state.settings().completion.default_schema;
        println!("{}", output::tables_table(&tables, default_schema));
    }
    Ok(true)
}

pub async fn complete(
    state: &WorkspaceState,
    connection_id: &ConnectionId,
    text: &str,
    lsp: bool,
) -> Result<bool> {
    let candidates = state.completions(connection_id, text).await;
    tracing::debug!(count = candidates.len(), "completion candidates resolved");

    if lsp {
        let items: Vec<CompletionItem> = candidates.into_iter().map(Into::into).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        println!("{}", output::completions_table(&candidates));
    }
    Ok(true)
}

pub fn read_changes(path: &Path) -> Result<Vec<PendingChange>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read changes from {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse changes in {:?}", path))
}

/// Stage every change of the file, then commit. Returns false when any
/// change was rejected or failed.
pub async fn apply(
    state: &WorkspaceState,
    connection_id: &ConnectionId,
    path: &Path,
) -> Result<bool> {
    let changes = read_changes(path)?;

    let table_names: IndexSet<String> = changes.iter().map(|c| c.table_name.clone()).collect();
    for table in &table_names {
        if let Err(error) = state.refresh_schema(connection_id, table).await {
            tracing::warn!(table = %table, error = %error, "could not load schema, changes stage unvalidated");
        }
    }

    let mut invalid = Vec::new();
    for change in changes {
        let table_name = change.table_name.clone();
        let kind = change.kind;
        if let Err(error) = state.stage_validated(connection_id, change) {
            invalid.push(InvalidChange {
                table_name,
                kind,
                message: error.to_string(),
            });
        }
    }

    let summary = state.ledger(connection_id).read().summary();
    println!(
        "Staged {} changes ({} inserts, {} updates, {} deletes)",
        summary.total, summary.inserts, summary.updates, summary.deletes
    );

    let report = state.commit(connection_id).await;
    println!("{}", output::summary_line(&report, invalid.len()));
    if !invalid.is_empty() || !report.failures.is_empty() {
        println!("{}", output::failures_table(&report, &invalid));
    }

    Ok(invalid.is_empty() && report.is_success())
}
