//! Terminal tables for command output

use comfy_table::{Table, presets::UTF8_FULL};
use sqlyard_core::{ChangeKind, TableDescriptor};
use sqlyard_lsp::{CompletionCandidate, CompletionKind};
use sqlyard_services::CommitReport;

/// A change that never reached the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChange {
    pub table_name: String,
    pub kind: ChangeKind,
    pub message: String,
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header.to_vec());
    table
}

/// Tables in `default_schema` are listed by bare name
pub fn tables_table(tables: &[TableDescriptor], default_schema: &str) -> Table {
    let mut table = new_table(&["Name", "Type", "Schema"]);
    for descriptor in tables {
        table.add_row(vec![
            descriptor.display_name_in(default_schema),
            descriptor.table_type.label().to_string(),
            descriptor.schema.clone().unwrap_or_default(),
        ]);
    }
    table
}

pub fn completions_table(candidates: &[CompletionCandidate]) -> Table {
    let mut table = new_table(&["Label", "Kind", "Detail"]);
    for candidate in candidates {
        let kind = match candidate.kind {
            CompletionKind::Field => "column",
            CompletionKind::Table => "table",
            CompletionKind::Keyword => "keyword",
        };
        table.add_row(vec![
            candidate.label.clone(),
            kind.to_string(),
            candidate.detail.clone().unwrap_or_default(),
        ]);
    }
    table
}

/// One row per change that did not apply, validation rejects first
pub fn failures_table(report: &CommitReport, invalid: &[InvalidChange]) -> Table {
    let mut table = new_table(&["Table", "Change", "Key", "Reason"]);
    for change in invalid {
        table.add_row(vec![
            change.table_name.clone(),
            change.kind.to_string(),
            String::new(),
            change.message.clone(),
        ]);
    }
    for failure in &report.failures {
        table.add_row(vec![
            failure.table_name.clone(),
            failure.kind.to_string(),
            failure.key.to_string(),
            failure.reason.to_string(),
        ]);
    }
    table
}

pub fn summary_line(report: &CommitReport, invalid: usize) -> String {
    let mut line = format!(
        "{} applied, {} failed",
        report.succeeded,
        report.failed + invalid
    );
    if report.timed_out > 0 {
        line.push_str(&format!(" ({} timed out)", report.timed_out));
    }
    line
}
