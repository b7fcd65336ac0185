//! Completion candidates and their LSP representation

use lsp_types::{CompletionItem, CompletionItemKind, Documentation};

/// What a candidate inserts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    Field,
    Table,
    Keyword,
}

impl CompletionKind {
    /// Sort prefix: columns before tables before keywords
    fn sort_prefix(self) -> &'static str {
        match self {
            CompletionKind::Field => "0",
            CompletionKind::Table => "1",
            CompletionKind::Keyword => "2",
        }
    }
}

/// One suggested insertion for the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub label: String,
    pub kind: CompletionKind,
    pub insert_text: String,
    pub detail: Option<String>,
    pub documentation: Option<String>,
}

impl CompletionCandidate {
    pub fn field(name: impl Into<String>, detail: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            insert_text: name.clone(),
            label: name,
            kind: CompletionKind::Field,
            detail: Some(detail.into()),
            documentation: None,
        }
    }

    pub fn table(display_name: impl Into<String>, detail: impl Into<String>) -> Self {
        let name = display_name.into();
        Self {
            insert_text: name.clone(),
            label: name,
            kind: CompletionKind::Table,
            detail: Some(detail.into()),
            documentation: None,
        }
    }

    pub fn keyword(keyword: &str) -> Self {
        Self {
            label: keyword.to_string(),
            kind: CompletionKind::Keyword,
            insert_text: format!("{} ", keyword),
            detail: Some("SQL Keyword".to_string()),
            documentation: None,
        }
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }
}

impl From<CompletionCandidate> for CompletionItem {
    fn from(candidate: CompletionCandidate) -> Self {
        let kind = match candidate.kind {
            CompletionKind::Field => CompletionItemKind::FIELD,
            CompletionKind::Table => CompletionItemKind::CLASS,
            CompletionKind::Keyword => CompletionItemKind::KEYWORD,
        };

        CompletionItem {
            sort_text: Some(format!(
                "{}_{}",
                candidate.kind.sort_prefix(),
                candidate.label
            )),
            label: candidate.label,
            kind: Some(kind),
            detail: candidate.detail,
            documentation: candidate.documentation.map(Documentation::String),
            insert_text: Some(candidate.insert_text),
            ..Default::default()
        }
    }
}
