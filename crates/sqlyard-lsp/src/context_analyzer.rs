//! SQL Context Analyzer - heuristic cursor context detection
//!
//! Regex based: no tokenizer, no grammar. Good enough to tell member access,
//! table positions and the general case apart from the text before the cursor.

use regex::Regex;
use sqlyard_core::unquote_identifier;
use std::sync::LazyLock;

/// One identifier part: bare, `"quoted"`, `` `quoted` `` or `[bracketed]`
const IDENT: &str = r#"(?:[A-Za-z_][\w$]*|"[^"]+"|`[^`]+`|\[[^\]]+\])"#;

static MEMBER_ACCESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"({IDENT}(?:\.{IDENT})*)\.([A-Za-z_][\w$]*)?$")).expect("valid regex")
});

static TABLE_POSITION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(FROM|JOIN|INTO|UPDATE|TABLE)\s+([\w$"`\[\]]*)$"#).expect("valid regex")
});

static TABLE_REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(?:FROM|JOIN)\s+({IDENT}(?:\.{IDENT})*)")).expect("valid regex")
});

static ALIAS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(?i:AS\s+)?([A-Za-z_][\w$]*)").expect("valid regex")
});

static PARTIAL_WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w$]*$").expect("valid regex"));

/// Words that can follow a table reference without being its alias
const NON_ALIAS_WORDS: &[&str] = &[
    "WHERE", "ON", "USING", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "CROSS", "OUTER",
    "NATURAL", "GROUP", "ORDER", "HAVING", "LIMIT", "OFFSET", "UNION", "INTERSECT", "EXCEPT",
    "WINDOW", "SET", "VALUES", "RETURNING", "AS",
];

/// Cursor context derived from the text before the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    /// `qualifier.partial` - expecting a column of the qualifier's table
    MemberAccess {
        qualifier: String,
        partial: String,
        /// Table the qualifier stands for when it is an alias introduced earlier
        aliased_table: Option<String>,
    },
    /// After a clause keyword that expects a table name
    TablePosition { keyword: String, partial: String },
    /// Anything else
    General {
        partial: String,
        /// Tables named after `FROM`/`JOIN` earlier in the statement, unquoted
        referenced_tables: Vec<String>,
    },
}

impl CompletionContext {
    /// Word fragment under the cursor (not used for filtering here)
    pub fn partial(&self) -> &str {
        match self {
            CompletionContext::MemberAccess { partial, .. }
            | CompletionContext::TablePosition { partial, .. }
            | CompletionContext::General { partial, .. } => partial,
        }
    }
}

/// Determines the completion context of a cursor position
pub trait ContextAnalyzer {
    fn analyze(&self, text_before_cursor: &str) -> CompletionContext;
}

/// Table reference found after `FROM`/`JOIN`
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableRef {
    table_name: String,
    alias: Option<String>,
}

/// Regex based context analysis
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicContextAnalyzer;

impl HeuristicContextAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Scan `FROM x [AS] a` / `JOIN x [AS] a` occurrences
    fn table_refs(text: &str) -> Vec<TableRef> {
        let mut refs: Vec<TableRef> = Vec::new();
        for captures in TABLE_REFERENCE_REGEX.captures_iter(text) {
            let Some(table) = captures.get(1) else {
                continue;
            };
            let alias = ALIAS_REGEX
                .captures(&text[table.end()..])
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
                .filter(|word| !NON_ALIAS_WORDS.iter().any(|kw| kw.eq_ignore_ascii_case(word)))
                .map(str::to_string);

            refs.push(TableRef {
                table_name: unquote_identifier(table.as_str()),
                alias,
            });
        }
        refs
    }

    fn referenced_tables(refs: &[TableRef]) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        for table_ref in refs {
            if !tables
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&table_ref.table_name))
            {
                tables.push(table_ref.table_name.clone());
            }
        }
        tables
    }
}

impl ContextAnalyzer for HeuristicContextAnalyzer {
    fn analyze(&self, text_before_cursor: &str) -> CompletionContext {
        tracing::trace!(text_before = %text_before_cursor, "analyzing completion context");

        if let Some(captures) = MEMBER_ACCESS_REGEX.captures(text_before_cursor) {
            let qualifier = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let partial = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
            let unquoted = unquote_identifier(qualifier);
            let aliased_table = Self::table_refs(text_before_cursor)
                .into_iter()
                .find(|r| {
                    r.alias
                        .as_deref()
                        .is_some_and(|alias| alias.eq_ignore_ascii_case(&unquoted))
                })
                .map(|r| r.table_name);

            return CompletionContext::MemberAccess {
                qualifier: qualifier.to_string(),
                partial: partial.to_string(),
                aliased_table,
            };
        }

        if let Some(captures) = TABLE_POSITION_REGEX.captures(text_before_cursor) {
            let keyword = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let partial = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
            return CompletionContext::TablePosition {
                keyword: keyword.to_ascii_uppercase(),
                partial: partial.to_string(),
            };
        }

        let partial = PARTIAL_WORD_REGEX
            .find(text_before_cursor)
            .map(|m| m.as_str())
            .unwrap_or_default();

        CompletionContext::General {
            partial: partial.to_string(),
            referenced_tables: Self::referenced_tables(&Self::table_refs(text_before_cursor)),
        }
    }
}
