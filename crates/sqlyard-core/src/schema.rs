//! Schema metadata types

use serde::{Deserialize, Serialize};

/// Conventional default namespace. Tables in it are displayed unqualified.
pub const DEFAULT_SCHEMA: &str = "public";

/// Table type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    #[default]
    Table,
    View,
    MaterializedView,
    ForeignTable,
    Temporary,
    System,
}

impl TableType {
    /// Short human label, used as completion detail text
    pub fn label(&self) -> &'static str {
        match self {
            TableType::Table => "table",
            TableType::View => "view",
            TableType::MaterializedView => "materialized view",
            TableType::ForeignTable => "foreign table",
            TableType::Temporary => "temporary table",
            TableType::System => "system table",
        }
    }

    /// Parse the type strings reported by catalogs (`BASE TABLE`, `VIEW`, ...)
    pub fn from_catalog(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "view" => TableType::View,
            "materialized view" | "matview" => TableType::MaterializedView,
            "foreign table" | "foreign" => TableType::ForeignTable,
            "local temporary" | "temporary" | "temp" => TableType::Temporary,
            "system view" | "system table" | "system" => TableType::System,
            _ => TableType::Table,
        }
    }
}

/// An entry of the table directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    /// Owning namespace (SQL schema or catalog)
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub table_type: TableType,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            table_type: TableType::Table,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_type(mut self, table_type: TableType) -> Self {
        self.table_type = table_type;
        self
    }

    /// True when the table lives in `public` (or has no schema)
    pub fn in_default_schema(&self) -> bool {
        self.in_schema(DEFAULT_SCHEMA)
    }

    /// True when the table lives in `default_schema` (or has no schema)
    pub fn in_schema(&self, default_schema: &str) -> bool {
        match &self.schema {
            None => true,
            Some(schema) => schema.eq_ignore_ascii_case(default_schema),
        }
    }

    /// Name shown to the user: bare in `public`, `schema.name` otherwise
    pub fn display_name(&self) -> String {
        self.display_name_in(DEFAULT_SCHEMA)
    }

    /// Display name relative to a configured default namespace
    pub fn display_name_in(&self, default_schema: &str) -> String {
        match &self.schema {
            Some(schema) if !self.in_schema(default_schema) => {
                format!("{}.{}", schema, self.name)
            }
            _ => self.name.clone(),
        }
    }

    /// `schema.name` whenever a schema is known, regardless of default namespace
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// Case-insensitive match of a (possibly quoted) reference against the
    /// bare, display or qualified name.
    pub fn matches_reference(&self, reference: &str) -> bool {
        let reference = unquote_identifier(reference);
        reference.eq_ignore_ascii_case(&self.name)
            || reference.eq_ignore_ascii_case(&self.display_name())
            || reference.eq_ignore_ascii_case(&self.qualified_name())
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Data type (database-specific string)
    pub data_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            is_primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark as primary key. Primary key columns are never nullable.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }
}

/// Column snapshot of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name as fetched
    pub table: String,
    #[serde(default)]
    pub schema: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            table: table.into(),
            schema: None,
            columns,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Find a column by name (case-insensitive)
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }
}

/// Strip identifier delimiters (`"x"`, `` `x` ``, `[x]`) from every dot-separated
/// part of a reference. `"app"."orders"` becomes `app.orders`.
pub fn unquote_identifier(reference: &str) -> String {
    reference
        .trim()
        .split('.')
        .map(|part| part.trim_matches(|c| matches!(c, '"' | '`' | '[' | ']')))
        .collect::<Vec<_>>()
        .join(".")
}
