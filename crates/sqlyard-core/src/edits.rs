//! Staged row mutations and their identity

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::Value;

/// Primary key column name -> value. Ordered, so its serialization is canonical.
pub type PrimaryKey = BTreeMap<String, Value>;

/// Column name -> new value, in the order the columns were edited.
pub type RowData = IndexMap<String, Value>;

/// Kind of a staged row mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => f.write_str("insert"),
            ChangeKind::Update => f.write_str("update"),
            ChangeKind::Delete => f.write_str("delete"),
        }
    }
}

/// Identity of a ledger slot.
///
/// Derived from the table name and the sorted primary key, e.g.
/// `users:{"id":1}`. Inserts without a key (generated by the database) are
/// keyed by the change id instead so separate new rows never share a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Key for an existing row
    pub fn for_row(table_name: &str, primary_key: &PrimaryKey) -> Self {
        let fields: Vec<String> = primary_key
            .iter()
            .map(|(column, value)| {
                format!(
                    "{}:{}",
                    serde_json::Value::String(column.clone()),
                    serde_json::Value::from(value.clone())
                )
            })
            .collect();
        Self(format!("{}:{{{}}}", table_name, fields.join(",")))
    }

    fn for_new_row(table_name: &str, id: Uuid) -> Self {
        Self(format!("{}:new:{}", table_name, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row mutation recorded locally but not yet applied to the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub table_name: String,
    #[serde(default)]
    pub primary_key: PrimaryKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_data: Option<RowData>,
}

impl PendingChange {
    pub fn insert(table_name: impl Into<String>, primary_key: PrimaryKey, data: RowData) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ChangeKind::Insert,
            table_name: table_name.into(),
            primary_key,
            new_data: Some(data),
        }
    }

    pub fn update(table_name: impl Into<String>, primary_key: PrimaryKey, data: RowData) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ChangeKind::Update,
            table_name: table_name.into(),
            primary_key,
            new_data: Some(data),
        }
    }

    pub fn delete(table_name: impl Into<String>, primary_key: PrimaryKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ChangeKind::Delete,
            table_name: table_name.into(),
            primary_key,
            new_data: None,
        }
    }

    /// The ledger slot this change occupies
    pub fn canonical_key(&self) -> CanonicalKey {
        if self.kind == ChangeKind::Insert && self.primary_key.is_empty() {
            CanonicalKey::for_new_row(&self.table_name, self.id)
        } else {
            CanonicalKey::for_row(&self.table_name, &self.primary_key)
        }
    }

    /// New data, or an empty row when the change carries none
    pub fn data(&self) -> RowData {
        self.new_data.clone().unwrap_or_default()
    }
}

/// Successful outcome of one remote mutation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    #[serde(default)]
    pub affected_rows: Option<u64>,
}

impl MutationResult {
    pub fn affected(rows: u64) -> Self {
        Self {
            affected_rows: Some(rows),
        }
    }
}

/// Build a primary key map from `(column, value)` pairs
pub fn primary_key<I, K, V>(pairs: I) -> PrimaryKey
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Build a row data map from `(column, value)` pairs, keeping their order
pub fn row_data<I, K, V>(pairs: I) -> RowData
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
