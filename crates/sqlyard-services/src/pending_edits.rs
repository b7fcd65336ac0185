//! Pending edit ledger
//!
//! Uncommitted row mutations, one slot per canonical row identity. Staging the
//! same row again replaces the slot in place, so only the final edit is ever
//! sent. Slots enumerate in first-staged order.

use indexmap::IndexMap;
use sqlyard_core::{CanonicalKey, ChangeKind, PendingChange, PrimaryKey, RowData, Value};
use uuid::Uuid;

/// Result of staging a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// A new slot was created
    Added,
    /// An existing slot was overwritten
    Replaced,
}

/// Counts for "dirty" indicators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingSummary {
    pub total: usize,
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PendingEditLedger {
    slots: IndexMap<CanonicalKey, PendingChange>,
}

impl PendingEditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or overwrite the slot for the change's canonical key
    pub fn stage(&mut self, change: PendingChange) -> StageOutcome {
        let key = change.canonical_key();
        tracing::debug!(key = %key, kind = %change.kind, "staging change");
        match self.slots.insert(key, change) {
            Some(_) => StageOutcome::Replaced,
            None => StageOutcome::Added,
        }
    }

    /// Record a single cell edit on an existing row.
    ///
    /// Merges into a staged update or insert for the same row so earlier
    /// edited columns survive; replaces a staged delete with an update.
    pub fn stage_cell_edit(
        &mut self,
        table_name: &str,
        primary_key: PrimaryKey,
        column: impl Into<String>,
        value: Value,
    ) -> StageOutcome {
        let key = CanonicalKey::for_row(table_name, &primary_key);
        let column = column.into();

        let change = match self.slots.get(&key) {
            Some(existing) if existing.kind != ChangeKind::Delete => {
                let mut data = existing.data();
                data.insert(column, value);
                let mut merged = existing.clone();
                // A merged change is a new version of the slot
                merged.id = Uuid::new_v4();
                merged.new_data = Some(data);
                merged
            }
            _ => {
                let mut data = RowData::new();
                data.insert(column, value);
                PendingChange::update(table_name, primary_key, data)
            }
        };
        self.stage(change)
    }

    /// Remove one slot. Absent keys are ignored.
    pub fn unstage(&mut self, key: &CanonicalKey) -> Option<PendingChange> {
        self.slots.shift_remove(key)
    }

    /// Remove the slot only while it still holds the change with `change_id`
    pub fn unstage_if_current(&mut self, key: &CanonicalKey, change_id: Uuid) -> bool {
        match self.slots.get(key) {
            Some(change) if change.id == change_id => {
                self.slots.shift_remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, key: &CanonicalKey) -> Option<&PendingChange> {
        self.slots.get(key)
    }

    pub fn contains(&self, key: &CanonicalKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Read-only copy of the staged changes
    pub fn entries(&self) -> Vec<PendingChange> {
        self.slots.values().cloned().collect()
    }

    /// Keyed copy of the ledger, in commit order
    pub fn snapshot(&self) -> Vec<(CanonicalKey, PendingChange)> {
        self.slots
            .iter()
            .map(|(key, change)| (key.clone(), change.clone()))
            .collect()
    }

    pub fn summary(&self) -> PendingSummary {
        let mut summary = PendingSummary {
            total: self.slots.len(),
            ..Default::default()
        };
        for change in self.slots.values() {
            match change.kind {
                ChangeKind::Insert => summary.inserts += 1,
                ChangeKind::Update => summary.updates += 1,
                ChangeKind::Delete => summary.deletes += 1,
            }
        }
        summary
    }

    /// Distinct tables with staged changes, in first-staged order
    pub fn tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        for change in self.slots.values() {
            if !tables.contains(&change.table_name) {
                tables.push(change.table_name.clone());
            }
        }
        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlyard_core::{primary_key, row_data};

    fn update(id: i64, name: &str) -> PendingChange {
        PendingChange::update("users", primary_key([("id", id)]), row_data([("name", name)]))
    }

    #[test]
    fn same_primary_key_overwrites_slot() {
        let mut ledger = PendingEditLedger::new();
        assert_eq!(ledger.stage(update(1, "Alice")), StageOutcome::Added);
        let second = update(1, "Alicia");
        assert_eq!(ledger.stage(second.clone()), StageOutcome::Replaced);

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries(), vec![second]);
    }

    #[test]
    fn same_key_in_different_tables_does_not_collide() {
        let mut ledger = PendingEditLedger::new();
        ledger.stage(update(1, "Alice"));
        ledger.stage(PendingChange::delete("orders", primary_key([("id", 1)])));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.tables(), vec!["users".to_string(), "orders".to_string()]);
    }

    #[test]
    fn enumeration_follows_first_staged_order() {
        let mut ledger = PendingEditLedger::new();
        ledger.stage(update(3, "c"));
        ledger.stage(update(1, "a"));
        ledger.stage(update(2, "b"));
        // Overwrite keeps the original position
        ledger.stage(update(3, "c2"));

        let names: Vec<String> = ledger
            .entries()
            .iter()
            .map(|c| c.data()["name"].to_string())
            .collect();
        assert_eq!(names, vec!["c2", "a", "b"]);

        ledger.unstage(&update(1, "a").canonical_key());
        let ids: Vec<String> = ledger
            .snapshot()
            .iter()
            .map(|(key, _)| key.to_string())
            .collect();
        assert_eq!(ids, vec![r#"users:{"id":3}"#, r#"users:{"id":2}"#]);
    }

    #[test]
    fn unstage_is_idempotent() {
        let mut ledger = PendingEditLedger::new();
        let change = update(1, "Alice");
        let key = change.canonical_key();
        ledger.stage(change);

        assert!(ledger.unstage(&key).is_some());
        assert!(ledger.unstage(&key).is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn unstage_if_current_keeps_restaged_slot() {
        let mut ledger = PendingEditLedger::new();
        let first = update(1, "Alice");
        let key = first.canonical_key();
        ledger.stage(first.clone());
        ledger.stage(update(1, "Alicia"));

        assert!(!ledger.unstage_if_current(&key, first.id));
        assert!(ledger.contains(&key));

        let current = ledger.get(&key).map(|c| c.id).unwrap();
        assert!(ledger.unstage_if_current(&key, current));
        assert!(ledger.is_empty());
    }

    #[test]
    fn cell_edits_merge_per_column() {
        let mut ledger = PendingEditLedger::new();
        let pk = primary_key([("id", 1)]);
        assert_eq!(
            ledger.stage_cell_edit("users", pk.clone(), "name", Value::from("Alice")),
            StageOutcome::Added
        );
        ledger.stage_cell_edit("users", pk.clone(), "email", Value::from("a@example.com"));
        assert_eq!(
            ledger.stage_cell_edit("users", pk.clone(), "name", Value::from("Alicia")),
            StageOutcome::Replaced
        );

        assert_eq!(ledger.len(), 1);
        let change = &ledger.entries()[0];
        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(
            change.new_data,
            Some(row_data([("name", "Alicia"), ("email", "a@example.com")]))
        );
    }

    #[test]
    fn cell_edit_merges_into_staged_insert() {
        let mut ledger = PendingEditLedger::new();
        let pk = primary_key([("id", 7)]);
        ledger.stage(PendingChange::insert(
            "users",
            pk.clone(),
            row_data([("id", Value::from(7)), ("name", Value::from("new"))]),
        ));
        ledger.stage_cell_edit("users", pk, "name", Value::Null);

        let change = &ledger.entries()[0];
        assert_eq!(change.kind, ChangeKind::Insert);
        assert_eq!(change.data().get("name"), Some(&Value::Null));
        assert_eq!(change.data().get("id"), Some(&Value::from(7)));
    }

    #[test]
    fn cell_edit_replaces_staged_delete() {
        let mut ledger = PendingEditLedger::new();
        let pk = primary_key([("id", 1)]);
        ledger.stage(PendingChange::delete("users", pk.clone()));
        ledger.stage_cell_edit("users", pk, "name", Value::from("back"));

        let change = &ledger.entries()[0];
        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.data(), row_data([("name", "back")]));
    }

    #[test]
    fn summary_counts_by_kind() {
        let mut ledger = PendingEditLedger::new();
        ledger.stage(update(1, "a"));
        ledger.stage(update(2, "b"));
        ledger.stage(PendingChange::delete("users", primary_key([("id", 3)])));
        ledger.stage(PendingChange::insert(
            "users",
            PrimaryKey::new(),
            row_data([("name", "d")]),
        ));

        assert_eq!(
            ledger.summary(),
            PendingSummary {
                total: 4,
                inserts: 1,
                updates: 2,
                deletes: 1,
            }
        );

        ledger.clear();
        assert_eq!(ledger.summary(), PendingSummary::default());
    }
}
