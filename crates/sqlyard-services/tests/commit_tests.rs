//! Integration tests for the commit coordinator
//!
//! Drives `CommitCoordinator` through `BackendMutator` against `MockBackend`.

mod common;

use async_trait::async_trait;
use parking_lot::RwLock;
use pretty_assertions::assert_eq;
use sqlyard_core::{
    ChangeKind, ConnectionId, MutationResult, PendingChange, Result, primary_key, row_data,
};
use sqlyard_services::{
    BackendMutator, CommitCoordinator, CommitReport, FailureReason, PendingEditLedger, RowMutator,
};
use std::sync::Arc;
use std::time::Duration;

use common::{MockBackend, MockOutcome};

fn update(id: i64, name: &str) -> PendingChange {
    PendingChange::update("users", primary_key([("id", id)]), row_data([("name", name)]))
}

fn ledger_with(changes: Vec<PendingChange>) -> Arc<RwLock<PendingEditLedger>> {
    let mut ledger = PendingEditLedger::new();
    for change in changes {
        ledger.stage(change);
    }
    Arc::new(RwLock::new(ledger))
}

fn mutator(backend: MockBackend) -> BackendMutator {
    BackendMutator::new(Arc::new(backend), ConnectionId::from("c1"))
}

// ============ Outcome Tests ============

#[tokio::test]
async fn commit_removes_only_successful_changes() {
    let second = update(2, "b");
    let ledger = ledger_with(vec![update(1, "a"), second.clone(), update(3, "c")]);
    let backend = MockBackend::new().with_outcome("users", &second.primary_key, MockOutcome::Reject);

    let report = CommitCoordinator::new(ledger.clone())
        .commit(&mutator(backend.clone()))
        .await;

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(ledger.read().entries(), vec![second.clone()]);
    assert_eq!(
        report.failures[0].reason,
        FailureReason::Rejected
    );
    assert_eq!(report.failures[0].key, second.canonical_key());
}

#[tokio::test]
async fn transport_errors_count_as_failures() {
    let failing = update(1, "a");
    let ledger = ledger_with(vec![failing.clone()]);
    let backend = MockBackend::new().with_outcome(
        "users",
        &failing.primary_key,
        MockOutcome::Fail("connection reset".into()),
    );

    let report = CommitCoordinator::new(ledger.clone())
        .commit(&mutator(backend))
        .await;

    assert!(!report.is_success());
    assert_eq!(report.failed, 1);
    assert!(matches!(
        &report.failures[0].reason,
        FailureReason::Transport(message) if message.contains("connection reset")
    ));
    assert_eq!(ledger.read().len(), 1);
}

#[tokio::test]
async fn mutations_are_dispatched_in_first_staged_order() {
    let ledger = ledger_with(vec![
        PendingChange::insert("users", primary_key([("id", 9)]), row_data([("id", 9)])),
        update(1, "a"),
        PendingChange::delete("users", primary_key([("id", 5)])),
        // overwrite keeps the insert's slot first
        PendingChange::insert(
            "users",
            primary_key([("id", 9)]),
            row_data([("id", 9), ("name", 0)]),
        ),
    ]);
    let backend = MockBackend::new();

    let report = CommitCoordinator::new(ledger.clone())
        .commit(&mutator(backend.clone()))
        .await;

    assert_eq!(report.total(), 3);
    assert_eq!(
        backend.mutation_log(),
        vec![
            "insert users:{}".to_string(),
            r#"update users:{"id":1}"#.to_string(),
            r#"delete users:{"id":5}"#.to_string(),
        ]
    );
    assert!(ledger.read().is_empty());
}

#[tokio::test]
async fn empty_ledger_commits_nothing() {
    let ledger = ledger_with(Vec::new());
    let report = CommitCoordinator::new(ledger)
        .commit(&mutator(MockBackend::new()))
        .await;
    assert_eq!(report, CommitReport::default());
    assert!(report.is_success());
}

// ============ Timeout Tests ============

#[tokio::test(start_paused = true)]
async fn hanging_mutation_times_out_and_stays_staged() {
    let hanging = update(1, "a");
    let ledger = ledger_with(vec![hanging.clone(), update(2, "b")]);
    let backend = MockBackend::new().with_outcome("users", &hanging.primary_key, MockOutcome::Hang);

    let report = CommitCoordinator::new(ledger.clone())
        .with_mutation_timeout(Duration::from_secs(5))
        .commit(&mutator(backend))
        .await;

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.timed_out, 1);
    assert_eq!(report.failures[0].reason, FailureReason::TimedOut);
    assert_eq!(report.failures[0].kind, ChangeKind::Update);
    assert_eq!(ledger.read().entries(), vec![hanging]);
}

// ============ Concurrent Edit Tests ============

/// Restages the row it is applying, as a user editing mid-commit would
struct RestagingMutator {
    ledger: Arc<RwLock<PendingEditLedger>>,
}

#[async_trait]
impl RowMutator for RestagingMutator {
    async fn apply(&self, change: &PendingChange) -> Result<Option<MutationResult>> {
        let mut newer = change.clone();
        newer.id = uuid::Uuid::new_v4();
        newer.new_data = Some(row_data([("name", "edited during commit")]));
        self.ledger.write().stage(newer);
        tokio::task::yield_now().await;
        Ok(Some(MutationResult::default()))
    }
}

#[tokio::test]
async fn edit_restaged_during_commit_is_kept() {
    let ledger = ledger_with(vec![update(1, "a")]);
    let mutator = RestagingMutator {
        ledger: ledger.clone(),
    };

    let report = CommitCoordinator::new(ledger.clone()).commit(&mutator).await;

    assert_eq!(report.succeeded, 1);
    let remaining = ledger.read().entries();
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        remaining[0].data(),
        row_data([("name", "edited during commit")])
    );
}
