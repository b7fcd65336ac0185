//! Commit coordinator
//!
//! Replays a snapshot of the pending edit ledger against the backend one
//! mutation at a time. Each success removes its slot right away; failures stay
//! staged for an explicit retry or discard.

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlyard_core::{
    CanonicalKey, ChangeKind, ConnectionId, MutationResult, PendingChange, RemoteBackend, Result,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use crate::PendingEditLedger;

/// Applies one staged change remotely.
///
/// `Ok(None)` is a rejected mutation and `Err(_)` a transport failure.
#[async_trait]
pub trait RowMutator: Send + Sync {
    async fn apply(&self, change: &PendingChange) -> Result<Option<MutationResult>>;
}

/// `RowMutator` dispatching by change kind to a `RemoteBackend`
pub struct BackendMutator {
    backend: Arc<dyn RemoteBackend>,
    connection_id: ConnectionId,
}

impl BackendMutator {
    pub fn new(backend: Arc<dyn RemoteBackend>, connection_id: ConnectionId) -> Self {
        Self {
            backend,
            connection_id,
        }
    }
}

#[async_trait]
impl RowMutator for BackendMutator {
    async fn apply(&self, change: &PendingChange) -> Result<Option<MutationResult>> {
        let table = change.table_name.as_str();
        match change.kind {
            ChangeKind::Insert => {
                self.backend
                    .apply_insert(&self.connection_id, table, &change.data())
                    .await
            }
            ChangeKind::Update => {
                self.backend
                    .apply_update(
                        &self.connection_id,
                        table,
                        &change.primary_key,
                        &change.data(),
                    )
                    .await
            }
            ChangeKind::Delete => {
                self.backend
                    .apply_delete(&self.connection_id, table, &change.primary_key)
                    .await
            }
        }
    }
}

/// Why a staged change was not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The backend returned no result
    Rejected,
    /// The backend call itself failed
    Transport(String),
    /// No answer within the mutation timeout.
    ///
    /// The backend may still complete the mutation after the timeout (a
    /// blocking driver call keeps running once its future is dropped), so
    /// retrying a timed-out insert can apply it twice.
    TimedOut,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Rejected => f.write_str("rejected by backend"),
            FailureReason::Transport(message) => write!(f, "transport error: {}", message),
            FailureReason::TimedOut => f.write_str("timed out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFailure {
    pub key: CanonicalKey,
    pub table_name: String,
    pub kind: ChangeKind,
    pub reason: FailureReason,
}

/// Aggregate outcome of one commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub succeeded: usize,
    /// Every failure, timeouts included
    pub failed: usize,
    pub timed_out: usize,
    pub failures: Vec<CommitFailure>,
}

impl CommitReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    fn record_failure(&mut self, key: CanonicalKey, change: &PendingChange, reason: FailureReason) {
        tracing::warn!(
            key = %key,
            table = %change.table_name,
            kind = %change.kind,
            reason = %reason,
            "staged change failed"
        );
        if reason == FailureReason::TimedOut {
            self.timed_out += 1;
        }
        self.failed += 1;
        self.failures.push(CommitFailure {
            key,
            table_name: change.table_name.clone(),
            kind: change.kind,
            reason,
        });
    }
}

pub struct CommitCoordinator {
    ledger: Arc<RwLock<PendingEditLedger>>,
    mutation_timeout: Option<Duration>,
}

impl CommitCoordinator {
    pub fn new(ledger: Arc<RwLock<PendingEditLedger>>) -> Self {
        Self {
            ledger,
            mutation_timeout: None,
        }
    }

    /// Give up on a single mutation after `timeout` and count it as timed out
    pub fn with_mutation_timeout(mut self, timeout: Duration) -> Self {
        self.mutation_timeout = Some(timeout);
        self
    }

    /// Apply every staged change sequentially in ledger order.
    ///
    /// Works on a snapshot taken up front; edits staged while the commit runs
    /// are left for the next commit. Never fails as a whole.
    pub async fn commit(&self, mutator: &dyn RowMutator) -> CommitReport {
        let snapshot = self.ledger.read().snapshot();
        let span = tracing::info_span!("commit", changes = snapshot.len());

        async move {
            let mut report = CommitReport::default();

            for (key, change) in snapshot {
                match self.apply_one(mutator, &change).await {
                    Ok(Some(result)) => {
                        let removed = self.ledger.write().unstage_if_current(&key, change.id);
                        tracing::debug!(
                            key = %key,
                            kind = %change.kind,
                            affected_rows = ?result.affected_rows,
                            removed,
                            "staged change applied"
                        );
                        report.succeeded += 1;
                    }
                    Ok(None) => report.record_failure(key, &change, FailureReason::Rejected),
                    Err(reason) => report.record_failure(key, &change, reason),
                }
            }

            tracing::info!(
                succeeded = report.succeeded,
                failed = report.failed,
                timed_out = report.timed_out,
                "commit finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn apply_one(
        &self,
        mutator: &dyn RowMutator,
        change: &PendingChange,
    ) -> std::result::Result<Option<MutationResult>, FailureReason> {
        let applied = match self.mutation_timeout {
            Some(limit) => tokio::time::timeout(limit, mutator.apply(change))
                .await
                .map_err(|_| FailureReason::TimedOut)?,
            None => mutator.apply(change).await,
        };
        applied.map_err(|e| FailureReason::Transport(e.to_string()))
    }
}
