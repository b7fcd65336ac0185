//! sqlyard Services Layer
//!
//! Sits between the application shell and the domain crates.
//!
//! ```text
//! Shell (sqlyard-cli)
//!     ↓
//! Service Layer (sqlyard-services) ← This crate
//!     ↓
//! Domain Layer (sqlyard-schema, sqlyard-lsp)
//!     ↓
//! Infrastructure Layer (sqlyard-core, sqlyard-driver-sqlite)
//! ```
//!
//! # Services
//!
//! - [`PendingEditLedger`] - staged row mutations, one slot per row identity
//! - [`CommitCoordinator`] - sequential best-effort replay of the ledger
//! - [`validate_change`] - checks a staged change against a table schema
//! - [`WorkspaceState`] - the per-application state object tying them together

mod commit;
mod error;
mod pending_edits;
mod validation;
mod workspace_state;

pub use commit::{
    BackendMutator, CommitCoordinator, CommitFailure, CommitReport, FailureReason, RowMutator,
};
pub use error::{ServiceError, ServiceResult};
pub use pending_edits::{PendingEditLedger, PendingSummary, StageOutcome};
pub use validation::validate_change;
pub use workspace_state::WorkspaceState;
