//! SQLite backend for sqlyard
//!
//! Implements `RemoteBackend` over local SQLite databases registered under
//! connection ids.

mod backend;
mod statements;

pub use backend::SqliteBackend;
