//! sqlyard core - shared data model for the client workspace
//!
//! This crate provides the types every other sqlyard crate depends on:
//!
//! - `ConnectionId` - opaque identity of a live or saved connection
//! - `TableDescriptor`, `ColumnDescriptor`, `TableSchema` - schema metadata
//! - `Value` - closed cell value type (NULL is a first-class state)
//! - `PendingChange`, `CanonicalKey` - staged row mutations and their identity
//! - `RemoteBackend` - the request/response boundary to the database backend

mod backend;
mod connection;
mod edits;
mod error;
mod schema;
mod types;

pub use backend::*;
pub use connection::*;
pub use edits::*;
pub use error::*;
pub use schema::*;
pub use types::*;
