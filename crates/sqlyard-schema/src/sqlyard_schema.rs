//! sqlyard schema - table schema caching
//!
//! This crate provides:
//! - `SchemaCache`: per-connection table schemas with lazy TTL expiry
//! - `SchemaLoader`: fetch-through loading from a `RemoteBackend`

mod cache;
mod loader;

pub use cache::{DEFAULT_SCHEMA_TTL, SchemaCache, SchemaCacheStats};
pub use loader::SchemaLoader;
