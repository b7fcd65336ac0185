//! SQL completion context resolution
//!
//! Turns the text before the cursor into completion candidates using the
//! known table directory and cached table schemas:
//!
//! - `member.` access yields the columns of the referenced table only
//! - after `FROM`/`JOIN`/`INTO`/`UPDATE`/`TABLE` the known tables are offered
//! - anywhere else keywords, tables and the columns of referenced tables
//!
//! Context detection is heuristic (see `HeuristicContextAnalyzer`) and sits
//! behind the `ContextAnalyzer` trait so a real parser can replace it.

mod candidates;
mod context_analyzer;
mod directory;
mod keywords;
mod resolver;

#[cfg(test)]
mod tests;

pub use candidates::{CompletionCandidate, CompletionKind};
pub use context_analyzer::{CompletionContext, ContextAnalyzer, HeuristicContextAnalyzer};
pub use directory::TableDirectory;
pub use keywords::SQL_KEYWORDS;
pub use resolver::{CachedSchemaLookup, CompletionResolver, SchemaLookup};
