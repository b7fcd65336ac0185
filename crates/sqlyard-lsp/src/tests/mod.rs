//! Completion tests
//!
//! Organized by category:
//! - test_helpers: Common fixtures
//! - test_context_detection: Tests for cursor context analysis
//! - test_completions: Tests for candidate resolution per context
//! - test_qualified_completions: Tests for schema-qualified tables and aliases
