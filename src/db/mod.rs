//! Database access layer.
//!
//! This module provides SQLite access functionality:
//! - Scoped connections (one per operation, never pooled)
//! - Query execution
//! - Schema introspection
//! - Value mappings

pub mod connection;
pub mod executor;
pub mod schema;
pub mod types;

pub use connection::{AccessMode, Database, release};
pub use executor::QueryExecutor;
pub use schema::{SCHEMA_ERROR_PREFIX, SchemaInspector, is_error_text};
