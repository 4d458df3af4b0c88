//! Data models for askdb.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod schema;

// Re-export commonly used types
pub use query::{Answer, ColumnMetadata, QueryResult};
pub use schema::{ColumnDefinition, ForeignKey, SchemaDescription, TableSchema, TableType};
