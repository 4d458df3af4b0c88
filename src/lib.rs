//! askdb library
//!
//! Ask a SQLite database questions in plain English: the schema is read from
//! the file, a hosted model turns the question into SQL, and the SQL is run
//! against the same file.

pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod repl;

pub use config::Config;
pub use db::{Database, SchemaInspector};
pub use error::{AskError, AskResult};
pub use pipeline::QueryPipeline;
