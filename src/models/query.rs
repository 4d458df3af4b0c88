//! Query-related data models.
//!
//! This module defines the result of running generated SQL and the answer
//! returned for a single question.

use crate::error::AskError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    /// SQLite storage class or declared type (e.g., "INTEGER", "TEXT"); empty for expressions
    /// with no rows to inspect
    pub type_name: String,
}

impl ColumnMetadata {
    /// Create new column metadata.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Rows produced by a statement. Shape comes from the statement alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnMetadata>,
    /// Each row holds one value per column, in column order
    pub rows: Vec<Vec<JsonValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
    pub truncated: bool,
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a result for write operations (INSERT/UPDATE/DELETE).
    pub fn write_result(rows_affected: u64, execution_time_ms: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            rows_affected: Some(rows_affected),
            truncated: false,
            execution_time_ms,
        }
    }

    /// Get the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.rows_affected.is_none()
    }

    /// The single value of a one-row, one-column result (e.g. `SELECT COUNT(*)`).
    pub fn scalar(&self) -> Option<&JsonValue> {
        match (self.columns.len(), self.rows.as_slice()) {
            (1, [row]) => row.first(),
            _ => None,
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Outcome of one question: the SQL that was generated and what running it produced.
///
/// A failing statement is not an error of the interaction as a whole; the SQL is still
/// shown to the user next to the failure.
#[derive(Debug)]
pub struct Answer {
    pub question: String,
    /// Model output before cleanup
    pub raw_completion: String,
    pub sql: String,
    pub outcome: Result<QueryResult, AskError>,
}

impl Answer {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn result(&self) -> Option<&QueryResult> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&AskError> {
        self.outcome.as_ref().err()
    }
}
