//! Query execution engine.
//!
//! This module runs a single statement against a SQLite file with support for:
//! - Row limits (enforced via streaming - only fetches needed rows)
//! - Query timeouts
//! - Read-only or read-write connections
//!
//! Each call opens its own connection and closes it before returning.

use crate::config::{DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT};
use crate::db::connection::{AccessMode, Database, release};
use crate::db::types::RowToValues;
use crate::error::{AskError, AskResult};
use crate::models::{ColumnMetadata, QueryResult};
use futures_util::StreamExt;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Column, Executor, TypeInfo};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Query executor that handles statement execution.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    default_timeout: Duration,
    default_limit: u32,
    access: AccessMode,
    decode_binary: bool,
}

impl QueryExecutor {
    /// Create a new read-only query executor with default settings.
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            default_limit: DEFAULT_ROW_LIMIT,
            access: AccessMode::ReadOnly,
            decode_binary: true,
        }
    }

    /// Create a new query executor with custom settings.
    pub fn with_defaults(timeout_secs: u64, row_limit: u32) -> Self {
        Self {
            default_timeout: Duration::from_secs(timeout_secs),
            default_limit: row_limit.clamp(1, MAX_ROW_LIMIT),
            ..Self::new()
        }
    }

    pub fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    /// If false, BLOB values are always base64 encoded instead of shown as text when valid UTF-8.
    pub fn with_decode_binary(mut self, decode_binary: bool) -> Self {
        self.decode_binary = decode_binary;
        self
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// Run a row-returning statement and collect up to the row limit.
    pub async fn execute_query(&self, db: &Database, sql: &str) -> AskResult<QueryResult> {
        let start = Instant::now();
        debug!(
            sql = %sql,
            limit = self.default_limit,
            timeout_secs = self.default_timeout.as_secs(),
            "Executing query"
        );

        let mut conn = db.connect(self.access).await?;
        let result = self.query_on(&mut conn, sql, start).await;
        release(conn).await;
        result
    }

    /// Run a statement that modifies data and report the number of rows affected.
    pub async fn execute_write(&self, db: &Database, sql: &str) -> AskResult<QueryResult> {
        let start = Instant::now();
        debug!(
            sql = %sql,
            timeout_secs = self.default_timeout.as_secs(),
            "Executing write operation"
        );

        let mut conn = db.connect(self.access).await?;
        let result = match timeout(self.default_timeout, (&mut conn).execute(sql)).await {
            Ok(Ok(r)) => Ok(r.rows_affected()),
            Ok(Err(e)) => Err(AskError::from(e)),
            Err(_) => Err(timeout_error("write operation", self.default_timeout)),
        };
        release(conn).await;

        let execution_time_ms = start.elapsed().as_millis() as u64;
        Ok(QueryResult::write_result(result?, execution_time_ms))
    }

    async fn query_on(
        &self,
        conn: &mut SqliteConnection,
        sql: &str,
        start: Instant,
    ) -> AskResult<QueryResult> {
        let rows = fetch_rows(conn, sql, self.default_limit, self.default_timeout).await?;

        // No rows to inspect; ask SQLite for the statement's columns instead
        let columns = if rows.is_empty() {
            describe_columns(conn, sql).await
        } else {
            rows[0].column_metadata()
        };

        Ok(process_rows(
            rows,
            columns,
            self.default_limit,
            start,
            self.decode_binary,
        ))
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn fetched rows into a QueryResult. `rows` may hold one row past the limit,
/// which only marks the result as truncated.
fn process_rows<R: RowToValues>(
    rows: Vec<R>,
    columns: Vec<ColumnMetadata>,
    row_limit: u32,
    start: Instant,
    decode_binary: bool,
) -> QueryResult {
    let execution_time_ms = start.elapsed().as_millis() as u64;

    let total_rows = rows.len();
    let truncated = total_rows > row_limit as usize;
    let values = rows
        .iter()
        .take(row_limit as usize)
        .map(|r| r.to_values(decode_binary))
        .collect();

    if truncated {
        warn!(limit = row_limit, "Query result truncated");
    }

    QueryResult {
        columns,
        rows: values,
        rows_affected: None,
        truncated,
        execution_time_ms,
    }
}

async fn fetch_rows(
    conn: &mut SqliteConnection,
    sql: &str,
    row_limit: u32,
    query_timeout: Duration,
) -> AskResult<Vec<SqliteRow>> {
    let fetch_limit = row_limit as usize + 1;
    let rows_future = (&mut *conn)
        .fetch(sql)
        .take(fetch_limit)
        .collect::<Vec<_>>();

    match timeout(query_timeout, rows_future).await {
        Ok(results) => collect_rows(results),
        Err(_) => Err(timeout_error("query execution", query_timeout)),
    }
}

async fn describe_columns(conn: &mut SqliteConnection, sql: &str) -> Vec<ColumnMetadata> {
    match (&mut *conn).describe(sql).await {
        Ok(described) => described
            .columns()
            .iter()
            .map(|col| ColumnMetadata::new(col.name(), col.type_info().name()))
            .collect(),
        Err(e) => {
            debug!(error = %e, "Could not describe result columns");
            Vec::new()
        }
    }
}

fn collect_rows<R>(results: Vec<Result<R, sqlx::Error>>) -> AskResult<Vec<R>> {
    let mut rows = Vec::with_capacity(results.len());
    for result in results {
        rows.push(result.map_err(AskError::from)?);
    }
    Ok(rows)
}

fn timeout_error(operation: &str, timeout: Duration) -> AskError {
    AskError::timeout(operation, timeout.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_defaults() {
        let executor = QueryExecutor::new();
        assert_eq!(
            executor.default_timeout,
            Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS)
        );
        assert_eq!(executor.default_limit, DEFAULT_ROW_LIMIT);
        assert_eq!(executor.access(), AccessMode::ReadOnly);
    }

    #[test]
    fn test_executor_custom_settings() {
        let executor = QueryExecutor::with_defaults(60, 500).with_access(AccessMode::ReadWrite);
        assert_eq!(executor.default_timeout, Duration::from_secs(60));
        assert_eq!(executor.default_limit, 500);
        assert!(executor.access().is_writable());
    }

    #[test]
    fn test_executor_limit_capped() {
        assert_eq!(
            QueryExecutor::with_defaults(30, 99999).default_limit,
            MAX_ROW_LIMIT
        );
        assert_eq!(QueryExecutor::with_defaults(30, 0).default_limit, 1);
    }
}
