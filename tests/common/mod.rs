//! Shared fixtures for integration tests.

#![allow(dead_code)]

use askdb::db::Database;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection};
use tempfile::TempDir;

pub const STUDENTS_SCHEMA: &str =
    "CREATE TABLE students (NAME VARCHAR(25), COURSE VARCHAR(25), SECTION VARCHAR(25), MARKS INT)";

pub const STUDENTS_ROWS: &str = "INSERT INTO students VALUES
    ('Krish', 'Data Science', 'A', 90),
    ('Sudhanshu', 'Data Science', 'B', 100),
    ('Darius', 'Data Science', 'A', 86),
    ('Vikash', 'DEVOPS', 'A', 50),
    ('Dipesh', 'DEVOPS', 'A', 35)";

/// Create a database file in a fresh temp dir and run `statements` against it.
///
/// The returned `TempDir` owns the file; keep it alive for the duration of the test.
pub async fn create_db(statements: &[&str]) -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");

    let mut conn = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete)
        .connect()
        .await
        .unwrap();
    for sql in statements {
        sqlx::query(sql).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();

    (dir, Database::new(path))
}

/// The five-row students database used across tests.
pub async fn students_db() -> (TempDir, Database) {
    create_db(&[STUDENTS_SCHEMA, STUDENTS_ROWS]).await
}

/// Count rows in `table` over a separate connection.
pub async fn count_rows(db: &Database, table: &str) -> i64 {
    let mut conn = SqliteConnectOptions::new()
        .filename(db.path())
        .read_only(true)
        .connect()
        .await
        .unwrap();
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();
    count
}
