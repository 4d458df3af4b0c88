//! Statement guard for generated SQL.
//!
//! Classifies a cleaned statement as reading or writing so that writes can be
//! refused before they reach a read-only database, with a message that says
//! how to allow them. Uses [sqlparser](https://docs.rs/sqlparser/) with the
//! SQLite dialect; formatting tricks and comments do not change the result.
//!
//! Statements sqlparser cannot parse are not rejected here. SQLite has the
//! final word on them, and a read-only connection refuses writes regardless.

use crate::db::AccessMode;
use crate::error::{AskError, AskResult};
use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use tracing::debug;

/// What a statement does to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT, WITH ... SELECT, VALUES, read-only PRAGMA, EXPLAIN of a read
    Read,
    /// Modifies data or schema; carries the operation name for messages
    Write(&'static str),
    /// sqlparser could not parse it
    Unparsed,
}

impl StatementKind {
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write(_))
    }
}

/// Classify `sql`. Multiple statements count as a write if any of them is one.
pub fn classify(sql: &str) -> StatementKind {
    let statements = match Parser::parse_sql(&SQLiteDialect {}, sql) {
        Ok(statements) if !statements.is_empty() => statements,
        Ok(_) => return StatementKind::Unparsed,
        Err(e) => {
            debug!(error = %e, "sqlparser could not parse generated SQL");
            return StatementKind::Unparsed;
        }
    };

    statements
        .iter()
        .map(classify_statement)
        .find(StatementKind::is_write)
        .unwrap_or(StatementKind::Read)
}

/// Classify `sql` and refuse writes when the database is opened read-only.
pub fn check_access(sql: &str, access: AccessMode) -> AskResult<StatementKind> {
    let kind = classify(sql);
    match kind {
        StatementKind::Write(operation) if !access.is_writable() => Err(AskError::query(
            format!("{operation} is not allowed on a read-only database"),
            None,
            "Rephrase the question as a lookup, or pass --writable to allow changes",
        )),
        _ => Ok(kind),
    }
}

fn classify_statement(stmt: &Statement) -> StatementKind {
    match stmt {
        Statement::Query(_) => StatementKind::Read,
        Statement::ExplainTable { .. } => StatementKind::Read,
        Statement::Pragma { value: None, .. } => StatementKind::Read,
        Statement::Pragma { .. } => StatementKind::Write("PRAGMA assignment"),

        // EXPLAIN does not run its statement, but a guard that lets
        // "EXPLAIN DELETE" through invites confusion; classify the inner one
        Statement::Explain { statement, .. } => classify_statement(statement),

        Statement::Insert(_) => StatementKind::Write("INSERT"),
        Statement::Update { .. } => StatementKind::Write("UPDATE"),
        Statement::Delete(_) => StatementKind::Write("DELETE"),

        Statement::CreateTable { .. } => StatementKind::Write("CREATE TABLE"),
        Statement::CreateView { .. } => StatementKind::Write("CREATE VIEW"),
        Statement::CreateIndex(_) => StatementKind::Write("CREATE INDEX"),
        Statement::CreateTrigger { .. } => StatementKind::Write("CREATE TRIGGER"),
        Statement::CreateVirtualTable { .. } => StatementKind::Write("CREATE VIRTUAL TABLE"),
        Statement::AlterTable { .. } => StatementKind::Write("ALTER TABLE"),
        Statement::Drop { .. } => StatementKind::Write("DROP"),
        Statement::DropTrigger { .. } => StatementKind::Write("DROP TRIGGER"),

        Statement::StartTransaction { .. }
        | Statement::Commit { .. }
        | Statement::Rollback { .. }
        | Statement::Savepoint { .. }
        | Statement::ReleaseSavepoint { .. } => StatementKind::Write("Transaction control"),

        Statement::AttachDatabase { .. } => StatementKind::Write("ATTACH"),
        Statement::Vacuum { .. } => StatementKind::Write("VACUUM"),
        Statement::Analyze { .. } => StatementKind::Write("ANALYZE"),

        // Anything else parsed but unrecognized is treated as a write
        _ => StatementKind::Write("This statement"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_read() {
        assert_eq!(classify("SELECT * FROM students;"), StatementKind::Read);
        assert_eq!(
            classify("WITH t AS (SELECT 1 AS x) SELECT x FROM t;"),
            StatementKind::Read
        );
        assert_eq!(
            classify("SELECT a FROM t1 UNION ALL SELECT b FROM t2;"),
            StatementKind::Read
        );
    }

    #[test]
    fn test_dml_is_write() {
        assert_eq!(
            classify("INSERT INTO students VALUES ('a', 'b', 'c', 1);"),
            StatementKind::Write("INSERT")
        );
        assert_eq!(
            classify("UPDATE students SET MARKS = 0;"),
            StatementKind::Write("UPDATE")
        );
        assert_eq!(
            classify("DELETE FROM students WHERE MARKS < 10;"),
            StatementKind::Write("DELETE")
        );
    }

    #[test]
    fn test_ddl_is_write() {
        assert!(classify("CREATE TABLE t (id INTEGER);").is_write());
        assert!(classify("DROP TABLE students;").is_write());
        assert!(classify("ALTER TABLE students ADD COLUMN age INTEGER;").is_write());
    }

    #[test]
    fn test_insert_select_is_write() {
        let sql = "INSERT INTO archive SELECT * FROM students WHERE MARKS < 50;";
        assert_eq!(classify(sql), StatementKind::Write("INSERT"));
    }

    #[test]
    fn test_explain_follows_inner_statement() {
        assert_eq!(classify("EXPLAIN SELECT 1;"), StatementKind::Read);
        assert!(classify("EXPLAIN DELETE FROM students;").is_write());
    }

    #[test]
    fn test_unparseable_sql() {
        assert_eq!(classify("SELEC nonsense FROM;"), StatementKind::Unparsed);
        assert_eq!(classify(""), StatementKind::Unparsed);
    }

    #[test]
    fn test_any_write_makes_batch_a_write() {
        assert!(classify("SELECT 1; DELETE FROM students;").is_write());
    }

    #[test]
    fn test_read_only_blocks_writes() {
        let err = check_access("DELETE FROM students;", AccessMode::ReadOnly).unwrap_err();
        assert!(err.is_query_error());
        assert!(err.to_string().contains("DELETE"));
        assert!(err.suggestion().unwrap_or_default().contains("--writable"));
    }

    #[test]
    fn test_writable_allows_writes() {
        let kind = check_access("DELETE FROM students;", AccessMode::ReadWrite).unwrap();
        assert_eq!(kind, StatementKind::Write("DELETE"));
    }

    #[test]
    fn test_read_only_passes_reads_and_unparsed() {
        assert_eq!(
            check_access("SELECT 1;", AccessMode::ReadOnly).unwrap(),
            StatementKind::Read
        );
        assert_eq!(
            check_access("SELEC 1;", AccessMode::ReadOnly).unwrap(),
            StatementKind::Unparsed
        );
    }
}
