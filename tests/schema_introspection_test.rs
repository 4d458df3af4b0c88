//! Integration tests for schema introspection.
//!
//! Tests verify that:
//! - Every user table appears exactly once, in creation order
//! - Columns keep declaration order, types, nullability and primary keys
//! - Views are only described when asked for
//! - Unreadable databases produce error text instead of failing

mod common;

use askdb::db::{Database, SchemaInspector, is_error_text};
use askdb::error::AskError;
use askdb::models::TableType;
use common::{create_db, students_db};

#[tokio::test]
async fn test_students_schema() {
    let (_dir, db) = students_db().await;

    let schema = SchemaInspector::new().describe(&db).await.unwrap();
    assert_eq!(schema.table_names(), vec!["students"]);

    let students = schema.table("students").unwrap();
    let names: Vec<&str> = students.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["NAME", "COURSE", "SECTION", "MARKS"]);
    assert_eq!(students.columns[0].data_type, "VARCHAR(25)");
    assert_eq!(students.columns[3].data_type, "INT");
    assert!(students.columns.iter().all(|c| c.nullable));
    assert!(students.primary_key().is_empty());
}

#[tokio::test]
async fn test_every_table_listed_once_in_creation_order() {
    let (_dir, db) = create_db(&[
        "CREATE TABLE zebra (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)",
        "CREATE TABLE apple (id INTEGER PRIMARY KEY)",
        "CREATE INDEX idx_zebra_name ON zebra(name)",
        "CREATE TABLE mango (id INTEGER, code TEXT UNIQUE)",
        "INSERT INTO zebra (name) VALUES ('z')",
    ])
    .await;

    let schema = SchemaInspector::new().describe(&db).await.unwrap();
    // sqlite_sequence (from AUTOINCREMENT) and indexes are not user tables
    assert_eq!(schema.table_names(), vec!["zebra", "apple", "mango"]);
}

#[tokio::test]
async fn test_column_constraints() {
    let (_dir, db) = create_db(&[
        "CREATE TABLE enrollments (
            student_id INTEGER NOT NULL,
            course_id INTEGER NOT NULL,
            grade TEXT DEFAULT 'n/a',
            note,
            PRIMARY KEY (student_id, course_id)
        )",
    ])
    .await;

    let schema = SchemaInspector::new().describe(&db).await.unwrap();
    let table = schema.table("enrollments").unwrap();

    assert_eq!(table.primary_key(), vec!["student_id", "course_id"]);
    assert!(!table.columns[0].nullable);
    assert!(table.columns[2].nullable);
    assert_eq!(table.columns[2].default_value.as_deref(), Some("'n/a'"));
    assert_eq!(table.columns[3].data_type, "");

    let text = schema.to_string();
    assert!(text.contains("  - student_id (INTEGER, not null, primary key)"));
    assert!(text.contains("  - note (untyped, nullable)"));
}

#[tokio::test]
async fn test_foreign_keys_described() {
    let (_dir, db) = create_db(&[
        "CREATE TABLE students (id INTEGER PRIMARY KEY, name TEXT)",
        "CREATE TABLE marks (student_id INTEGER REFERENCES students(id), score INT)",
    ])
    .await;

    let schema = SchemaInspector::new().describe(&db).await.unwrap();
    let marks = schema.table("marks").unwrap();
    assert_eq!(marks.foreign_keys.len(), 1);
    assert_eq!(marks.foreign_keys[0].references_table, "students");
    assert!(
        schema
            .to_string()
            .contains("FOREIGN KEY student_id REFERENCES students(id)")
    );
}

#[tokio::test]
async fn test_views_only_when_requested() {
    let (_dir, db) = create_db(&[
        common::STUDENTS_SCHEMA,
        "CREATE VIEW top_students AS SELECT NAME, MARKS FROM students WHERE MARKS > 80",
    ])
    .await;

    let without = SchemaInspector::new().describe(&db).await.unwrap();
    assert_eq!(without.table_names(), vec!["students"]);

    let with = SchemaInspector::new()
        .with_views(true)
        .describe(&db)
        .await
        .unwrap();
    assert_eq!(with.table_names(), vec!["students", "top_students"]);

    let view = with.table("top_students").unwrap();
    assert_eq!(view.table_type, TableType::View);
    assert_eq!(view.columns.len(), 2);
    assert!(with.to_string().contains("View: top_students"));
}

#[tokio::test]
async fn test_empty_database() {
    let (_dir, db) = create_db(&[]).await;

    let schema = SchemaInspector::new().describe(&db).await.unwrap();
    assert!(schema.is_empty());
    assert_eq!(SchemaInspector::new().render(&db).await, "(no tables)\n");
}

#[tokio::test]
async fn test_render_matches_description() {
    let (_dir, db) = students_db().await;

    let text = SchemaInspector::new().render(&db).await;
    assert!(!is_error_text(&text));
    assert!(text.starts_with("Table: students\n  - NAME (VARCHAR(25), nullable)\n"));
}

#[tokio::test]
async fn test_missing_database_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("student.db");
    let db = Database::new(&path);

    let err = SchemaInspector::new().describe(&db).await.unwrap_err();
    assert!(matches!(err, AskError::Schema { .. }));
    assert!(!path.exists(), "introspection must not create the file");

    let text = SchemaInspector::new().render(&db).await;
    assert!(is_error_text(&text));
}

#[tokio::test]
async fn test_describe_is_repeatable() {
    let (_dir, db) = students_db().await;
    let inspector = SchemaInspector::new();

    // Each call opens and closes its own connection
    let first = inspector.describe(&db).await.unwrap();
    let second = inspector.describe(&db).await.unwrap();
    assert_eq!(first, second);
}
