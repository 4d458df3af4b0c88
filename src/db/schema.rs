//! Schema introspection module.
//!
//! Reads table and column definitions out of a SQLite file and turns them into
//! a [`SchemaDescription`]. The connection is opened read-only and closed
//! before returning.
//!
//! Two entry points:
//! - [`SchemaInspector::describe`] returns a `Result` for callers that branch on failure.
//! - [`SchemaInspector::render`] always returns text; on failure the text is an
//!   error description (see [`is_error_text`]) so a caller can show it in place of
//!   the schema without crashing.

use crate::db::connection::{AccessMode, Database, release};
use crate::error::AskResult;
use crate::models::{ColumnDefinition, ForeignKey, SchemaDescription, TableSchema, TableType};
use sqlx::Row;
use sqlx::sqlite::SqliteConnection;
use tracing::{debug, warn};

/// Prefix of the text [`SchemaInspector::render`] produces on failure.
pub const SCHEMA_ERROR_PREFIX: &str = "Schema error:";

/// True if `text` came from a failed [`SchemaInspector::render`].
pub fn is_error_text(text: &str) -> bool {
    text.starts_with(SCHEMA_ERROR_PREFIX)
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    // sqlite_master rowid follows creation order
    pub const LIST_TABLES: &str = r#"
        SELECT name, type FROM sqlite_master
        WHERE type = 'table'
        AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
        ORDER BY rowid
        "#;

    pub const LIST_TABLES_WITH_VIEWS: &str = r#"
        SELECT name, type FROM sqlite_master
        WHERE type IN ('table', 'view')
        AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
        ORDER BY rowid
        "#;

    pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT name, type, "notnull", dflt_value, pk
        FROM pragma_table_info(?)
        ORDER BY cid
        "#;

    pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT "from", "table", "to"
        FROM pragma_foreign_key_list(?)
        ORDER BY id, seq
        "#;
}

/// Schema inspector for database introspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaInspector {
    include_views: bool,
}

impl SchemaInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also describe views (they are queryable like tables).
    pub fn with_views(mut self, include_views: bool) -> Self {
        self.include_views = include_views;
        self
    }

    /// Describe every user table in `db`.
    pub async fn describe(&self, db: &Database) -> AskResult<SchemaDescription> {
        let name = db.display_name();
        let mut conn = db
            .connect(AccessMode::ReadOnly)
            .await
            .map_err(|e| e.into_schema(&name))?;

        let tables = self.read_tables(&mut conn).await;
        release(conn).await;
        let tables = tables.map_err(|e| e.into_schema(&name))?;

        debug!(database = %name, tables = tables.len(), "Described schema");
        Ok(SchemaDescription::new(name, tables))
    }

    /// Describe `db` as prompt-ready text. Never fails: errors come back as text
    /// starting with [`SCHEMA_ERROR_PREFIX`].
    pub async fn render(&self, db: &Database) -> String {
        match self.describe(db).await {
            Ok(schema) => schema.to_string(),
            Err(e) => {
                warn!(database = %db.display_name(), error = %e, "Schema introspection failed");
                // AskError::Schema already displays with the prefix
                e.to_string()
            }
        }
    }

    async fn read_tables(&self, conn: &mut SqliteConnection) -> AskResult<Vec<TableSchema>> {
        let query = if self.include_views {
            queries::LIST_TABLES_WITH_VIEWS
        } else {
            queries::LIST_TABLES
        };
        let rows = sqlx::query(query).fetch_all(&mut *conn).await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get("name")?;
            let type_str: String = row.try_get("type")?;

            let mut table = TableSchema::new(&name, TableType::parse(&type_str));
            table.columns = fetch_columns(conn, &name).await?;
            table.foreign_keys = fetch_foreign_keys(conn, &name).await;
            tables.push(table);
        }
        Ok(tables)
    }
}

async fn fetch_columns(
    conn: &mut SqliteConnection,
    table_name: &str,
) -> AskResult<Vec<ColumnDefinition>> {
    let rows = sqlx::query(queries::DESCRIBE_COLUMNS)
        .bind(table_name)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| -> AskResult<ColumnDefinition> {
            let name: String = row.try_get("name")?;
            let data_type: String = row.try_get::<Option<String>, _>("type")?.unwrap_or_default();
            let notnull: i64 = row.try_get("notnull")?;
            let default_value: Option<String> = row.try_get("dflt_value").ok().flatten();
            let pk: i64 = row.try_get("pk")?;

            let mut col =
                ColumnDefinition::new(name, data_type, notnull == 0).with_primary_key(pk > 0);
            if let Some(def) = default_value {
                col = col.with_default(def);
            }
            Ok(col)
        })
        .collect()
}

/// Foreign keys are context for the model, not required; failures yield none.
async fn fetch_foreign_keys(conn: &mut SqliteConnection, table_name: &str) -> Vec<ForeignKey> {
    let rows = sqlx::query(queries::DESCRIBE_FOREIGN_KEYS)
        .bind(table_name)
        .fetch_all(&mut *conn)
        .await
        .unwrap_or_default();

    rows.iter()
        .filter_map(|row| {
            let column: String = row.try_get("from").ok()?;
            let ref_table: String = row.try_get("table").ok()?;
            let ref_column: Option<String> = row.try_get("to").ok().flatten();
            Some(ForeignKey::new(
                column,
                ref_table,
                ref_column.unwrap_or_default(),
            ))
        })
        .collect()
}
