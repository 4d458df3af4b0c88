//! Scoped SQLite connections.
//!
//! There is no long-lived pool: every operation opens its own connection with
//! [`Database::connect`] and hands it back with [`release`] before returning,
//! whether the operation succeeded or not.

use crate::error::{AskError, AskResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How a connection may touch the database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    #[default]
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn from_writable(writable: bool) -> Self {
        if writable {
            Self::ReadWrite
        } else {
            Self::ReadOnly
        }
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

impl std::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// A SQLite database file. Holds only the path; no connection outlives a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path as shown in messages and schema headers.
    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }

    /// Open a new connection. Never creates the file.
    pub async fn connect(&self, mode: AccessMode) -> AskResult<SqliteConnection> {
        if !self.path.is_file() {
            return Err(AskError::query(
                format!("Database file not found: {}", self.display_name()),
                None,
                "Check the --database path",
            ));
        }

        debug!(path = %self.display_name(), mode = %mode, "Opening SQLite connection");

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .read_only(!mode.is_writable())
            .create_if_missing(false);

        Ok(options.connect().await?)
    }
}

/// Close a connection, logging instead of failing if SQLite complains.
pub async fn release(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        warn!(error = %e, "Failed to close SQLite connection cleanly");
    }
}
