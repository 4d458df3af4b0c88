//! Error types for askdb.
//!
//! This module defines all error types using `thiserror`. Schema and query
//! failures are the two kinds a user sees during normal use; the remaining
//! variants cover the completion API, configuration and input validation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AskError {
    #[error("Schema error: {message} (database: {database})")]
    Schema { message: String, database: String },

    #[error("Query error: {message}")]
    Query {
        message: String,
        /// SQLite extended result code, e.g. "1" for SQLITE_ERROR
        code: Option<String>,
        suggestion: String,
    },

    #[error("Completion API error: {message}")]
    Completion { message: String, suggestion: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AskError {
    /// Create a schema error for the given database path.
    pub fn schema(message: impl Into<String>, database: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            database: database.into(),
        }
    }

    /// Create a query error with an optional SQLite result code.
    pub fn query(
        message: impl Into<String>,
        code: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Query {
            message: message.into(),
            code,
            suggestion: suggestion.into(),
        }
    }

    /// Create a completion API error with a helpful suggestion.
    pub fn completion(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Completion {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Query { suggestion, .. } => Some(suggestion),
            Self::Completion { suggestion, .. } => Some(suggestion),
            Self::Timeout { .. } => Some("Increase the timeout or simplify the question"),
            _ => None,
        }
    }

    /// True for failures of the generated SQL itself (including timeouts while running it).
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::Query { .. } | Self::Timeout { .. })
    }

    /// Text shown to the user: the error plus its suggestion, if any.
    pub fn user_message(&self) -> String {
        match self.suggestion() {
            Some(s) => format!("{self}\nHint: {s}"),
            None => self.to_string(),
        }
    }
}

/// Convert sqlx errors to AskError.
///
/// Everything the driver reports while running generated SQL is a query error;
/// callers that introspect the schema remap these with [`AskError::into_schema`].
impl From<sqlx::Error> for AskError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                AskError::query(
                    db_err.message(),
                    code,
                    "Check the generated SQL against the schema and rephrase the question",
                )
            }
            sqlx::Error::RowNotFound => AskError::query(
                "No rows returned",
                None,
                "Verify the question matches existing data",
            ),
            sqlx::Error::ColumnNotFound(col) => AskError::query(
                format!("Column not found: {}", col),
                None,
                "Check the column names in the schema",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                AskError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => AskError::internal(format!("Decode error: {}", source)),
            sqlx::Error::Io(io_err) => AskError::query(
                format!("I/O error: {}", io_err),
                None,
                "Check that the database file is readable",
            ),
            sqlx::Error::Configuration(msg) => AskError::query(
                msg.to_string(),
                None,
                "Check the database path",
            ),
            sqlx::Error::WorkerCrashed => AskError::internal("Database worker crashed"),
            _ => AskError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Convert reqwest errors to AskError.
impl From<reqwest::Error> for AskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AskError::completion(
                format!("Request timed out: {}", err),
                "Increase --request-timeout or try again",
            )
        } else if err.is_connect() {
            AskError::completion(
                format!("Could not reach the completion API: {}", err),
                "Check network connectivity and --api-base",
            )
        } else if err.is_decode() {
            AskError::completion(
                format!("Malformed completion response: {}", err),
                "Check that --api-base points to an OpenAI-compatible endpoint",
            )
        } else {
            AskError::completion(err.to_string(), "Check the API key and model name")
        }
    }
}

impl AskError {
    /// Re-label a driver error raised while reading the schema of `database`.
    pub fn into_schema(self, database: &str) -> Self {
        match self {
            Self::Schema { .. } => self,
            Self::Query { message, .. } | Self::Internal { message } => {
                Self::schema(message, database)
            }
            other => Self::schema(other.to_string(), database),
        }
    }
}

/// Result type alias for askdb operations.
pub type AskResult<T> = Result<T, AskError>;
