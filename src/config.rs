//! Configuration handling for askdb.
//!
//! Configuration comes from CLI arguments with environment variable fallbacks.
//! The API key is only ever read from the environment (or a `.env` file).

use crate::error::{AskError, AskResult};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ROW_LIMIT: u32 = 100;
pub const MAX_ROW_LIMIT: u32 = 10000;

/// Environment variable holding the completion API key.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// How query results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table (like the sqlite3 / MySQL CLI)
    #[default]
    Table,
    /// Markdown table
    Markdown,
    /// JSON document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// What to do once the database is loaded.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the schema description of the database
    Schema,
    /// Answer a single question and exit
    Ask {
        /// The question, in plain English
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Read questions from stdin, one per line
    Repl,
}

/// Settings for the chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub api_base: Url,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

/// Configuration for askdb.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "askdb",
    about = "Ask a SQLite database questions in plain English",
    version,
    author
)]
pub struct Config {
    /// Path to the SQLite database file
    #[arg(
        short = 'd',
        long = "database",
        value_name = "PATH",
        env = "ASKDB_DATABASE",
        global = true
    )]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,

    /// Base URL of an OpenAI-compatible chat-completion API
    #[arg(long, default_value = DEFAULT_API_BASE, env = "ASKDB_API_BASE", global = true)]
    pub api_base: String,

    /// Model identifier sent with every completion request
    #[arg(long, default_value = DEFAULT_MODEL, env = "ASKDB_MODEL", global = true)]
    pub model: String,

    /// Sampling temperature
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE, env = "ASKDB_TEMPERATURE", global = true)]
    pub temperature: f32,

    /// Upper bound on tokens generated per answer
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS, env = "ASKDB_MAX_TOKENS", global = true)]
    pub max_tokens: u32,

    /// Completion request timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS,
        env = "ASKDB_REQUEST_TIMEOUT",
        global = true
    )]
    pub request_timeout: u64,

    /// Query timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_QUERY_TIMEOUT_SECS,
        env = "ASKDB_QUERY_TIMEOUT",
        global = true
    )]
    pub query_timeout: u64,

    /// Maximum rows printed per answer (max: 10000)
    #[arg(long, default_value_t = DEFAULT_ROW_LIMIT, env = "ASKDB_ROW_LIMIT", global = true)]
    pub row_limit: u32,

    /// Output format for results
    #[arg(long, value_enum, default_value = "table", env = "ASKDB_FORMAT", global = true)]
    pub format: OutputFormat,

    /// Open the database read-write so generated INSERT/UPDATE/DELETE statements run
    #[arg(long, env = "ASKDB_WRITABLE", global = true)]
    pub writable: bool,

    /// Include views in the schema description
    #[arg(long, env = "ASKDB_INCLUDE_VIEWS", global = true)]
    pub include_views: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "ASKDB_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "ASKDB_JSON_LOGS", global = true)]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            database: Some(PathBuf::from("student.db")),
            command: Command::Schema,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            row_limit: DEFAULT_ROW_LIMIT,
            format: OutputFormat::Table,
            writable: false,
            include_views: false,
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }

    /// The `--database` path; required by every command.
    pub fn database_path(&self) -> AskResult<&Path> {
        self.database
            .as_deref()
            .ok_or_else(|| AskError::config("No database given. Pass --database <PATH>."))
    }

    /// Row limit clamped to [1, MAX_ROW_LIMIT].
    pub fn effective_row_limit(&self) -> u32 {
        self.row_limit.clamp(1, MAX_ROW_LIMIT)
    }

    /// Build completion settings, taking the key from the environment.
    pub fn completion_settings(&self) -> AskResult<CompletionSettings> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        self.completion_settings_with_key(api_key)
    }

    /// Build completion settings with an explicit API key.
    pub fn completion_settings_with_key(
        &self,
        api_key: impl Into<String>,
    ) -> AskResult<CompletionSettings> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AskError::config(format!(
                "{API_KEY_ENV} is not set. Export it or add it to a .env file."
            )));
        }

        let api_base = Url::parse(self.api_base.trim_end_matches('/'))
            .map_err(|e| AskError::config(format!("Invalid --api-base '{}': {e}", self.api_base)))?;
        if !matches!(api_base.scheme(), "http" | "https") {
            return Err(AskError::config(format!(
                "--api-base must be an http(s) URL, got scheme '{}'",
                api_base.scheme()
            )));
        }

        if self.model.trim().is_empty() {
            return Err(AskError::config("--model must not be empty"));
        }

        Ok(CompletionSettings {
            api_base,
            api_key,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            request_timeout: Duration::from_secs(self.request_timeout),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.format, OutputFormat::Table);
        assert!(!config.writable);
    }

    #[test]
    fn test_row_limit_clamped() {
        let zero = Config {
            row_limit: 0,
            ..Config::default()
        };
        let huge = Config {
            row_limit: 99999,
            ..Config::default()
        };
        assert_eq!(zero.effective_row_limit(), 1);
        assert_eq!(huge.effective_row_limit(), MAX_ROW_LIMIT);
    }

    #[test]
    fn test_completion_settings_requires_key() {
        let result = Config::default().completion_settings_with_key("  ");
        let err = result.unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn test_completion_settings_rejects_bad_url() {
        let config = Config {
            api_base: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.completion_settings_with_key("k").is_err());

        let config = Config {
            api_base: "ftp://example.com".to_string(),
            ..Config::default()
        };
        let err = config.completion_settings_with_key("k").unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn test_completion_settings_trims_trailing_slash() {
        let config = Config {
            api_base: "http://localhost:8000/v1/".to_string(),
            ..Config::default()
        };
        let settings = config.completion_settings_with_key("secret").unwrap();
        assert_eq!(settings.api_base.as_str(), "http://localhost:8000/v1");
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_missing_database_is_config_error() {
        let config = Config {
            database: None,
            ..Config::default()
        };
        assert!(matches!(
            config.database_path().unwrap_err(),
            AskError::Config { .. }
        ));
    }

    #[test]
    fn test_parse_ask_command() {
        let config = Config::parse_from([
            "askdb",
            "ask",
            "--database",
            "student.db",
            "How",
            "many",
            "entries?",
            "--format",
            "json",
        ]);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.database_path().unwrap(), Path::new("student.db"));
        match config.command {
            Command::Ask { question } => assert_eq!(question.join(" "), "How many entries?"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
