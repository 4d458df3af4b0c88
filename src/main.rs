//! askdb - Main entry point.
//!
//! Ask a SQLite database questions in plain English from the command line.

use askdb::config::{Command, Config};
use askdb::db::{AccessMode, Database, QueryExecutor, SchemaInspector, is_error_text};
use askdb::error::AskResult;
use askdb::format::render_answer;
use askdb::llm::ChatCompletionClient;
use askdb::pipeline::QueryPipeline;
use askdb::repl::Repl;
use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging. Logs go to stderr; stdout carries results.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn build_pipeline(config: &Config) -> AskResult<QueryPipeline> {
    let client = ChatCompletionClient::new(config.completion_settings()?)?;
    let executor = QueryExecutor::with_defaults(config.query_timeout, config.effective_row_limit())
        .with_access(AccessMode::from_writable(config.writable));
    Ok(QueryPipeline::new(Arc::new(client), executor))
}

/// Run the selected command. `Ok(false)` means it ran but the answer was a failure.
async fn run(config: &Config) -> AskResult<bool> {
    let db = Database::new(config.database_path()?);
    let inspector = SchemaInspector::new().with_views(config.include_views);

    match &config.command {
        Command::Schema => {
            let text = inspector.render(&db).await;
            print!("{text}");
            Ok(!is_error_text(&text))
        }
        Command::Ask { question } => {
            let schema = inspector.describe(&db).await?;
            let pipeline = build_pipeline(config)?;
            let answer = pipeline.answer(&question.join(" "), &schema, &db).await?;
            println!("{}", render_answer(&answer, config.format).trim_end());
            Ok(answer.is_success())
        }
        Command::Repl => {
            let pipeline = build_pipeline(config)?;
            let mut repl = Repl::load(pipeline, inspector, db, config.format).await?;
            repl.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await?;
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; the key may already be in the environment
    dotenv().ok();

    let config = Config::parse();
    init_tracing(&config);

    info!(
        database = ?config.database,
        model = %config.model,
        writable = config.writable,
        "Starting askdb v{}",
        env!("CARGO_PKG_VERSION")
    );

    match run(&config).await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!(error = %e, "askdb failed");
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}
