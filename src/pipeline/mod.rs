//! Question-to-answer pipeline.
//!
//! One question flows through these steps:
//! 1. build the prompt from the schema text and the question
//! 2. ask the completion API once
//! 3. clean the reply into a single statement ([`cleanup::clean_sql`])
//! 4. refuse writes on a read-only database ([`guard::check_access`])
//! 5. run the statement on a fresh connection
//!
//! Failures in steps 1-2 end the interaction with an error. Failures in
//! steps 3-5 are part of the [`Answer`], next to the SQL that caused them.

pub mod cleanup;
pub mod guard;

use crate::db::{Database, QueryExecutor};
use crate::error::{AskError, AskResult};
use crate::llm::{CompletionClient, build_prompt};
use crate::models::{Answer, QueryResult, SchemaDescription};
use guard::StatementKind;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use cleanup::clean_sql;

pub struct QueryPipeline {
    client: Arc<dyn CompletionClient>,
    executor: QueryExecutor,
}

impl QueryPipeline {
    pub fn new(client: Arc<dyn CompletionClient>, executor: QueryExecutor) -> Self {
        Self { client, executor }
    }

    /// Answer `question` about `db`, whose schema is `schema`.
    ///
    /// Returns `Err` only when no SQL could be produced (empty question or a
    /// failed completion call). Problems with the SQL itself are reported in
    /// [`Answer::outcome`].
    pub async fn answer(
        &self,
        question: &str,
        schema: &SchemaDescription,
        db: &Database,
    ) -> AskResult<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::invalid_input("Question must not be empty"));
        }

        let (raw_completion, sql) = self.generate_sql(question, &schema.to_string()).await?;
        let outcome = self.run(db, &sql).await;

        match &outcome {
            Ok(result) => info!(
                sql = %sql,
                rows = result.row_count(),
                elapsed_ms = result.execution_time_ms,
                "Question answered"
            ),
            Err(e) => warn!(sql = %sql, error = %e, "Generated SQL failed"),
        }

        Ok(Answer {
            question: question.to_string(),
            raw_completion,
            sql,
            outcome,
        })
    }

    /// Ask the model for SQL. Returns the raw reply and the cleaned statement.
    pub async fn generate_sql(
        &self,
        question: &str,
        schema_text: &str,
    ) -> AskResult<(String, String)> {
        let prompt = build_prompt(schema_text, question);
        debug!(prompt_chars = prompt.len(), "Built prompt");

        let raw = self.client.complete(&prompt).await?;
        let sql = clean_sql(&raw);
        debug!(raw = %raw, sql = %sql, "Cleaned completion");
        Ok((raw, sql))
    }

    /// Guard and execute one cleaned statement.
    pub async fn run(&self, db: &Database, sql: &str) -> AskResult<QueryResult> {
        if sql.is_empty() {
            return Err(AskError::query(
                "The model returned no SQL",
                None,
                "Rephrase the question",
            ));
        }

        match guard::check_access(sql, self.executor.access())? {
            StatementKind::Write(operation) => {
                debug!(operation, "Executing as write");
                self.executor.execute_write(db, sql).await
            }
            StatementKind::Read | StatementKind::Unparsed => {
                self.executor.execute_query(db, sql).await
            }
        }
    }
}
