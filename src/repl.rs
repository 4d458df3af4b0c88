//! Interactive question loop.
//!
//! Reads one question per line and prints the generated SQL with its result.
//! Lines starting with `.` are commands:
//!
//! - `.schema` prints the loaded schema description
//! - `.reload` reads the schema from the database again
//! - `.help` lists the commands
//! - `.quit` / `.exit` end the session (as does end of input or Ctrl-C)
//!
//! A failing question prints its error and the loop continues.

use crate::config::OutputFormat;
use crate::db::{Database, SchemaInspector};
use crate::error::{AskError, AskResult};
use crate::format::render_answer;
use crate::models::SchemaDescription;
use crate::pipeline::QueryPipeline;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::signal;
use tracing::{debug, info};

const PROMPT: &str = "askdb> ";

const HELP: &str = "\
Type a question in plain English, or one of:
  .schema   show the database schema
  .reload   re-read the schema from the database
  .help     show this message
  .quit     leave (also .exit, Ctrl-D)
";

/// Whether the loop keeps reading after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Quit,
}

pub struct Repl {
    pipeline: QueryPipeline,
    inspector: SchemaInspector,
    db: Database,
    format: OutputFormat,
    schema: SchemaDescription,
}

impl Repl {
    /// Introspect `db` and start a session. Fails if the schema cannot be read.
    pub async fn load(
        pipeline: QueryPipeline,
        inspector: SchemaInspector,
        db: Database,
        format: OutputFormat,
    ) -> AskResult<Self> {
        let schema = inspector.describe(&db).await?;
        Ok(Self {
            pipeline,
            inspector,
            db,
            format,
            schema,
        })
    }

    /// Handle one input line and return the text to print.
    pub async fn handle_line(&mut self, line: &str) -> (Step, String) {
        let line = line.trim();
        match line {
            "" => (Step::Continue, String::new()),
            ".quit" | ".exit" => (Step::Quit, String::new()),
            ".help" => (Step::Continue, HELP.to_string()),
            ".schema" => (Step::Continue, self.schema.to_string()),
            ".reload" => (Step::Continue, self.reload().await),
            cmd if cmd.starts_with('.') => (
                Step::Continue,
                format!("Unknown command: {cmd}. Type .help for the list.\n"),
            ),
            question => (Step::Continue, self.ask(question).await),
        }
    }

    /// Read lines from `input` until `.quit`, end of input or Ctrl-C.
    pub async fn run<R, W>(&mut self, input: R, output: W) -> AskResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let ctrl_c = async {
            // Without a handler the session only ends from input
            if signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        self.run_until(input, output, ctrl_c).await
    }

    /// Like [`Repl::run`], but stops when `interrupt` completes, whether the
    /// session is waiting for input or working on a question.
    pub async fn run_until<R, W, F>(
        &mut self,
        input: R,
        mut output: W,
        interrupt: F,
    ) -> AskResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        let mut lines = input.lines();
        write_out(&mut output, &self.schema.to_string()).await?;
        write_out(&mut output, "\nType .help for commands.\n").await?;

        loop {
            write_out(&mut output, PROMPT).await?;

            let line = tokio::select! {
                line = lines.next_line() => line.map_err(io_error)?,
                _ = &mut interrupt => {
                    info!("Interrupted");
                    None
                }
            };
            let Some(line) = line else {
                write_out(&mut output, "\n").await?;
                break;
            };

            let handled = tokio::select! {
                handled = self.handle_line(&line) => Some(handled),
                _ = &mut interrupt => {
                    info!("Interrupted while answering");
                    None
                }
            };
            let Some((step, text)) = handled else {
                write_out(&mut output, "\n").await?;
                break;
            };

            write_out(&mut output, &text).await?;
            if step == Step::Quit {
                break;
            }
        }
        debug!("Session ended");
        Ok(())
    }

    async fn reload(&mut self) -> String {
        match self.inspector.describe(&self.db).await {
            Ok(schema) => {
                let text = format!("Reloaded {} table(s).\n", schema.tables.len());
                self.schema = schema;
                text
            }
            // Keep the previous schema usable
            Err(e) => format!("{}\n", e.user_message()),
        }
    }

    async fn ask(&self, question: &str) -> String {
        match self.pipeline.answer(question, &self.schema, &self.db).await {
            Ok(answer) => render_answer(&answer, self.format),
            Err(e) => format!("{}\n", e.user_message()),
        }
    }
}

async fn write_out<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> AskResult<()> {
    output.write_all(text.as_bytes()).await.map_err(io_error)?;
    output.flush().await.map_err(io_error)
}

fn io_error(e: std::io::Error) -> AskError {
    AskError::internal(format!("Terminal I/O failed: {e}"))
}
