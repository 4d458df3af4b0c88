//! Prompt template for SQL generation.

/// System message sent with every request.
pub const SYSTEM_MESSAGE: &str =
    "You translate English questions into SQLite queries. Reply with SQL only.";

/// Build the user prompt for `question` against a database described by `schema_text`.
///
/// The schema text is embedded verbatim, so it should be the rendered
/// [`SchemaDescription`](crate::models::SchemaDescription).
pub fn build_prompt(schema_text: &str, question: &str) -> String {
    format!(
        r#"You are an expert in converting English questions to SQL queries.
The SQLite database has the following tables and columns:

{schema}

For example, for a table STUDENT with columns NAME, COURSE, SECTION and MARKS:
- "How many entries of records are present?" should become "SELECT COUNT(*) FROM STUDENT;"
- "Tell me all the students studying in Data Science COURSE?" should become "SELECT * FROM STUDENT WHERE COURSE='Data Science';"

Rules:
- Answer with exactly one SQLite statement ending in a semicolon.
- Use only the tables and columns listed above.
- Do not wrap the statement in ``` fences and do not write the word "sql" before it.
- No preamble and no explanation, only the SQL.

Question: {question}"#,
        schema = schema_text.trim_end(),
        question = question.trim(),
    )
}
