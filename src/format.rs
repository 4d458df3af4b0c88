//! Output formatting for answers.
//!
//! Renders a [`QueryResult`] as an ASCII table (like the sqlite3/MySQL CLIs),
//! a Markdown table, or JSON, and an [`Answer`] as the generated SQL followed
//! by its result or error.

use crate::config::OutputFormat;
use crate::models::{Answer, QueryResult};
use serde_json::{Value as JsonValue, json};
use unicode_width::UnicodeWidthStr;

pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

fn rows_label(count: usize) -> &'static str {
    if count == 1 { "row" } else { "rows" }
}

pub fn format_as_table(result: &QueryResult) -> String {
    if let Some(affected) = result.rows_affected {
        return format!(
            "Query OK, {} {} affected ({:.2} sec)\n",
            affected,
            rows_label(affected as usize),
            result.execution_time_ms as f64 / 1000.0
        );
    }
    if result.columns.is_empty() || result.rows.is_empty() {
        return format!(
            "Empty set ({:.2} sec)\n",
            result.execution_time_ms as f64 / 1000.0
        );
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(format_value).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.name.width()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut output = String::new();
    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    let header: String = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("| {} ", pad(&col.name, *w, Align::Center)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for (values, row) in result.rows.iter().zip(&cells) {
        let row_str: String = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = row.get(i).map(String::as_str).unwrap_or("NULL");
                let align = match values.get(i) {
                    Some(JsonValue::Number(_)) => Align::Right,
                    _ => Align::Left,
                };
                format!("| {} ", pad(cell, *w, align))
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&separator);

    let row_count = result.row_count();
    output.push_str(&format!(
        "{} {} in set ({:.2} sec)\n",
        row_count,
        rows_label(row_count),
        result.execution_time_ms as f64 / 1000.0
    ));
    if result.truncated {
        output.push_str("(output truncated at the row limit)\n");
    }

    output
}

pub fn format_as_markdown(result: &QueryResult) -> String {
    if let Some(affected) = result.rows_affected {
        return format!("*{} {} affected*\n", affected, rows_label(affected as usize));
    }
    if result.columns.is_empty() {
        return "*Empty set*\n".to_string();
    }

    let mut output = String::new();

    let header: String = result
        .columns
        .iter()
        .map(|c| format!("| {} ", escape_markdown(&c.name)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);

    let sep: String = result.columns.iter().map(|_| "|---").collect::<String>() + "|\n";
    output.push_str(&sep);

    for row in &result.rows {
        let row_str: String = row
            .iter()
            .map(|value| format!("| {} ", escape_markdown(&format_value(value))))
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    let row_count = result.row_count();
    output.push_str(&format!("\n*{} {}*\n", row_count, rows_label(row_count)));

    output
}

pub fn format_as_json(result: &QueryResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_default()
}

pub fn format_result(result: &QueryResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_as_table(result),
        OutputFormat::Markdown => format_as_markdown(result),
        OutputFormat::Json => format_as_json(result),
    }
}

/// Render the generated SQL followed by its result or error.
pub fn render_answer(answer: &Answer, format: OutputFormat) -> String {
    if let OutputFormat::Json = format {
        let value = match &answer.outcome {
            Ok(result) => json!({
                "question": answer.question,
                "sql": answer.sql,
                "result": result,
            }),
            Err(e) => json!({
                "question": answer.question,
                "sql": answer.sql,
                "error": e.to_string(),
                "suggestion": e.suggestion(),
            }),
        };
        return serde_json::to_string_pretty(&value).unwrap_or_default();
    }

    let sql = match format {
        OutputFormat::Markdown => format!("```sql\n{}\n```\n\n", answer.sql),
        _ => format!("SQL: {}\n\n", answer.sql),
    };
    let body = match &answer.outcome {
        Ok(result) => format_result(result, format),
        Err(e) => format!("{}\n", e.user_message()),
    };
    sql + &body
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
    Center,
}

/// Pad `text` to `width` terminal columns.
fn pad(text: &str, width: usize, align: Align) -> String {
    let fill = width.saturating_sub(text.width());
    match align {
        Align::Left => format!("{}{}", text, " ".repeat(fill)),
        Align::Right => format!("{}{}", " ".repeat(fill), text),
        Align::Center => {
            let left = fill / 2;
            format!("{}{}{}", " ".repeat(left), text, " ".repeat(fill - left))
        }
    }
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
