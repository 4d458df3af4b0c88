//! Turn raw model output into a single executable SQL statement.
//!
//! Models wrap SQL in markdown fences, put a sentence in front of it, or
//! append an explanation after it. [`clean_sql`] removes all of that:
//!
//! 1. when the reply holds a fenced block, only the block's contents are
//!    kept; any other code-fence markers (with an optional `sql`/`sqlite`
//!    tag) are dropped
//! 2. everything before the earliest statement keyword is dropped
//! 3. everything after the first terminating `;` is dropped, and a `;` is
//!    appended when there is none
//!
//! Applying [`clean_sql`] to its own output returns the output unchanged.

use regex::Regex;
use std::sync::LazyLock;

/// Keywords a statement may start with.
const STATEMENT_KEYWORDS: &str =
    "SELECT|WITH|INSERT|UPDATE|DELETE|REPLACE|CREATE|DROP|ALTER|PRAGMA|EXPLAIN|VALUES";

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)`{3,}[ \t]*(?:sqlite3?|sql)?").expect("valid regex"));

// Keyword at the start of a line, any case
static LINE_START_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m)^[ \t]*(?i:({STATEMENT_KEYWORDS}))\b")).expect("valid regex")
});

// Upper-case keyword anywhere, for "Here is your query: SELECT ..."
static UPPER_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b({STATEMENT_KEYWORDS})\b")).expect("valid regex")
});

static LOWER_SELECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(select)\b").expect("valid regex"));

/// Clean raw completion text into one SQL statement ending in `;`.
///
/// Returns an empty string when the input holds nothing but whitespace and
/// fences. Text without any statement keyword is kept (trimmed) so that
/// SQLite reports what is wrong with it.
pub fn clean_sql(raw: &str) -> String {
    let unfenced = unfence(raw);
    let start = statement_start(&unfenced).unwrap_or(0);
    let statement = unfenced[start..].trim();

    if statement.is_empty() {
        return String::new();
    }

    terminate(statement)
}

/// Contents of the first fenced block, or the text with every fence marker
/// removed when there is no non-empty block.
fn unfence(text: &str) -> String {
    let mut fences = FENCE.find_iter(text);
    if let (Some(open), Some(close)) = (fences.next(), fences.next()) {
        let body = &text[open.end()..close.start()];
        if !body.trim().is_empty() {
            return body.to_string();
        }
    }
    FENCE.replace_all(text, "").into_owned()
}

/// Byte offset of the earliest statement keyword found by any rule.
fn statement_start(text: &str) -> Option<usize> {
    [&*LINE_START_KEYWORD, &*UPPER_KEYWORD, &*LOWER_SELECT]
        .into_iter()
        .filter_map(|re| re.captures(text).and_then(|c| c.get(1)).map(|m| m.start()))
        .min()
}

/// Keep text up to and including the first `;` outside quotes, or append one.
fn terminate(statement: &str) -> String {
    match first_terminator(statement) {
        Some(end) => statement[..=end].to_string(),
        None if statement.ends_with(';') => statement.to_string(),
        None => format!("{statement};"),
    }
}

/// Byte offset of the first `;` not inside a string literal or quoted identifier.
///
/// SQLite quotes with `'...'`, `"..."`, `` `...` `` and `[...]`. A doubled quote
/// inside a literal closes and reopens it, which leaves the state unchanged.
fn first_terminator(sql: &str) -> Option<usize> {
    let mut closing: Option<char> = None;

    for (idx, ch) in sql.char_indices() {
        match closing {
            Some(close) if ch == close => closing = None,
            Some(_) => {}
            None => match ch {
                ';' => return Some(idx),
                '\'' | '"' | '`' => closing = Some(ch),
                '[' => closing = Some(']'),
                _ => {}
            },
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_sql_fence() {
        assert_eq!(clean_sql("```sql\nSELECT * FROM t\n```"), "SELECT * FROM t;");
    }

    #[test]
    fn test_strips_fence_variants() {
        assert_eq!(clean_sql("```SQLite\nSELECT 1\n```"), "SELECT 1;");
        assert_eq!(clean_sql("```\nSELECT 1;\n```"), "SELECT 1;");
        assert_eq!(clean_sql("``` sql SELECT 1 ```"), "SELECT 1;");
    }

    #[test]
    fn test_drops_leading_prose() {
        assert_eq!(clean_sql("Here is your query: SELECT 1;"), "SELECT 1;");
        assert_eq!(
            clean_sql("Sure! The query is:\n\nselect name from students;"),
            "select name from students;"
        );
    }

    #[test]
    fn test_appends_missing_terminator() {
        assert_eq!(clean_sql("SELECT 1"), "SELECT 1;");
        assert_eq!(clean_sql("  SELECT 1  \n"), "SELECT 1;");
    }

    #[test]
    fn test_truncates_after_first_statement() {
        assert_eq!(
            clean_sql("SELECT COUNT(*) FROM STUDENT; This counts the rows."),
            "SELECT COUNT(*) FROM STUDENT;"
        );
        assert_eq!(clean_sql("SELECT 1; SELECT 2;"), "SELECT 1;");
    }

    #[test]
    fn test_semicolon_inside_quotes_is_not_a_terminator() {
        assert_eq!(
            clean_sql("SELECT * FROM t WHERE a = 'x;y'; trailing"),
            "SELECT * FROM t WHERE a = 'x;y';"
        );
        assert_eq!(
            clean_sql("SELECT \"a;b\", [c;d], `e;f` FROM t"),
            "SELECT \"a;b\", [c;d], `e;f` FROM t;"
        );
        assert_eq!(clean_sql("SELECT 'it''s; fine';"), "SELECT 'it''s; fine';");
    }

    #[test]
    fn test_earliest_keyword_wins() {
        assert_eq!(
            clean_sql(
                "Here is your query: SELECT COUNT(*) FROM students;\nWith this query you get the number of rows."
            ),
            "SELECT COUNT(*) FROM students;"
        );
        assert_eq!(
            clean_sql("Use this: SELECT NAME FROM students;\nSelect more columns if needed."),
            "SELECT NAME FROM students;"
        );
        assert_eq!(
            clean_sql("Try this:\nWith totals AS (SELECT 1) SELECT * FROM totals"),
            "With totals AS (SELECT 1) SELECT * FROM totals;"
        );
    }

    #[test]
    fn test_closing_fence_ends_statement() {
        assert_eq!(
            clean_sql("```sql\nSELECT COUNT(*) FROM students\n```\nThis counts the rows."),
            "SELECT COUNT(*) FROM students;"
        );
        assert_eq!(
            clean_sql("Sure, WITH pleasure:\n```sql\nSELECT 1\n```\nSELECT 2"),
            "SELECT 1;"
        );
        // An empty block does not hide the statement around it
        assert_eq!(clean_sql("```sql\n```\nSELECT 1"), "SELECT 1;");
    }

    #[test]
    fn test_patterns_compile() {
        for re in [&*FENCE, &*LINE_START_KEYWORD, &*UPPER_KEYWORD, &*LOWER_SELECT] {
            assert!(!re.as_str().is_empty());
        }
    }

    #[test]
    fn test_keyword_must_be_a_whole_word() {
        assert_eq!(
            clean_sql("selected rows: SELECT name FROM t"),
            "SELECT name FROM t;"
        );
    }

    #[test]
    fn test_text_without_keyword_is_kept() {
        assert_eq!(clean_sql("I cannot answer that"), "I cannot answer that;");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_sql(""), "");
        assert_eq!(clean_sql("   \n\t"), "");
        assert_eq!(clean_sql("```sql\n```"), "");
    }

    #[test]
    fn test_unterminated_quote_is_stable() {
        let once = clean_sql("SELECT 'abc");
        assert_eq!(once, "SELECT 'abc;");
        assert_eq!(clean_sql(&once), once);
    }

    #[test]
    fn test_idempotent_on_examples() {
        for raw in [
            "```sql\nSELECT * FROM t\n```",
            "Here is your query: SELECT 1;",
            "SELECT 1",
            "SELECT * FROM STUDENT where CLASS=\"Data Science\";",
            "explanation first\nselect 1; select 2",
            "```sql\nSELECT 1\n```\nWith this you get one.",
            "no sql at all",
        ] {
            let once = clean_sql(raw);
            assert_eq!(clean_sql(&once), once, "not idempotent for {raw:?}");
        }
    }
}
