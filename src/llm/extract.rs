//! Cutting the SQL statement out of a raw model response.

use crate::query::GeneratedQuery;
use crate::types::{AskError, Result};
use serde::{Deserialize, Serialize};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

/// Leading words that mark a line as the start of a statement.
const STATEMENT_KEYWORDS: &[&str] = &[
    "SELECT", "WITH", "INSERT", "UPDATE", "DELETE", "REPLACE", "CREATE", "DROP", "ALTER",
    "PRAGMA", "EXPLAIN", "VALUES",
];

/// How a statement is taken from the model's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPolicy {
    /// Trim, keep the first line.
    #[default]
    FirstLine,
    /// Unwrap a markdown fence, skip commentary, stop after the first `;`
    /// outside quotes and comments.
    SingleStatement,
}

impl ExtractionPolicy {
    /// Apply the policy to a raw response.
    ///
    /// # Errors
    ///
    /// Returns `AskError::Synthesis` if nothing is left after extraction
    pub fn extract(&self, raw: &str) -> Result<GeneratedQuery> {
        let sql = match self {
            Self::FirstLine => first_line(raw),
            Self::SingleStatement => single_statement(raw),
        };

        if sql.is_empty() {
            return Err(AskError::Synthesis(
                "malformed response: no SQL statement found".to_string(),
            ));
        }
        Ok(GeneratedQuery::new(sql))
    }
}

fn first_line(raw: &str) -> String {
    raw.trim()
        .split('\n')
        .next()
        .unwrap_or_default()
        .trim_end()
        .to_string()
}

fn single_statement(raw: &str) -> String {
    let body = unfence(raw.trim());

    let lines: Vec<&str> = body.lines().collect();
    let start = lines
        .iter()
        .position(|line| starts_statement(line))
        .unwrap_or(0);
    let text = lines[start..].join("\n");

    match statement_end(&text) {
        Some(end) => text[..=end].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Content of the first ``` fence, or the input when there is none.
fn unfence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after = &text[open + 3..];
    // Skip the info string (```sql)
    let body = match after.find('\n') {
        Some(nl) => &after[nl + 1..],
        None => after,
    };
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

fn starts_statement(line: &str) -> bool {
    let word: String = line
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let word = word.to_ascii_uppercase();
    STATEMENT_KEYWORDS.contains(&word.as_str())
}

/// Byte offset of the first `;` that is a statement terminator.
///
/// Quotes, identifiers and comments are handled by the SQLite tokenizer.
fn statement_end(text: &str) -> Option<usize> {
    let dialect = SQLiteDialect {};
    let tokens = match Tokenizer::new(&dialect, text).tokenize_with_location() {
        Ok(tokens) => tokens,
        Err(e) => {
            // Unterminated quote or comment: the text before it still tokenizes
            let cut = byte_offset(text, e.location.line, e.location.column)?;
            Tokenizer::new(&dialect, &text[..cut])
                .tokenize_with_location()
                .ok()?
        }
    };
    let semi = tokens.iter().find(|t| t.token == Token::SemiColon)?;
    let offset = byte_offset(text, semi.location.line, semi.location.column)?;
    text[offset..].starts_with(';').then_some(offset)
}

/// Convert a 1-based line/column (columns in chars) to a byte offset.
fn byte_offset(text: &str, line: u64, column: u64) -> Option<usize> {
    let mut offset = 0;
    for (i, l) in text.split('\n').enumerate() {
        if i as u64 + 1 == line {
            let col = usize::try_from(column.checked_sub(1)?).ok()?;
            return l.char_indices().nth(col).map(|(b, _)| offset + b);
        }
        offset += l.len() + 1;
    }
    None
}
