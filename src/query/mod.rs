//! Generated queries, their execution, and tabular results.

pub mod executor;

pub use executor::QueryExecutor;

use crate::types::{render_row, SqlValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether generated statements may modify the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Any statement SQLite accepts is executed.
    #[default]
    ReadWrite,
    /// Database opened read-only; writing statements are rejected.
    ReadOnly,
}

/// The single SQL statement extracted from a model response.
///
/// Not validated as SQL: an unusable statement surfaces as an execution
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GeneratedQuery(String);

impl GeneratedQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for GeneratedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rows returned by one statement, with the column names SQLite reported.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render rows as a tuple list: `[('Ann', 'New York'), (2, NULL)]`.
    pub fn render_rows(&self) -> String {
        let rendered: Vec<String> = self.rows.iter().map(|r| render_row(r)).collect();
        format!("[{}]", rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_rows() {
        let result = QueryResult {
            columns: vec!["name".into(), "n".into()],
            rows: vec![
                vec![SqlValue::Text("Ann".into()), SqlValue::Integer(2)],
                vec![SqlValue::Text("Bo".into()), SqlValue::Null],
            ],
        };
        assert_eq!(result.render_rows(), "[('Ann', 2), ('Bo', NULL)]");
        assert_eq!(QueryResult::default().render_rows(), "[]");
    }

    #[test]
    fn test_access_mode_serde() {
        let mode: AccessMode = serde_json::from_str("\"read_only\"").unwrap();
        assert_eq!(mode, AccessMode::ReadOnly);
        assert_eq!(AccessMode::default(), AccessMode::ReadWrite);
    }
}
