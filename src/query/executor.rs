//! Statement execution against the turn's database.

use crate::database::DatabaseHandle;
use crate::query::{AccessMode, GeneratedQuery, QueryResult};
use crate::telemetry::{db_query_span, record_db_metrics};
use crate::types::{AskError, Result, SqlValue};
use rusqlite::Statement;

/// Runs one generated statement and collects every row it returns.
///
/// No rewriting, no parameters, no statement allow-list: in
/// [`AccessMode::ReadWrite`] any statement SQLite accepts runs, mutating
/// ones included. [`AccessMode::ReadOnly`] opens the file read-only and
/// rejects statements SQLite reports as writers before stepping them.
pub struct QueryExecutor<'a> {
    handle: &'a DatabaseHandle,
    mode: AccessMode,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(handle: &'a DatabaseHandle) -> Self {
        Self {
            handle,
            mode: AccessMode::default(),
        }
    }

    pub fn with_access_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Execute the statement exactly once.
    ///
    /// The connection is opened here and dropped before returning, on the
    /// error path too.
    ///
    /// # Errors
    ///
    /// Every failure (open, prepare, step, read-only rejection) is an
    /// `AskError::Execution` carrying the engine's message.
    pub fn execute(&self, query: &GeneratedQuery) -> Result<QueryResult> {
        let ns = self.handle.to_string();
        let span = db_query_span(query.as_str(), Some(&ns));
        let _guard = span.enter();

        let conn = self
            .handle
            .connect(self.mode)
            .map_err(|e| AskError::Execution(e.to_string()))?;

        let mut stmt = conn
            .prepare(query.as_str())
            .map_err(|e| AskError::Execution(e.to_string()))?;

        if self.mode == AccessMode::ReadOnly && !stmt.readonly() {
            return Err(AskError::Execution(format!(
                "statement rejected in read-only mode: {}",
                query
            )));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let rows = read_rows(&mut stmt).map_err(|e| AskError::Execution(e.to_string()))?;

        record_db_metrics(&span, rows.len());
        tracing::debug!(rows = rows.len(), columns = columns.len(), "Statement executed");

        Ok(QueryResult { columns, rows })
    }
}

/// Step a prepared statement to completion, converting every cell.
pub(crate) fn read_rows(stmt: &mut Statement<'_>) -> rusqlite::Result<Vec<Vec<SqlValue>>> {
    let width = stmt.column_count();
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(SqlValue::from(row.get_ref(i)?));
        }
        out.push(values);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use tempfile::{tempdir, TempDir};

    fn fixture() -> (TempDir, DatabaseHandle) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shop.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT);
                 INSERT INTO customers (name, city) VALUES ('Ann', 'New York'), ('Bo', 'Boston');",
            )
            .unwrap();
        let handle = DatabaseHandle::open(&path).unwrap();
        (dir, handle)
    }

    #[test]
    fn test_select_returns_rows_and_columns() {
        let (_dir, handle) = fixture();
        let result = QueryExecutor::new(&handle)
            .execute(&GeneratedQuery::new("SELECT name, city FROM customers ORDER BY id;"))
            .unwrap();

        assert_eq!(result.columns, vec!["name", "city"]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[0][0], SqlValue::Text("Ann".to_string()));
    }

    #[test]
    fn test_unknown_column_is_execution_error() {
        let (_dir, handle) = fixture();
        let err = QueryExecutor::new(&handle)
            .execute(&GeneratedQuery::new("SELECT salary FROM customers"))
            .unwrap_err();

        assert!(matches!(err, AskError::Execution(ref msg) if msg.contains("salary")));
    }

    #[test]
    fn test_write_runs_in_read_write_mode() {
        let (_dir, handle) = fixture();
        let executor = QueryExecutor::new(&handle);
        let result = executor
            .execute(&GeneratedQuery::new("DELETE FROM customers WHERE name = 'Bo'"))
            .unwrap();
        assert!(result.is_empty());

        let remaining = executor
            .execute(&GeneratedQuery::new("SELECT COUNT(*) FROM customers"))
            .unwrap();
        assert_eq!(remaining.rows, vec![vec![SqlValue::Integer(1)]]);
    }

    #[test]
    fn test_write_rejected_in_read_only_mode() {
        let (_dir, handle) = fixture();
        let executor = QueryExecutor::new(&handle).with_access_mode(AccessMode::ReadOnly);
        let err = executor
            .execute(&GeneratedQuery::new("DELETE FROM customers"))
            .unwrap_err();
        assert!(matches!(err, AskError::Execution(_)));

        let count = executor
            .execute(&GeneratedQuery::new("SELECT COUNT(*) FROM customers"))
            .unwrap();
        assert_eq!(count.rows, vec![vec![SqlValue::Integer(2)]]);
    }
}
