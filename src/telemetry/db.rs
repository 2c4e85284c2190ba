//! Database operation instrumentation.
//!
//! Follows the OpenTelemetry database span conventions for SQLite access.

use tracing::{field, span, Level, Span};

/// Database operation types (maps to `db.operation.name`).
#[derive(Debug, Clone, Copy)]
pub enum DbOperation {
    /// Enumerate user tables
    ListTables,
    /// Column metadata
    TableInfo,
    /// Foreign-key metadata
    ForeignKeys,
    /// Index list and index columns
    Indexes,
    /// Sample rows
    Sample,
    /// Row count
    Count,
    /// Generated statement execution
    Execute,
}

impl DbOperation {
    /// Get operation name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListTables => "list_tables",
            Self::TableInfo => "table_info",
            Self::ForeignKeys => "foreign_keys",
            Self::Indexes => "indexes",
            Self::Sample => "sample",
            Self::Count => "count",
            Self::Execute => "execute",
        }
    }
}

/// Create database operation span with semantic conventions.
///
/// # Arguments
///
/// * `operation` - Database operation type
/// * `table` - Table name (optional)
/// * `namespace` - Database file path (optional)
///
/// # Example
///
/// ```rust,ignore
/// let span = db_span(DbOperation::TableInfo, Some("customers"), Some("shop.db"));
/// let _guard = span.enter();
/// ```
pub fn db_span(operation: DbOperation, table: Option<&str>, namespace: Option<&str>) -> Span {
    let span_name = match table {
        Some(t) => format!("{} {}", operation.as_str(), t),
        None => operation.as_str().to_string(),
    };

    let span = span!(
        Level::DEBUG,
        "db",
        otel.name = %span_name,
        otel.kind = "client",
        db.system.name = "sqlite",
        db.operation.name = operation.as_str(),
        db.collection.name = field::Empty,
        db.namespace = field::Empty,
        db.response.returned_rows = field::Empty,
    );

    if let Some(t) = table {
        span.record("db.collection.name", t);
    }
    if let Some(ns) = namespace {
        span.record("db.namespace", ns);
    }

    span
}

/// Create span for executing a generated statement.
pub fn db_query_span(query_text: &str, namespace: Option<&str>) -> Span {
    let span = span!(
        Level::INFO,
        "db.query",
        otel.name = "execute",
        otel.kind = "client",
        db.system.name = "sqlite",
        db.operation.name = DbOperation::Execute.as_str(),
        db.query.text = query_text,
        db.namespace = field::Empty,
        db.response.returned_rows = field::Empty,
    );

    if let Some(ns) = namespace {
        span.record("db.namespace", ns);
    }

    span
}

/// Record returned row count on a db span.
pub fn record_db_metrics(span: &Span, rows_returned: usize) {
    span.record("db.response.returned_rows", rows_returned);
}
