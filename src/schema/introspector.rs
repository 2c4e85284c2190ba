//! Schema introspection against a live SQLite database.

use crate::database::DatabaseHandle;
use crate::query::executor::read_rows;
use crate::query::AccessMode;
use crate::schema::catalog;
use crate::schema::description::{
    ColumnDescription, ForeignKeyDescription, IndexDescription, Probe, SchemaDescription,
    TableDescription,
};
use crate::telemetry::{db_span, record_db_metrics, DbOperation};
use crate::types::{AskError, Result, SqlValue};
use rusqlite::Connection;

/// Reads the catalog of one database into a [`SchemaDescription`].
///
/// Opens its own read-only connection per call; nothing is cached, so a
/// second call sees any change made in between.
pub struct SchemaIntrospector<'a> {
    handle: &'a DatabaseHandle,
}

impl<'a> SchemaIntrospector<'a> {
    pub fn new(handle: &'a DatabaseHandle) -> Self {
        Self { handle }
    }

    /// Describe every user table.
    ///
    /// # Errors
    ///
    /// Returns `AskError::SchemaIntrospection` if the database cannot be
    /// opened, or if tables, columns, foreign keys or indexes cannot be read.
    /// Sample-row and row-count failures never fail the call; they show up
    /// as [`Probe::Omitted`] on the affected table.
    pub fn introspect(&self) -> Result<SchemaDescription> {
        self.handle.validate()?;
        let conn = self
            .handle
            .connect(AccessMode::ReadOnly)
            .map_err(|e| schema_error("open database", &self.handle.to_string(), e))?;

        let names = self.list_tables(&conn)?;
        let mut tables = Vec::with_capacity(names.len());
        for name in &names {
            tables.push(self.describe_table(&conn, name)?);
        }

        tracing::debug!(database = %self.handle, tables = tables.len(), "Schema introspected");
        Ok(SchemaDescription { tables })
    }

    fn namespace(&self) -> String {
        self.handle.to_string()
    }

    fn list_tables(&self, conn: &Connection) -> Result<Vec<String>> {
        let ns = self.namespace();
        let span = db_span(DbOperation::ListTables, None, Some(&ns));
        let _guard = span.enter();

        let names = (|| {
            let mut stmt = conn.prepare(catalog::TABLES_QUERY)?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })()
        .map_err(|e| schema_error("list tables", &ns, e))?;

        record_db_metrics(&span, names.len());
        Ok(names)
    }

    fn describe_table(&self, conn: &Connection, table: &str) -> Result<TableDescription> {
        let ns = self.namespace();

        let columns = {
            let span = db_span(DbOperation::TableInfo, Some(table), Some(&ns));
            let _guard = span.enter();
            read_columns(conn, table).map_err(|e| schema_error("read columns of", table, e))?
        };

        let foreign_keys = {
            let span = db_span(DbOperation::ForeignKeys, Some(table), Some(&ns));
            let _guard = span.enter();
            read_foreign_keys(conn, table)
                .map_err(|e| schema_error("read foreign keys of", table, e))?
        };

        let indexes = {
            let span = db_span(DbOperation::Indexes, Some(table), Some(&ns));
            let _guard = span.enter();
            read_indexes(conn, table, &columns)
                .map_err(|e| schema_error("read indexes of", table, e))?
        };

        let sample_rows = {
            let span = db_span(DbOperation::Sample, Some(table), Some(&ns));
            let _guard = span.enter();
            probe(table, "sample rows", read_sample(conn, table))
        };

        let row_count = {
            let span = db_span(DbOperation::Count, Some(table), Some(&ns));
            let _guard = span.enter();
            probe(table, "row count", read_count(conn, table))
        };

        Ok(TableDescription {
            name: table.to_string(),
            columns,
            foreign_keys,
            indexes,
            sample_rows,
            row_count,
        })
    }
}

/// Describe `handle` in one call.
pub fn introspect(handle: &DatabaseHandle) -> Result<SchemaDescription> {
    SchemaIntrospector::new(handle).introspect()
}

fn schema_error(action: &str, target: &str, err: rusqlite::Error) -> AskError {
    AskError::SchemaIntrospection(format!("failed to {} {}: {}", action, target, err))
}

/// Turn a best-effort read into a probe outcome.
fn probe<T>(table: &str, what: &str, result: rusqlite::Result<T>) -> Probe<T> {
    match result {
        Ok(value) => Probe::Present(value),
        Err(e) => {
            tracing::debug!(table, probe = what, error = %e, "Probe omitted");
            Probe::Omitted {
                reason: e.to_string(),
            }
        }
    }
}

fn read_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ColumnDescription>> {
    let mut stmt = conn.prepare(&catalog::table_xinfo(table))?;
    let rows = stmt.query_map([], |row| {
        let hidden: i64 = row.get(6)?;
        let column = ColumnDescription {
            name: row.get(1)?,
            declared_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            not_null: row.get::<_, i64>(3)? != 0,
            default: row.get(4)?,
            primary_key: row.get::<_, i64>(5)? > 0,
        };
        Ok((hidden != catalog::HIDDEN_VTAB_COLUMN).then_some(column))
    })?;
    let mut columns = Vec::new();
    for row in rows {
        columns.extend(row?);
    }
    Ok(columns)
}

fn read_foreign_keys(
    conn: &Connection,
    table: &str,
) -> rusqlite::Result<Vec<ForeignKeyDescription>> {
    let mut stmt = conn.prepare(&catalog::foreign_key_list(table))?;
    let rows = stmt.query_map([], |row| {
        Ok(ForeignKeyDescription {
            target_table: row.get(2)?,
            column: row.get(3)?,
            target_column: row.get(4)?,
        })
    })?;
    rows.collect()
}

fn read_indexes(
    conn: &Connection,
    table: &str,
    columns: &[ColumnDescription],
) -> rusqlite::Result<Vec<IndexDescription>> {
    let names: Vec<String> = {
        let mut stmt = conn.prepare(&catalog::index_list(table))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    let mut indexes = Vec::new();
    for name in names
        .into_iter()
        .filter(|n| !n.starts_with(catalog::SYSTEM_INDEX_PREFIX))
    {
        let mut stmt = conn.prepare(&catalog::index_info(&name))?;
        let refs = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(1)?, row.get::<_, Option<String>>(2)?))
        })?;

        let mut index_columns = Vec::new();
        for entry in refs {
            let (cid, reported) = entry?;
            index_columns.push(resolve_index_column(cid, reported, columns));
        }
        indexes.push(IndexDescription {
            name,
            columns: index_columns,
        });
    }
    Ok(indexes)
}

/// Resolve an index column reference.
///
/// The name SQLite reports wins; the physical position is the fallback, and
/// expressions (no name, negative cid) render as `<expression>`.
fn resolve_index_column(cid: i64, reported: Option<String>, columns: &[ColumnDescription]) -> String {
    reported
        .or_else(|| {
            usize::try_from(cid)
                .ok()
                .and_then(|pos| columns.get(pos))
                .map(|c| c.name.clone())
        })
        .unwrap_or_else(|| "<expression>".to_string())
}

fn read_sample(conn: &Connection, table: &str) -> rusqlite::Result<Vec<Vec<SqlValue>>> {
    let mut stmt = conn.prepare(&catalog::sample_rows(table))?;
    read_rows(&mut stmt)
}

fn read_count(conn: &Connection, table: &str) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row(&catalog::row_count(table), [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}
