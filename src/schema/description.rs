//! Schema description types and their prompt rendering.

use crate::types::{render_row, SqlValue};
use serde::Serialize;
use std::fmt;

/// Outcome of a best-effort, per-table probe (sample rows, row count).
///
/// An omitted probe is not an error: the table is still described, the
/// corresponding line is simply left out of the rendered block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Probe<T> {
    Present(T),
    Omitted { reason: String },
}

impl<T> Probe<T> {
    pub fn present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Omitted { .. } => None,
        }
    }

    pub fn is_omitted(&self) -> bool {
        matches!(self, Self::Omitted { .. })
    }
}

/// One column, in physical order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    pub name: String,
    /// Declared type as written in the DDL (may be empty in SQLite)
    pub declared_type: String,
    pub primary_key: bool,
    pub not_null: bool,
    /// Default expression text, as SQLite reports it
    pub default: Option<String>,
}

impl ColumnDescription {
    /// `name (TYPE) PRIMARY KEY NOT NULL DEFAULT value`
    pub fn render(&self) -> String {
        let mut constraints = Vec::new();
        if self.primary_key {
            constraints.push("PRIMARY KEY".to_string());
        }
        if self.not_null {
            constraints.push("NOT NULL".to_string());
        }
        if let Some(default) = &self.default {
            constraints.push(format!("DEFAULT {}", default));
        }
        format!("{} ({}) {}", self.name, self.declared_type, constraints.join(" "))
            .trim_end()
            .to_string()
    }
}

/// `column -> target_table(target_column)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKeyDescription {
    pub column: String,
    pub target_table: String,
    /// None when the reference implicitly targets the parent's primary key
    pub target_column: Option<String>,
}

impl ForeignKeyDescription {
    pub fn render(&self) -> String {
        match &self.target_column {
            Some(target) => format!("{} -> {}({})", self.column, self.target_table, target),
            None => format!("{} -> {}", self.column, self.target_table),
        }
    }
}

/// A user-created index with its columns in key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDescription {
    pub name: String,
    pub columns: Vec<String>,
}

impl IndexDescription {
    pub fn render(&self) -> String {
        format!("{} on ({})", self.name, self.columns.join(", "))
    }
}

/// Everything known about one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDescription {
    pub name: String,
    pub columns: Vec<ColumnDescription>,
    pub foreign_keys: Vec<ForeignKeyDescription>,
    pub indexes: Vec<IndexDescription>,
    /// Up to three rows, values in column order
    pub sample_rows: Probe<Vec<Vec<SqlValue>>>,
    pub row_count: Probe<u64>,
}

impl TableDescription {
    /// Column names in physical order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Render the table block.
    ///
    /// Optional lines (foreign keys, indexes, sample data, row count) are
    /// left out entirely when there is nothing to show.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("Table: {}", self.name)];

        let columns: Vec<String> = self.columns.iter().map(ColumnDescription::render).collect();
        lines.push(format!("Columns: {}", columns.join(", ")));

        if !self.foreign_keys.is_empty() {
            let fks: Vec<String> = self.foreign_keys.iter().map(ForeignKeyDescription::render).collect();
            lines.push(format!("Foreign Keys: {}", fks.join(", ")));
        }

        if !self.indexes.is_empty() {
            let idx: Vec<String> = self.indexes.iter().map(IndexDescription::render).collect();
            lines.push(format!("Indexes: {}", idx.join(", ")));
        }

        if let Some(rows) = self.sample_rows.present().filter(|rows| !rows.is_empty()) {
            let rendered: Vec<String> = rows.iter().map(|r| render_row(r)).collect();
            lines.push(format!("Sample Data: {}", rendered.join("; ")));
        }

        if let Some(count) = self.row_count.present() {
            lines.push(format!("Row Count: {}", count));
        }

        lines.join("\n")
    }
}

/// Structural description of a whole database, tables in native order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SchemaDescription {
    pub tables: Vec<TableDescription>,
}

impl SchemaDescription {
    pub fn table(&self, name: &str) -> Option<&TableDescription> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Render all table blocks separated by a blank line.
    pub fn render(&self) -> String {
        self.tables
            .iter()
            .map(TableDescription::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
