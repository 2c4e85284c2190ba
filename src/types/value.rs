//! Scalar values read back from SQLite and their textual rendering.

use rusqlite::types::ValueRef;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single scalar cell from a result or sample row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Render as a literal the way prompts show it.
    ///
    /// Text is single-quoted, everything else is written in its literal
    /// form (`NULL`, `42`, `3.5`, `X'00ff'`).
    ///
    /// # Example
    ///
    /// ```
    /// # use sqlask::types::SqlValue;
    /// assert_eq!(SqlValue::Text("Ann".into()).render_literal(), "'Ann'");
    /// assert_eq!(SqlValue::Integer(7).render_literal(), "7");
    /// assert_eq!(SqlValue::Null.render_literal(), "NULL");
    /// ```
    pub fn render_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Integer(i) => i.to_string(),
            // Debug keeps the fractional part ("1.0" rather than "1")
            Self::Real(r) => format!("{:?}", r),
            Self::Text(s) => format!("'{}'", s),
            Self::Blob(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                format!("X'{}'", hex)
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(r) => Self::Real(r),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

impl fmt::Display for SqlValue {
    /// Plain display for tables: no quoting, empty cell for NULL.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            other => f.write_str(&other.render_literal()),
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Real(r) => serializer.serialize_f64(*r),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Blob(_) => serializer.serialize_str(&self.render_literal()),
        }
    }
}

/// Render a row as a parenthesised tuple: `(1, 'Ann', NULL)`.
pub fn render_row(values: &[SqlValue]) -> String {
    let cells: Vec<String> = values.iter().map(SqlValue::render_literal).collect();
    format!("({})", cells.join(", "))
}
