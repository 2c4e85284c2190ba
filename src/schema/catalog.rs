//! SQLite catalog queries.
//!
//! Centralizes the `sqlite_master` / PRAGMA text used by the introspector so
//! the introspection logic stays free of SQLite syntax details.

/// User tables in native catalog order. `sqlite_*` tables are internal.
pub const TABLES_QUERY: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";

/// Prefix SQLite gives to indexes it creates itself (UNIQUE / PRIMARY KEY).
pub const SYSTEM_INDEX_PREFIX: &str = "sqlite_";

/// Maximum sample rows shown per table.
pub const SAMPLE_ROW_LIMIT: usize = 3;

/// Quote an identifier for interpolation: `my "t"` -> `"my ""t"""`.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Columns: `cid, name, type, notnull, dflt_value, pk, hidden`.
///
/// Unlike `table_info` this lists generated columns, so `cid` lines up with
/// `index_info` positions and with `SELECT *` output.
pub fn table_xinfo(table: &str) -> String {
    format!("PRAGMA table_xinfo({})", quote_ident(table))
}

/// `hidden` value of a virtual-table column that `SELECT *` leaves out.
/// Generated columns report 2 (virtual) or 3 (stored) and are listed.
pub const HIDDEN_VTAB_COLUMN: i64 = 1;

/// Foreign keys: `id, seq, table, from, to, on_update, on_delete, match`.
pub fn foreign_key_list(table: &str) -> String {
    format!("PRAGMA foreign_key_list({})", quote_ident(table))
}

/// Indexes: `seq, name, unique, origin, partial`.
pub fn index_list(table: &str) -> String {
    format!("PRAGMA index_list({})", quote_ident(table))
}

/// Index columns: `seqno, cid, name`. `cid` is -1 for rowid, -2 for expressions.
pub fn index_info(index: &str) -> String {
    format!("PRAGMA index_info({})", quote_ident(index))
}

pub fn sample_rows(table: &str) -> String {
    format!("SELECT * FROM {} LIMIT {}", quote_ident(table), SAMPLE_ROW_LIMIT)
}

pub fn row_count(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("customers"), "\"customers\"");
        assert_eq!(quote_ident("order items"), "\"order items\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_statements() {
        assert_eq!(table_xinfo("t"), "PRAGMA table_xinfo(\"t\")");
        assert_eq!(sample_rows("t"), "SELECT * FROM \"t\" LIMIT 3");
        assert_eq!(row_count("t"), "SELECT COUNT(*) FROM \"t\"");
    }
}
