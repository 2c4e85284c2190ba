//! Integration tests for schema introspection against real database files.

mod common;

use common::{connect, database_with, shop_db};
use sqlask::schema::{introspect, Probe};
use sqlask::{AskError, DatabaseHandle};
use std::collections::HashSet;

#[test]
fn test_one_block_per_user_table() {
    let (_dir, handle) = shop_db();
    let schema = introspect(&handle).unwrap();

    assert_eq!(schema.len(), 3);
    let text = schema.render();
    let blocks: Vec<&str> = text.split("\n\n").collect();
    assert_eq!(blocks.len(), 3);

    let names: HashSet<&str> = blocks
        .iter()
        .map(|b| b.lines().next().unwrap().trim_start_matches("Table: "))
        .collect();
    assert_eq!(names, HashSet::from(["customers", "orders", "tags"]));
}

#[test]
fn test_columns_in_physical_order() {
    let (_dir, handle) = shop_db();
    let schema = introspect(&handle).unwrap();

    let orders = schema.table("orders").unwrap();
    assert_eq!(orders.column_names(), vec!["id", "customer_id", "total", "placed_at"]);
}

#[test]
fn test_orders_block_layout() {
    let (_dir, handle) = shop_db();
    let schema = introspect(&handle).unwrap();
    let block = schema.table("orders").unwrap().render();

    assert_eq!(
        block,
        "Table: orders\n\
         Columns: id (INTEGER) PRIMARY KEY, customer_id (INTEGER) NOT NULL, total (REAL) DEFAULT 0, placed_at (TEXT)\n\
         Foreign Keys: customer_id -> customers(id)\n\
         Indexes: idx_orders_customer on (customer_id, placed_at)\n\
         Sample Data: (1, 1, 19.5, '2024-03-01'); (2, 1, 5.0, '2024-03-09'); (3, 2, 42.25, '2024-04-11')\n\
         Row Count: 3"
    );
}

#[test]
fn test_optional_lines_absent() {
    let (_dir, handle) = shop_db();
    let schema = introspect(&handle).unwrap();

    // No foreign keys, no user index, no rows
    let tags = schema.table("tags").unwrap().render();
    assert_eq!(tags, "Table: tags\nColumns: label (TEXT)\nRow Count: 0");

    let customers = schema.table("customers").unwrap().render();
    assert!(!customers.contains("Foreign Keys:"));
    assert!(!customers.contains("Indexes:"));
    assert!(customers.contains("Sample Data: (1, 'Ann', 'New York'); (2, 'Bo', 'Boston')"));
}

#[test]
fn test_index_and_sample_reference_real_columns() {
    let (_dir, handle) = shop_db();
    let schema = introspect(&handle).unwrap();

    for table in &schema.tables {
        let columns: HashSet<&str> = table.column_names().into_iter().collect();
        for index in &table.indexes {
            for column in &index.columns {
                assert!(columns.contains(column.as_str()), "{} not in {}", column, table.name);
            }
        }
        if let Probe::Present(rows) = &table.sample_rows {
            assert!(rows.len() <= 3);
            assert!(rows.iter().all(|r| r.len() == table.columns.len()));
        }
    }
}

#[test]
fn test_generated_columns_listed_and_indexed() {
    let (_dir, handle) = database_with(
        "CREATE TABLE items (a INTEGER, g INTEGER AS (a * 2), b TEXT, c TEXT);
         CREATE INDEX idx_items_b ON items(b);
         CREATE TABLE lines (id INTEGER PRIMARY KEY, price REAL, total REAL AS (price * 2) STORED, name TEXT);
         CREATE INDEX idx_lines_name ON lines(name, total);
         INSERT INTO items (a, b, c) VALUES (1, 'bee', 'sea');
         INSERT INTO lines (price, name) VALUES (2.5, 'pen');",
    );
    let schema = introspect(&handle).unwrap();

    let items = schema.table("items").unwrap();
    assert_eq!(items.column_names(), vec!["a", "g", "b", "c"]);
    assert_eq!(items.indexes[0].columns, vec!["b"]);
    let rendered = items.render();
    assert!(rendered.contains("Indexes: idx_items_b on (b)\n"));
    assert!(rendered.contains("Sample Data: (1, 2, 'bee', 'sea')"));

    let lines = schema.table("lines").unwrap();
    assert_eq!(lines.column_names(), vec!["id", "price", "total", "name"]);
    assert_eq!(lines.indexes[0].columns, vec!["name", "total"]);

    for table in [items, lines] {
        let Probe::Present(rows) = &table.sample_rows else {
            panic!("sample rows missing for {}", table.name);
        };
        assert!(rows.iter().all(|r| r.len() == table.columns.len()));
    }
}

#[test]
fn test_unreadable_sample_omitted_per_table() {
    // The virtual column is added after the row exists, so only reads that
    // compute it hit abs() overflow. COUNT(*) never does.
    let (_dir, handle) = database_with(
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT);
         INSERT INTO customers (name, city) VALUES ('Ann', 'New York');
         CREATE TABLE ledger (amount INTEGER);
         INSERT INTO ledger VALUES (-9223372036854775808);
         ALTER TABLE ledger ADD COLUMN magnitude INTEGER AS (abs(amount));",
    );
    let schema = introspect(&handle).unwrap();

    assert_eq!(schema.len(), 2);
    let ledger = schema.table("ledger").unwrap();
    assert_eq!(ledger.column_names(), vec!["amount", "magnitude"]);
    assert!(ledger.sample_rows.is_omitted());
    assert_eq!(ledger.row_count, Probe::Present(1));

    let rendered = ledger.render();
    assert!(!rendered.contains("Sample Data"));
    assert!(rendered.ends_with("Row Count: 1"));

    let customers = schema.table("customers").unwrap().render();
    assert!(customers.contains("Sample Data: (1, 'Ann', 'New York')"));
    assert!(schema.render().contains("Table: ledger\n"));
}

#[test]
fn test_unique_constraint_index_hidden() {
    let (_dir, handle) = database_with(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT UNIQUE);
         CREATE INDEX idx_users_email ON users(email);",
    );
    let schema = introspect(&handle).unwrap();
    let users = schema.table("users").unwrap();

    let names: Vec<&str> = users.indexes.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["idx_users_email"]);
}

#[test]
fn test_quoted_table_names() {
    let (_dir, handle) = database_with(
        "CREATE TABLE \"order lines\" (\"line id\" INTEGER, qty INTEGER);
         INSERT INTO \"order lines\" VALUES (1, 4);",
    );
    let schema = introspect(&handle).unwrap();
    let table = schema.table("order lines").unwrap();

    assert_eq!(table.column_names(), vec!["line id", "qty"]);
    assert_eq!(table.row_count, Probe::Present(1));
}

#[test]
fn test_empty_database_has_no_blocks() {
    let (_dir, handle) = database_with("PRAGMA user_version = 1;");
    let schema = introspect(&handle).unwrap();

    assert!(schema.is_empty());
    assert_eq!(schema.render(), "");
}

#[test]
fn test_introspection_is_not_cached() {
    let (_dir, handle) = shop_db();
    let before = introspect(&handle).unwrap();

    connect(&handle)
        .execute_batch("CREATE TABLE refunds (id INTEGER PRIMARY KEY, order_id INTEGER REFERENCES orders(id));")
        .unwrap();

    let after = introspect(&handle).unwrap();
    assert_eq!(after.len(), before.len() + 1);
    let refunds = after.table("refunds").unwrap().render();
    assert!(refunds.contains("Foreign Keys: order_id -> orders(id)"));
}

#[test]
fn test_foreign_key_without_target_column() {
    let (_dir, handle) = database_with(
        "CREATE TABLE parents (id INTEGER PRIMARY KEY);
         CREATE TABLE children (parent_id INTEGER REFERENCES parents);",
    );
    let schema = introspect(&handle).unwrap();
    let children = schema.table("children").unwrap().render();
    assert!(children.contains("Foreign Keys: parent_id -> parents\n"));
}

#[test]
fn test_missing_file_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let handle = DatabaseHandle::new(dir.path().join("missing.db"));

    let err = introspect(&handle).unwrap_err();
    assert!(matches!(err, AskError::SchemaIntrospection(_)));
    assert!(!dir.path().join("missing.db").exists());
}
