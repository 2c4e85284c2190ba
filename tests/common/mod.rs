//! Fixture databases shared by the integration tests.

#![allow(dead_code)]

use rusqlite::Connection;
use sqlask::DatabaseHandle;
use tempfile::{tempdir, TempDir};

/// Create a database file from a batch of SQL. Keep the `TempDir` alive.
pub fn database_with(sql: &str) -> (TempDir, DatabaseHandle) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fixture.db");
    Connection::open(&path).unwrap().execute_batch(sql).unwrap();
    let handle = DatabaseHandle::open(&path).unwrap();
    (dir, handle)
}

/// Two customers: Ann in New York, Bo in Boston.
pub fn customers_db() -> (TempDir, DatabaseHandle) {
    database_with(
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT);
         INSERT INTO customers (name, city) VALUES ('Ann', 'New York'), ('Bo', 'Boston');",
    )
}

/// Customers, orders and order lines with a foreign key and a user index.
pub fn shop_db() -> (TempDir, DatabaseHandle) {
    database_with(
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT);
         CREATE TABLE orders (
             id INTEGER PRIMARY KEY,
             customer_id INTEGER NOT NULL REFERENCES customers(id),
             total REAL DEFAULT 0,
             placed_at TEXT
         );
         CREATE INDEX idx_orders_customer ON orders(customer_id, placed_at);
         CREATE TABLE tags (label TEXT);
         INSERT INTO customers (name, city) VALUES ('Ann', 'New York'), ('Bo', 'Boston');
         INSERT INTO orders (customer_id, total, placed_at) VALUES
             (1, 19.5, '2024-03-01'),
             (1, 5.0, '2024-03-09'),
             (2, 42.25, '2024-04-11');",
    )
}

/// Open a side connection to the fixture file.
pub fn connect(handle: &DatabaseHandle) -> Connection {
    Connection::open(handle.path()).unwrap()
}
