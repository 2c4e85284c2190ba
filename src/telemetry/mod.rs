//! Tracing instrumentation for sqlask.
//!
//! Span naming follows OpenTelemetry semantic conventions:
//! - database spans: `db.system.name = "sqlite"`, `db.operation.name`,
//!   `db.collection.name` (table), `db.namespace` (database file)
//! - model spans: `gen_ai.request.model`, token usage when reported
//! - pipeline spans: one `turn` span with a child `stage` span per stage
//!
//! Spans are plain `tracing` spans; whichever subscriber the caller
//! installs decides where they go.

pub mod db;
pub mod stage;

pub use db::{db_query_span, db_span, record_db_metrics, DbOperation};
pub use stage::{llm_span, record_status, record_token_usage, stage_span, turn_span};
