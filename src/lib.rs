//! sqlask - ask an SQLite database questions in plain language
//!
//! One turn runs four stages against a database file:
//! - Schema introspection: tables, columns, keys, indexes, samples, counts
//! - SQL synthesis: the schema and the question go to a language model
//! - Execution: the generated statement runs once, rows are collected
//! - Composition: rows are turned back into a short answer
//!
//! Can be used as:
//! - Rust library (`Pipeline::run_turn`)
//! - CLI (`sqlask ask --db shop.db "Who lives in Boston?"`)

pub mod types;
pub mod config;
pub mod telemetry;
pub mod schema;
pub mod query;
pub mod llm;
pub mod pipeline;

// Database file handle
pub mod database;

pub use config::Config;
pub use database::DatabaseHandle;
pub use llm::{GenerationOptions, LanguageModel, LlmClient, ProviderKind, ScriptedModel};
pub use pipeline::{run_turn, Pipeline, PipelineOptions, TurnOutcome, TurnReport, TurnState};
pub use query::{AccessMode, GeneratedQuery, QueryResult};
pub use schema::SchemaDescription;
pub use types::{AskError, Result, SqlValue, Stage};
