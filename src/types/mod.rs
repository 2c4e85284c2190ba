//! Shared types: errors and scalar values.

pub mod error;
pub mod value;

pub use error::{AskError, Result, Stage};
pub use value::{render_row, SqlValue};
