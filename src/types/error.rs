//! Error types for sqlask.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AskError>;

/// Pipeline stage that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Schema introspection
    Schema,
    /// SQL synthesis (first model call)
    Synthesis,
    /// Statement execution
    Execution,
    /// Answer composition (second model call)
    Composition,
}

impl Stage {
    /// Get stage name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Synthesis => "synthesis",
            Self::Execution => "execution",
            Self::Composition => "composition",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum AskError {
    #[error("Schema introspection failed: {0}")]
    SchemaIntrospection(String),

    #[error("SQL synthesis failed: {0}")]
    Synthesis(String),

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Answer composition failed: {0}")]
    Composition(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AskError {
    /// Stage this error belongs to, if it is a stage error.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::SchemaIntrospection(_) => Some(Stage::Schema),
            Self::Synthesis(_) => Some(Stage::Synthesis),
            Self::Execution(_) => Some(Stage::Execution),
            Self::Composition(_) => Some(Stage::Composition),
            _ => None,
        }
    }

    /// Re-tag an error as a failure of `stage`.
    ///
    /// Errors already carrying a stage keep it; everything else (model
    /// client failures, IO) is wrapped with its message.
    pub fn at_stage(self, stage: Stage) -> Self {
        if self.stage().is_some() {
            return self;
        }
        Self::for_stage(stage, self.detail())
    }

    /// Stage error carrying `message`.
    pub fn for_stage(stage: Stage, message: impl Into<String>) -> Self {
        let message = message.into();
        match stage {
            Stage::Schema => Self::SchemaIntrospection(message),
            Stage::Synthesis => Self::Synthesis(message),
            Stage::Execution => Self::Execution(message),
            Stage::Composition => Self::Composition(message),
        }
    }

    /// Message without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::SchemaIntrospection(msg)
            | Self::Synthesis(msg)
            | Self::Execution(msg)
            | Self::Composition(msg)
            | Self::Llm(msg)
            | Self::Config(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_tagging() {
        let err = AskError::Llm("connection refused".to_string()).at_stage(Stage::Synthesis);
        assert_eq!(err.stage(), Some(Stage::Synthesis));
        assert_eq!(err.to_string(), "SQL synthesis failed: connection refused");
    }

    #[test]
    fn test_detail_drops_prefix() {
        let err = AskError::for_stage(Stage::Execution, "no such column: x");
        assert_eq!(err.detail(), "no such column: x");
        assert_eq!(err.to_string(), "Query execution failed: no such column: x");
    }

    #[test]
    fn test_existing_stage_is_kept() {
        let err = AskError::Execution("no such table: x".to_string()).at_stage(Stage::Composition);
        assert_eq!(err.stage(), Some(Stage::Execution));
    }

    #[test]
    fn test_ambient_errors_have_no_stage() {
        assert_eq!(AskError::Config("bad".to_string()).stage(), None);
    }
}
