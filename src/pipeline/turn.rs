//! Per-turn state machine and outcomes.

use crate::query::{GeneratedQuery, QueryResult};
use crate::types::{AskError, Result, Stage};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Where a turn is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Start,
    SchemaReady,
    SqlReady,
    ResultReady,
    /// Terminal success
    AnswerReady,
    /// Terminal failure, tagged with the stage that failed
    Failed(Stage),
}

impl TurnState {
    /// Next state on success, `None` for terminal states.
    pub fn successor(&self) -> Option<TurnState> {
        match self {
            Self::Start => Some(Self::SchemaReady),
            Self::SchemaReady => Some(Self::SqlReady),
            Self::SqlReady => Some(Self::ResultReady),
            Self::ResultReady => Some(Self::AnswerReady),
            Self::AnswerReady | Self::Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.successor().is_none()
    }

    /// Stage whose success leads out of this state.
    pub fn pending_stage(&self) -> Option<Stage> {
        match self {
            Self::Start => Some(Stage::Schema),
            Self::SchemaReady => Some(Stage::Synthesis),
            Self::SqlReady => Some(Stage::Execution),
            Self::ResultReady => Some(Stage::Composition),
            Self::AnswerReady | Self::Failed(_) => None,
        }
    }
}

/// One question/answer attempt: id, visited states, statement once known.
#[derive(Debug, Clone)]
pub struct Turn {
    id: Uuid,
    question: String,
    states: Vec<TurnState>,
    sql: Option<GeneratedQuery>,
}

impl Turn {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            states: vec![TurnState::Start],
            sql: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn state(&self) -> TurnState {
        self.states.last().copied().unwrap_or(TurnState::Start)
    }

    pub fn states(&self) -> &[TurnState] {
        &self.states
    }

    pub fn sql(&self) -> Option<&GeneratedQuery> {
        self.sql.as_ref()
    }

    pub(crate) fn set_sql(&mut self, sql: GeneratedQuery) {
        self.sql = Some(sql);
    }

    /// Move to the successor state. Terminal turns stay where they are.
    pub fn advance(&mut self) -> TurnState {
        let current = self.state();
        if let Some(next) = current.successor() {
            tracing::info!(turn_id = %self.id, from = ?current, to = ?next, "Turn advanced");
            self.states.push(next);
        }
        self.state()
    }

    /// Record the failure of `stage` and build the failure report.
    pub fn fail(&mut self, stage: Stage, error: AskError) -> TurnFailure {
        let error = error.at_stage(stage);
        let message = error.detail();
        tracing::warn!(turn_id = %self.id, stage = %stage, error = %message, "Turn failed");

        if !self.state().is_terminal() {
            self.states.push(TurnState::Failed(stage));
        }

        TurnFailure {
            turn_id: self.id,
            question: self.question.clone(),
            stage,
            message,
            sql: self.sql.clone(),
            states: self.states.clone(),
        }
    }
}

/// Successful turn: the statement, its rows and the answer.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub turn_id: Uuid,
    pub question: String,
    pub sql: GeneratedQuery,
    pub result: QueryResult,
    pub answer: String,
    pub states: Vec<TurnState>,
}

/// Failed turn. Displays as `[stage] message`.
#[derive(Debug, Clone, Serialize)]
pub struct TurnFailure {
    pub turn_id: Uuid,
    pub question: String,
    pub stage: Stage,
    pub message: String,
    /// Statement generated before the failure, if synthesis got that far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<GeneratedQuery>,
    pub states: Vec<TurnState>,
}

impl TurnFailure {
    pub fn into_error(self) -> AskError {
        AskError::for_stage(self.stage, self.message)
    }
}

impl fmt::Display for TurnFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

impl std::error::Error for TurnFailure {}

/// Terminal outcome of one turn.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnOutcome {
    Answered(TurnReport),
    Failed(TurnFailure),
}

impl TurnOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }

    pub fn final_state(&self) -> TurnState {
        let states = match self {
            Self::Answered(report) => &report.states,
            Self::Failed(failure) => &failure.states,
        };
        states.last().copied().unwrap_or(TurnState::Start)
    }

    pub fn into_result(self) -> Result<TurnReport> {
        match self {
            Self::Answered(report) => Ok(report),
            Self::Failed(failure) => Err(failure.into_error()),
        }
    }
}
