//! Turn orchestration: schema, synthesis, execution, composition.
//!
//! Stages run strictly in order; the first failure ends the turn and no
//! later stage runs. Nothing is retried.

pub mod turn;

pub use turn::{Turn, TurnFailure, TurnOutcome, TurnReport, TurnState};

use crate::database::DatabaseHandle;
use crate::llm::{ExtractionPolicy, GenerationOptions, LanguageModel, QuerySynthesizer, ResponseComposer};
use crate::query::{AccessMode, QueryExecutor};
use crate::schema::introspect;
use crate::telemetry::{record_status, stage_span, turn_span};
use crate::types::{Result, Stage};
use std::sync::Arc;
use tracing::{Instrument, Span};

/// Settings shared by every turn a pipeline runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOptions {
    pub generation: GenerationOptions,
    pub extraction: ExtractionPolicy,
    pub access_mode: AccessMode,
}

/// Runs turns against any database with one model.
///
/// Holds only a shared model reference and immutable options, so turns on
/// different databases may run concurrently.
#[derive(Clone)]
pub struct Pipeline {
    model: Arc<dyn LanguageModel>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(model: Arc<dyn LanguageModel>, options: PipelineOptions) -> Self {
        Self { model, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Answer `question` against `handle`.
    ///
    /// # Arguments
    ///
    /// * `handle` - Database the turn runs against, validated at the schema stage
    /// * `question` - Natural language question, used verbatim
    ///
    /// # Returns
    ///
    /// `TurnOutcome::Answered` with statement, rows and answer, or
    /// `TurnOutcome::Failed` naming the stage that failed
    pub async fn run_turn(&self, handle: &DatabaseHandle, question: &str) -> TurnOutcome {
        let mut turn = Turn::new(question);
        let span = turn_span(turn.id(), &handle.to_string());
        span.in_scope(|| tracing::info!(question, "Turn started"));

        let outcome = self.drive(&mut turn, handle).instrument(span.clone()).await;

        match outcome {
            Ok(report) => {
                record_status(&span, "success");
                TurnOutcome::Answered(report)
            }
            Err(failure) => {
                record_status(&span, "failed");
                TurnOutcome::Failed(failure)
            }
        }
    }

    async fn drive(
        &self,
        turn: &mut Turn,
        handle: &DatabaseHandle,
    ) -> std::result::Result<TurnReport, TurnFailure> {
        let question = turn.question().to_string();

        let span = stage_span(Stage::Schema);
        let schema = settle(&span, span.in_scope(|| introspect(handle)))
            .map_err(|e| turn.fail(Stage::Schema, e))?;
        turn.advance();

        let schema_text = schema.render();
        let span = stage_span(Stage::Synthesis);
        let synthesized = QuerySynthesizer::new(self.model.as_ref(), self.options.generation.clone())
            .with_extraction(self.options.extraction)
            .synthesize(&question, &schema_text)
            .instrument(span.clone())
            .await;
        let sql = settle(&span, synthesized).map_err(|e| turn.fail(Stage::Synthesis, e))?;
        turn.set_sql(sql.clone());
        turn.advance();

        let span = stage_span(Stage::Execution);
        let executor = QueryExecutor::new(handle).with_access_mode(self.options.access_mode);
        let result = settle(&span, span.in_scope(|| executor.execute(&sql)))
            .map_err(|e| turn.fail(Stage::Execution, e))?;
        turn.advance();

        let span = stage_span(Stage::Composition);
        let composed = ResponseComposer::new(self.model.as_ref(), self.options.generation.clone())
            .compose(&question, &sql, &result)
            .instrument(span.clone())
            .await;
        let answer = settle(&span, composed).map_err(|e| turn.fail(Stage::Composition, e))?;
        turn.advance();

        tracing::info!(rows = result.len(), "Turn answered");
        Ok(TurnReport {
            turn_id: turn.id(),
            question,
            sql,
            result,
            answer,
            states: turn.states().to_vec(),
        })
    }
}

fn settle<T>(span: &Span, result: Result<T>) -> Result<T> {
    record_status(span, if result.is_ok() { "success" } else { "failed" });
    result
}

/// Run one turn with a throwaway pipeline.
pub async fn run_turn(
    model: Arc<dyn LanguageModel>,
    options: PipelineOptions,
    handle: &DatabaseHandle,
    question: &str,
) -> TurnOutcome {
    Pipeline::new(model, options).run_turn(handle, question).await
}
