//! Query results back to prose.

use crate::llm::client::{GenerationOptions, LanguageModel};
use crate::query::{GeneratedQuery, QueryResult};
use crate::telemetry::llm_span;
use crate::types::{AskError, Result};
use tracing::Instrument;

const NEGATED_PREFIX: &str = "is there any";

/// Turns a question, its statement and the returned rows into an answer.
pub struct ResponseComposer<'a> {
    model: &'a dyn LanguageModel,
    options: GenerationOptions,
}

impl<'a> ResponseComposer<'a> {
    pub fn new(model: &'a dyn LanguageModel, options: GenerationOptions) -> Self {
        Self { model, options }
    }

    /// Compose the answer.
    ///
    /// An empty result is answered from a template without calling the model.
    ///
    /// # Errors
    ///
    /// Returns `AskError::Composition` if the model call fails
    pub async fn compose(
        &self,
        question: &str,
        query: &GeneratedQuery,
        result: &QueryResult,
    ) -> Result<String> {
        if result.is_empty() {
            tracing::debug!("Empty result, answering from template");
            return Ok(empty_result_answer(question));
        }

        let prompt = composition_prompt(question, query, result);
        let span = llm_span(self.model.model_name(), "composition");
        let answer = self
            .model
            .complete(&prompt, &self.options)
            .instrument(span)
            .await
            .map_err(|e| match e {
                AskError::Llm(msg) => AskError::Composition(msg),
                other => AskError::Composition(other.to_string()),
            })?;

        Ok(answer.trim().to_string())
    }
}

/// Negative answer for a question that matched nothing.
pub fn empty_result_answer(question: &str) -> String {
    let lowered = question.trim().to_lowercase();
    let subject = lowered.strip_prefix(NEGATED_PREFIX).unwrap_or(&lowered).trim();
    format!("No, there is no {} in the database.", subject)
}

pub fn composition_prompt(question: &str, query: &GeneratedQuery, result: &QueryResult) -> String {
    format!(
        "You are a serious and professional assistant. Given the following data, answer the question in a natural and brief way.\n\n\
         Natural Language Query: {}\n\
         SQL Query: {}\n\
         SQL Query Result: {}\n\n\
         Respond in a conversational and friendly manner:",
        question,
        query,
        result.render_rows()
    )
}
