//! Turn and model-call instrumentation.
//!
//! One span per pipeline stage, nested under a turn span; model calls get
//! their own client span carrying model name and purpose.

use crate::types::Stage;
use tracing::{field, span, Level, Span};
use uuid::Uuid;

/// Create the root span for one question/answer turn.
pub fn turn_span(turn_id: Uuid, database: &str) -> Span {
    span!(
        Level::INFO,
        "turn",
        otel.name = "turn",
        otel.kind = "internal",
        turn.id = %turn_id,
        db.namespace = database,
        turn.status = field::Empty,
    )
}

/// Create a span for one pipeline stage.
///
/// # Example
///
/// ```rust,ignore
/// let span = stage_span(Stage::Execution);
/// let _guard = span.enter();
/// ```
pub fn stage_span(stage: Stage) -> Span {
    span!(
        Level::INFO,
        "stage",
        otel.name = %format!("stage {}", stage.as_str()),
        otel.kind = "internal",
        stage.name = stage.as_str(),
        stage.status = field::Empty,
    )
}

/// Create a span for one model request.
pub fn llm_span(model: &str, purpose: &str) -> Span {
    span!(
        Level::INFO,
        "llm.request",
        otel.name = %format!("chat {}", model),
        otel.kind = "client",
        gen_ai.request.model = model,
        gen_ai.purpose = purpose,
        gen_ai.usage.input_tokens = field::Empty,
        gen_ai.usage.output_tokens = field::Empty,
    )
}

/// Record a status ("success", "failed") on a turn or stage span.
pub fn record_status(span: &Span, status: &str) {
    span.record("turn.status", status);
    span.record("stage.status", status);
}

/// Record token usage on an llm span.
pub fn record_token_usage(span: &Span, input_tokens: Option<u64>, output_tokens: Option<u64>) {
    if let Some(input) = input_tokens {
        span.record("gen_ai.usage.input_tokens", input);
    }
    if let Some(output) = output_tokens {
        span.record("gen_ai.usage.output_tokens", output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_build_without_subscriber() {
        let turn = turn_span(Uuid::new_v4(), "shop.db");
        let stage = stage_span(Stage::Synthesis);
        record_status(&stage, "success");
        record_status(&turn, "success");
        let llm = llm_span("llama3-70b-8192", "synthesis");
        record_token_usage(&llm, Some(120), Some(18));
    }
}
