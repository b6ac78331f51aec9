//! Batched enrichment stage.
//!
//! Sends each filtered record through the generation service, one call per
//! record, in bounded-size batches. Items within a batch run sequentially;
//! a [`Pacer`] spaces batches apart to stay under external rate limits.
//!
//! Failure isolation is per item: a failed call, or a response that is not
//! structured content, is recorded against that item and the batch
//! continues. A single item can never abort the batch or the run.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::generation::GenerationClient;
use crate::pacing::{Pacer, DEFAULT_INTERVAL};
use crate::prompts;
use crate::record::Record;
use crate::state::PipelineState;

/// Per-record outcome of the enrichment stage.
///
/// Exactly one of `payload`/`error` is meaningfully populated once the
/// item has been attempted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// The (normalized) input record.
    #[serde(flatten)]
    pub record: Record,
    /// Parsed generation payload; plain-text responses are wrapped as
    /// `{"raw_response": text}` rather than discarded.
    pub payload: Option<Value>,
    /// Per-item failure description.
    pub error: Option<String>,
}

impl EnrichmentResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.payload.is_some() && self.error.is_none()
    }
}

/// Batched, paced generation-call stage.
pub struct EnrichmentStage {
    client: Arc<dyn GenerationClient>,
    interval: Duration,
}

impl EnrichmentStage {
    #[must_use]
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Overrides the inter-batch pacing interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Enriches every filtered record in `state`, producing one
    /// [`EnrichmentResult`] per input record in input order. States with
    /// an error, no filtered records, or no request pass through
    /// unchanged.
    #[must_use]
    pub async fn apply(&self, state: &PipelineState) -> PipelineState {
        if state.has_error() {
            return state.clone();
        }
        let (Some(records), Some(request)) = (state.filtered.as_ref(), state.request.as_ref())
        else {
            return state.clone();
        };
        if records.is_empty() {
            return state.clone();
        }

        let batch_size = request.effective_batch_size();
        let system_prompt = request
            .custom_prompt
            .clone()
            .unwrap_or_else(|| prompts::system_prompt(request.task).to_string());
        let model = request.model.as_str();

        tracing::info!(
            items = records.len(),
            batch_size,
            model,
            task = %request.task,
            "enrichment started"
        );

        let mut pacer = Pacer::new(self.interval);
        let mut results: Vec<EnrichmentResult> = Vec::with_capacity(records.len());
        for (batch_no, batch) in records.chunks(batch_size).enumerate() {
            pacer.acquire().await;
            tracing::debug!(batch = batch_no + 1, items = batch.len(), "processing batch");
            for record in batch {
                results.push(self.enrich_one(record, model, &system_prompt).await);
            }
        }

        let mut next = state.clone();
        next.set_meta("llm_model", json!(model));
        next.set_meta("task_type", json!(request.task.as_str()));
        next.set_meta("results_count", json!(results.len()));
        next.results = Some(results);
        next
    }

    async fn enrich_one(
        &self,
        record: &Record,
        model: &str,
        system_prompt: &str,
    ) -> EnrichmentResult {
        let user_prompt = prompts::user_prompt(record);
        match self
            .client
            .generate(model, system_prompt, &user_prompt)
            .await
        {
            Ok(content) => EnrichmentResult {
                record: record.clone(),
                payload: Some(parse_payload(&content)),
                error: None,
            },
            Err(err) => {
                tracing::warn!(
                    record = record.id().as_deref().unwrap_or("?"),
                    error = %err,
                    "item enrichment failed"
                );
                EnrichmentResult {
                    record: record.clone(),
                    payload: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

/// Parses a response as structured content, keeping plain text under a
/// single fallback field instead of discarding it.
fn parse_payload(content: &str) -> Value {
    match serde_json::from_str::<Value>(content) {
        Ok(value) if value.is_object() || value.is_array() => value,
        _ => json!({ "raw_response": content }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_payload_kept_verbatim() {
        let parsed = parse_payload(r#"{"primary_category": "Tools"}"#);
        assert_eq!(parsed, json!({"primary_category": "Tools"}));
    }

    #[test]
    fn plain_text_wrapped_not_discarded() {
        let parsed = parse_payload("no json here");
        assert_eq!(parsed, json!({"raw_response": "no json here"}));
    }

    #[test]
    fn bare_scalar_treated_as_plain_text() {
        // A lone number parses as JSON but is not structured content.
        let parsed = parse_payload("42");
        assert_eq!(parsed, json!({"raw_response": "42"}));
    }
}
