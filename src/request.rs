//! Processing request configuration.
//!
//! An [`EnrichRequest`] describes one enrichment run: which task to perform,
//! how the record set is narrowed, which generation model to call, and how
//! records are batched. A request may optionally embed a
//! [`WorkflowGraph`](crate::graph::WorkflowGraph); without one the executor
//! falls back to the fixed linear pipeline.
//!
//! Enum overrides follow a validate-or-default policy: an unrecognized
//! task/mode/model string falls back to the current value with a
//! `tracing::warn!`, never a hard failure. Malformed graphs and requests
//! should still attempt execution rather than abort before doing any work.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::graph::WorkflowGraph;
use crate::record::FieldMap;

/// Default number of records per enrichment batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Inclusive bounds enforced on configured batch sizes.
pub const BATCH_SIZE_BOUNDS: (usize, usize) = (1, 100);

/// The enrichment task to run against each record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    AttributeExtraction,
    SalesFaq,
    DataQa,
    ContentEnrichment,
    CategoryClassification,
}

impl TaskKind {
    /// Stable wire/file name for the task, used in output filenames and
    /// metadata.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::AttributeExtraction => "attribute_extraction",
            TaskKind::SalesFaq => "sales_faq",
            TaskKind::DataQa => "data_qa",
            TaskKind::ContentEnrichment => "content_enrichment",
            TaskKind::CategoryClassification => "category_classification",
        }
    }

    /// Parses a wire name, returning `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "attribute_extraction" => Some(TaskKind::AttributeExtraction),
            "sales_faq" => Some(TaskKind::SalesFaq),
            "data_qa" => Some(TaskKind::DataQa),
            "content_enrichment" => Some(TaskKind::ContentEnrichment),
            "category_classification" => Some(TaskKind::CategoryClassification),
            _ => None,
        }
    }

    /// All task kinds, in presentation order.
    #[must_use]
    pub fn all() -> &'static [TaskKind] {
        &[
            TaskKind::AttributeExtraction,
            TaskKind::SalesFaq,
            TaskKind::DataQa,
            TaskKind::ContentEnrichment,
            TaskKind::CategoryClassification,
        ]
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the request narrows the loaded record set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Process the full (or row-range-bounded) record set.
    #[default]
    Batch,
    /// Process only the records named by `product_ids`, in the given order.
    ProductIdLookup,
}

impl RunMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Batch => "batch",
            RunMode::ProductIdLookup => "product_id_lookup",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "batch" => Some(RunMode::Batch),
            "product_id_lookup" => Some(RunMode::ProductIdLookup),
            _ => None,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target generation model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[default]
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
}

impl ModelId {
    /// Wire name sent to the generation service.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt35Turbo => "gpt-3.5-turbo",
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Gpt4o => "gpt-4o",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gpt-3.5-turbo" => Some(ModelId::Gpt35Turbo),
            "gpt-4o-mini" => Some(ModelId::Gpt4oMini),
            "gpt-4o" => Some(ModelId::Gpt4o),
            _ => None,
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open row slice `[start, end)` over the loaded record order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
}

/// Configuration for one enrichment run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EnrichRequest {
    /// Identifier of the uploaded file this run targets.
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub task: TaskKind,
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default, rename = "llm_model")]
    pub model: ModelId,
    /// Records per batch; clamped to [`BATCH_SIZE_BOUNDS`] when read.
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Explicit record identifiers for [`RunMode::ProductIdLookup`].
    #[serde(default)]
    pub product_ids: Option<Vec<String>>,
    #[serde(default)]
    pub row_range: Option<RowRange>,
    /// Overrides the task's built-in system prompt when present.
    #[serde(default)]
    pub custom_prompt: Option<String>,
    /// Explicit workflow; absent means the fixed linear pipeline.
    #[serde(default)]
    pub workflow: Option<WorkflowGraph>,
}

impl EnrichRequest {
    /// Creates a request with defaults for everything but the task.
    #[must_use]
    pub fn for_task(task: TaskKind) -> Self {
        Self {
            task,
            ..Self::default()
        }
    }

    /// Batch size with bounds enforced. Out-of-bounds values are clamped
    /// with a warning rather than rejected.
    #[must_use]
    pub fn effective_batch_size(&self) -> usize {
        let (lo, hi) = BATCH_SIZE_BOUNDS;
        match self.batch_size {
            None => DEFAULT_BATCH_SIZE,
            Some(n) if (lo..=hi).contains(&n) => n,
            Some(n) => {
                let clamped = n.clamp(lo, hi);
                tracing::warn!(requested = n, clamped, "batch_size out of bounds, clamping");
                clamped
            }
        }
    }

    /// Builds a node-scoped request by overlaying per-node config values
    /// onto this one. Recognized keys: `task`, `mode`, `model` (or
    /// `llm_model`), `batch_size`, `start`, `end`, `product_ids`. Invalid
    /// overrides keep the base value and log a warning.
    #[must_use]
    pub fn overlay(&self, config: &FieldMap) -> EnrichRequest {
        let mut scoped = self.clone();
        if config.is_empty() {
            return scoped;
        }

        if let Some(raw) = config.get("task").and_then(Value::as_str) {
            match TaskKind::parse(raw) {
                Some(task) => scoped.task = task,
                None => tracing::warn!(value = raw, "ignoring invalid task override"),
            }
        }
        if let Some(raw) = config.get("mode").and_then(Value::as_str) {
            match RunMode::parse(raw) {
                Some(mode) => scoped.mode = mode,
                None => tracing::warn!(value = raw, "ignoring invalid mode override"),
            }
        }
        let model_override = config
            .get("model")
            .or_else(|| config.get("llm_model"))
            .and_then(Value::as_str);
        if let Some(raw) = model_override {
            match ModelId::parse(raw) {
                Some(model) => scoped.model = model,
                None => tracing::warn!(value = raw, "ignoring invalid model override"),
            }
        }
        if let Some(raw) = config.get("batch_size") {
            match as_usize(raw) {
                Some(n) => scoped.batch_size = Some(n),
                None => tracing::warn!(value = %raw, "ignoring invalid batch_size override"),
            }
        }

        let start = config.get("start").and_then(as_usize);
        let end = config.get("end").and_then(as_usize);
        if start.is_some() || end.is_some() {
            let base = scoped.row_range.unwrap_or_default();
            scoped.row_range = Some(RowRange {
                start: start.unwrap_or(base.start),
                end: end.unwrap_or(base.end),
            });
        }

        if let Some(ids) = config.get("product_ids").and_then(Value::as_array) {
            let ids: Vec<String> = ids.iter().map(crate::record::coerce_scalar).collect();
            scoped.product_ids = Some(ids);
        }

        scoped
    }
}

fn as_usize(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(pairs: &[(&str, Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn batch_size_defaults_and_clamps() {
        let mut req = EnrichRequest::default();
        assert_eq!(req.effective_batch_size(), DEFAULT_BATCH_SIZE);
        req.batch_size = Some(0);
        assert_eq!(req.effective_batch_size(), 1);
        req.batch_size = Some(1000);
        assert_eq!(req.effective_batch_size(), 100);
        req.batch_size = Some(25);
        assert_eq!(req.effective_batch_size(), 25);
    }

    #[test]
    fn overlay_applies_valid_overrides() {
        let base = EnrichRequest::for_task(TaskKind::AttributeExtraction);
        let scoped = base.overlay(&config(&[
            ("task", json!("sales_faq")),
            ("model", json!("gpt-4o")),
            ("batch_size", json!(5)),
            ("start", json!(2)),
            ("end", json!(8)),
        ]));
        assert_eq!(scoped.task, TaskKind::SalesFaq);
        assert_eq!(scoped.model, ModelId::Gpt4o);
        assert_eq!(scoped.batch_size, Some(5));
        assert_eq!(scoped.row_range, Some(RowRange { start: 2, end: 8 }));
    }

    #[test]
    fn overlay_keeps_base_on_invalid_enum() {
        let mut base = EnrichRequest::for_task(TaskKind::DataQa);
        base.model = ModelId::Gpt4oMini;
        let scoped = base.overlay(&config(&[
            ("task", json!("not_a_task")),
            ("mode", json!("sideways")),
            ("model", json!("gpt-9000")),
        ]));
        assert_eq!(scoped.task, TaskKind::DataQa);
        assert_eq!(scoped.mode, RunMode::Batch);
        assert_eq!(scoped.model, ModelId::Gpt4oMini);
    }

    #[test]
    fn request_deserializes_from_payload() {
        let req: EnrichRequest = serde_json::from_value(json!({
            "file_id": "f1",
            "task": "content_enrichment",
            "mode": "product_id_lookup",
            "llm_model": "gpt-4o-mini",
            "batch_size": 3,
            "product_ids": ["9", "4"],
        }))
        .unwrap();
        assert_eq!(req.task, TaskKind::ContentEnrichment);
        assert_eq!(req.mode, RunMode::ProductIdLookup);
        assert_eq!(req.model, ModelId::Gpt4oMini);
        assert_eq!(req.product_ids.as_deref(), Some(&["9".into(), "4".into()][..]));
    }
}
