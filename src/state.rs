//! Pipeline state threaded between workflow stages.
//!
//! [`PipelineState`] is the value each node consumes and produces. Every
//! stage returns a *new* state; no stage mutates a predecessor's state
//! object, which keeps branch outputs in a workflow graph independent of
//! one another. A state either carries data forward or carries an error
//! marker, in which case the run terminates with it.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::record::Record;
use crate::request::EnrichRequest;
use crate::stages::enrich::EnrichmentResult;

/// Metadata key the emitter sets to the written output path.
pub const META_OUTPUT_FILE: &str = "output_file";

/// State threaded through the workflow graph.
#[derive(Clone, Debug, Default)]
pub struct PipelineState {
    /// Path of the source file this run reads.
    pub file_path: Option<String>,
    /// Full record set as loaded.
    pub records: Option<Vec<Record>>,
    /// Filtered and normalized record set.
    pub filtered: Option<Vec<Record>>,
    /// Request active for the stage that produced this state.
    pub request: Option<EnrichRequest>,
    /// Accumulated per-record enrichment results.
    pub results: Option<Vec<EnrichmentResult>>,
    /// Free-form run metadata (counts, index, output path, summary).
    pub metadata: FxHashMap<String, Value>,
    /// Error marker; a populated value aborts the run.
    pub error: Option<String>,
}

impl PipelineState {
    /// Entry state for a run: file path plus configuration, nothing loaded.
    #[must_use]
    pub fn new(file_path: impl Into<String>, request: EnrichRequest) -> Self {
        Self {
            file_path: Some(file_path.into()),
            request: Some(request),
            ..Self::default()
        }
    }

    /// Error-bearing state carrying the path and request but no results.
    #[must_use]
    pub fn failed(
        file_path: impl Into<String>,
        request: EnrichRequest,
        error: impl Into<String>,
    ) -> Self {
        Self {
            file_path: Some(file_path.into()),
            request: Some(request),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Copy of this state with an error marker attached.
    #[must_use]
    pub fn with_error(&self, error: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.error = Some(error.into());
        next
    }

    /// Copy of this state with a replacement request attached.
    #[must_use]
    pub fn with_request(&self, request: EnrichRequest) -> Self {
        let mut next = self.clone();
        next.request = Some(request);
        next
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    #[must_use]
    pub fn has_results(&self) -> bool {
        self.results.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// True when this state can stand as a run's final output: populated
    /// results or a written output file.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.has_results() || self.metadata.contains_key(META_OUTPUT_FILE)
    }

    /// Inserts a metadata entry, returning `self` for chaining.
    pub fn set_meta(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
