//! Record filter and normalizer.
//!
//! Narrows the loaded record set per the active request, then normalizes
//! every surviving record (missing values → empty string, everything else
//! → trimmed string form). Filtering never mutates the loaded set; the
//! filtered records are fresh copies.
//!
//! Selection rules, in precedence order:
//! 1. [`RunMode::ProductIdLookup`] with an id list: records in the order
//!    the ids were given, silently skipping ids absent from the file.
//! 2. A row range: the half-open slice `[start, end)`, clamped to the
//!    available length.
//! 3. Otherwise the full set.

use rustc_hash::FxHashMap;
use serde_json::json;

use crate::record::Record;
use crate::request::{EnrichRequest, RunMode};
use crate::state::PipelineState;

/// Applies request-driven selection and normalization to a loaded state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter;

impl RecordFilter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Produces a new state whose `filtered` set is the narrowed,
    /// normalized record set. States that already carry an error or have
    /// no loaded records pass through unchanged.
    #[must_use]
    pub fn apply(&self, state: &PipelineState) -> PipelineState {
        if state.has_error() {
            return state.clone();
        }
        let Some(records) = state.records.as_ref() else {
            return state.clone();
        };

        // Identifier → position index for O(1) lookup.
        let index: FxHashMap<String, usize> = records
            .iter()
            .enumerate()
            .filter_map(|(pos, record)| record.id().map(|id| (id, pos)))
            .collect();

        let selected: Vec<&Record> = match state.request.as_ref() {
            Some(request) => select(records, request, &index),
            None => records.iter().collect(),
        };
        let filtered: Vec<Record> = selected.into_iter().map(Record::normalized).collect();

        let mut next = state.clone();
        next.set_meta(
            "product_index",
            json!(index.iter().collect::<std::collections::BTreeMap<_, _>>()),
        );
        next.set_meta("processed_count", json!(filtered.len()));
        next.set_meta("original_count", json!(records.len()));
        tracing::debug!(
            selected = filtered.len(),
            total = records.len(),
            "records filtered"
        );
        next.filtered = Some(filtered);
        next
    }
}

fn select<'a>(
    records: &'a [Record],
    request: &EnrichRequest,
    index: &FxHashMap<String, usize>,
) -> Vec<&'a Record> {
    if request.mode == RunMode::ProductIdLookup {
        if let Some(ids) = request.product_ids.as_ref() {
            // Requested order wins; unknown ids are dropped silently.
            return ids
                .iter()
                .filter_map(|id| index.get(id).map(|&pos| &records[pos]))
                .collect();
        }
    }
    if let Some(range) = request.row_range {
        let start = range.start.min(records.len());
        let end = range.end.min(records.len()).max(start);
        return records[start..end].iter().collect();
    }
    records.iter().collect()
}
