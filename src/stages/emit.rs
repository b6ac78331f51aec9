//! Result emitter: enrichment results → tabular output plus run summary.
//!
//! Flattens each result into a row (original fields, payload keys projected
//! as `llm_`-prefixed columns, errors under `processing_error`) and writes
//! a CSV named by task kind and timestamp. The output schema is the union
//! of keys across all rows in first-occurrence order, so rows whose payload
//! keys differ from the first row's are never silently misaligned.

use chrono::Local;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::record::{coerce_scalar, FieldMap};
use crate::stages::enrich::EnrichmentResult;
use crate::state::{PipelineState, META_OUTPUT_FILE};

/// Column holding a non-structured payload's string form.
const FALLBACK_COLUMN: &str = "llm_result";
/// Column holding per-item error strings.
const ERROR_COLUMN: &str = "processing_error";

/// Errors raised while materializing output.
#[derive(Debug, Error, Diagnostic)]
pub enum EmitError {
    #[error("failed to write output: {0}")]
    #[diagnostic(code(rowloom::emit::write))]
    Write(#[from] csv::Error),

    #[error("failed to create output directory: {0}")]
    #[diagnostic(code(rowloom::emit::output_dir))]
    OutputDir(#[from] std::io::Error),
}

/// Aggregate outcome of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage in [0, 100]; 0 when nothing was processed.
    pub success_rate: f64,
}

impl RunSummary {
    /// Computes the summary for a result set. A row counts as successful
    /// when it has a payload and no error.
    #[must_use]
    pub fn of(results: &[EnrichmentResult]) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.succeeded()).count();
        let failed = total - successful;
        let success_rate = if total > 0 {
            successful as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total_processed: total,
            successful,
            failed,
            success_rate,
        }
    }
}

/// Writes enrichment results as delimited tabular files.
#[derive(Debug, Clone)]
pub struct ResultEmitter {
    output_dir: PathBuf,
}

impl ResultEmitter {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Emits `state`'s results, attaching the output path, summary, and
    /// export timestamp to the returned state's metadata. States with an
    /// error or no results pass through unchanged; a write failure becomes
    /// an error-bearing state.
    #[must_use]
    pub fn apply(&self, state: &PipelineState) -> PipelineState {
        if state.has_error() {
            return state.clone();
        }
        let Some(results) = state.results.as_ref().filter(|r| !r.is_empty()) else {
            return state.clone();
        };

        let task = state
            .request
            .as_ref()
            .map(|r| r.task.as_str())
            .unwrap_or("processed");
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let output_path = self.output_dir.join(format!("{task}_{timestamp}.csv"));

        let rows = flatten_rows(results);
        if let Err(err) = self.write_csv(&rows, &output_path) {
            return state.with_error(format!("output generation error: {err}"));
        }
        let summary = RunSummary::of(results);
        tracing::info!(
            path = %output_path.display(),
            total = summary.total_processed,
            successful = summary.successful,
            "results written"
        );

        let mut next = state.clone();
        next.set_meta(META_OUTPUT_FILE, json!(output_path.display().to_string()));
        next.set_meta("summary", json!(summary));
        next.set_meta("export_timestamp", json!(timestamp));
        next
    }

    fn write_csv(&self, rows: &[FieldMap], path: &Path) -> Result<(), EmitError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let columns = union_columns(rows);
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&columns)?;
        for row in rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|column| row.get(column).map(coerce_scalar).unwrap_or_default())
                .collect();
            writer.write_record(&cells)?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

/// Flattens results into field maps ready for tabular output.
#[must_use]
pub fn flatten_rows(results: &[EnrichmentResult]) -> Vec<FieldMap> {
    results.iter().map(flatten_one).collect()
}

fn flatten_one(result: &EnrichmentResult) -> FieldMap {
    let mut row = FieldMap::new();
    for (column, value) in result.record.iter() {
        row.insert(column.clone(), value.clone());
    }

    if let Some(payload) = result.payload.as_ref() {
        match payload {
            Value::Object(fields) => {
                for (key, value) in fields {
                    let cell = match value {
                        // Lists keep a compact serialized form in one cell.
                        Value::Array(_) => Value::String(value.to_string()),
                        other => other.clone(),
                    };
                    row.insert(format!("llm_{key}"), cell);
                }
            }
            other => {
                row.insert(FALLBACK_COLUMN.to_string(), json!(coerce_scalar(other)));
            }
        }
    }
    if let Some(error) = result.error.as_ref() {
        row.insert(ERROR_COLUMN.to_string(), json!(error));
    }
    row
}

/// Output schema: union of keys across all rows, in first-occurrence order.
#[must_use]
pub fn union_columns(rows: &[FieldMap]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for column in row.keys() {
            if !columns.iter().any(|c| c == column) {
                columns.push(column.clone());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn result(payload: Option<Value>, error: Option<&str>) -> EnrichmentResult {
        let mut record = Record::new();
        record.insert("PRODUCT_ID", json!("1"));
        record.insert("PRODUCT_NAME", json!("Widget"));
        EnrichmentResult {
            record,
            payload,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn summary_handles_empty_set() {
        let summary = RunSummary::of(&[]);
        assert_eq!(summary.total_processed, 0);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn summary_counts_successes_and_failures() {
        let results = vec![
            result(Some(json!({"a": 1})), None),
            result(None, Some("boom")),
            result(Some(json!({"a": 2})), None),
            result(Some(json!({"a": 3})), None),
        ];
        let summary = RunSummary::of(&results);
        assert_eq!(summary.successful, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.success_rate, 75.0);
    }

    #[test]
    fn payload_keys_get_prefixed_columns() {
        let rows = flatten_rows(&[result(
            Some(json!({"category": "Tools", "tags": ["a", "b"]})),
            None,
        )]);
        assert_eq!(rows[0].get("llm_category"), Some(&json!("Tools")));
        assert_eq!(rows[0].get("llm_tags"), Some(&json!("[\"a\",\"b\"]")));
    }

    #[test]
    fn scalar_payload_lands_in_fallback_column() {
        let rows = flatten_rows(&[result(Some(json!("just text")), None)]);
        assert_eq!(rows[0].get(FALLBACK_COLUMN), Some(&json!("just text")));
    }

    #[test]
    fn error_gets_dedicated_column() {
        let rows = flatten_rows(&[result(None, Some("call failed"))]);
        assert_eq!(rows[0].get(ERROR_COLUMN), Some(&json!("call failed")));
        assert!(rows[0].get(FALLBACK_COLUMN).is_none());
    }

    #[test]
    fn schema_is_union_across_rows() {
        let rows = flatten_rows(&[
            result(Some(json!({"alpha": 1})), None),
            result(Some(json!({"beta": 2})), None),
        ]);
        let columns = union_columns(&rows);
        assert!(columns.contains(&"llm_alpha".to_string()));
        assert!(columns.contains(&"llm_beta".to_string()));
        // Original fields come first, in record order.
        assert_eq!(columns[0], "PRODUCT_ID");
        assert_eq!(columns[1], "PRODUCT_NAME");
    }
}
