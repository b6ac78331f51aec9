mod common;
use common::*;

use serde_json::json;

use rowloom::stages::emit::ResultEmitter;
use rowloom::stages::enrich::EnrichmentResult;
use rowloom::state::{PipelineState, META_OUTPUT_FILE};

fn state_with_results(results: Vec<EnrichmentResult>) -> PipelineState {
    let mut state = PipelineState::new("fixture.csv", default_request());
    state.results = Some(results);
    state
}

fn enriched(id: usize, payload: serde_json::Value) -> EnrichmentResult {
    EnrichmentResult {
        record: sample_records(id).pop().unwrap(),
        payload: Some(payload),
        error: None,
    }
}

#[test]
fn writes_csv_and_marks_state_materialized() {
    let dir = tempfile::tempdir().expect("tempdir");
    let emitter = ResultEmitter::new(dir.path());

    let state = state_with_results(vec![
        enriched(1, json!({"category": "Tools"})),
        enriched(2, json!({"category": "Garden"})),
    ]);
    let out = emitter.apply(&state);

    assert!(!out.has_error());
    assert!(out.is_materialized());
    let path = out.metadata[META_OUTPUT_FILE].as_str().expect("path set");
    assert!(path.contains("category_classification_"));

    let mut reader = csv::Reader::from_path(path).expect("output readable");
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert!(headers.contains(&"PRODUCT_ID".to_string()));
    assert!(headers.contains(&"llm_category".to_string()));
    assert_eq!(reader.records().count(), 2);
}

#[test]
fn rows_with_divergent_payloads_share_one_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let emitter = ResultEmitter::new(dir.path());

    let state = state_with_results(vec![
        enriched(1, json!({"alpha": "a"})),
        enriched(2, json!({"beta": "b"})),
    ]);
    let out = emitter.apply(&state);

    let path = out.metadata[META_OUTPUT_FILE].as_str().unwrap();
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert!(headers.contains(&"llm_alpha".to_string()));
    assert!(headers.contains(&"llm_beta".to_string()));

    // Every row has a cell for every column.
    for row in reader.records() {
        assert_eq!(row.unwrap().len(), headers.len());
    }
}

#[test]
fn summary_metadata_reflects_failures() {
    let dir = tempfile::tempdir().expect("tempdir");
    let emitter = ResultEmitter::new(dir.path());

    let mut failed = enriched(2, json!({}));
    failed.payload = None;
    failed.error = Some("call failed".into());

    let state = state_with_results(vec![enriched(1, json!({"a": 1})), failed]);
    let out = emitter.apply(&state);

    let summary = &out.metadata["summary"];
    assert_eq!(summary["total_processed"], json!(2));
    assert_eq!(summary["successful"], json!(1));
    assert_eq!(summary["failed"], json!(1));
    assert_eq!(summary["success_rate"], json!(50.0));
}

#[test]
fn resultless_state_passes_through() {
    let dir = tempfile::tempdir().expect("tempdir");
    let emitter = ResultEmitter::new(dir.path());

    let state = PipelineState::new("fixture.csv", default_request());
    let out = emitter.apply(&state);
    assert!(!out.metadata.contains_key(META_OUTPUT_FILE));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
