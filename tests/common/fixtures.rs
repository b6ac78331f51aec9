use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;

use rowloom::record::Record;
use rowloom::request::{EnrichRequest, TaskKind};
use rowloom::state::PipelineState;

/// Builds `count` records with the required product columns, ids "1"..=count.
pub fn sample_records(count: usize) -> Vec<Record> {
    (1..=count)
        .map(|i| {
            let mut record = Record::new();
            record.insert("PRODUCT_ID", json!(i.to_string()));
            record.insert("PRODUCT_NAME", json!(format!("Product {i}")));
            record.insert("PRODUCT_DESCRIPTION", json!(format!("Description {i}")));
            record
        })
        .collect()
}

/// Writes a well-formed CSV with `count` rows into `dir`, returning its path.
pub fn sample_csv(dir: &Path, count: usize) -> PathBuf {
    let path = dir.join("products.csv");
    let mut file = std::fs::File::create(&path).expect("create fixture csv");
    writeln!(file, "PRODUCT_ID,PRODUCT_NAME,PRODUCT_DESCRIPTION").unwrap();
    for i in 1..=count {
        writeln!(file, "{i},Product {i},Description {i}").unwrap();
    }
    path
}

/// State positioned just before the filter stage.
pub fn loaded_state(count: usize, request: EnrichRequest) -> PipelineState {
    let mut state = PipelineState::new("fixture.csv", request);
    state.records = Some(sample_records(count));
    state
}

pub fn default_request() -> EnrichRequest {
    EnrichRequest::for_task(TaskKind::CategoryClassification)
}
