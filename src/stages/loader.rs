//! Record loader: CSV file → ordered record set.
//!
//! Validates the minimal required schema ([`REQUIRED_COLUMNS`]) and records
//! row count, column list, and byte size. Loading always starts fresh from
//! the source file; a `load` graph node ignores whatever state flows into
//! it.

use miette::Diagnostic;
use serde_json::{json, Value};
use std::path::Path;
use thiserror::Error;

use crate::record::{Record, REQUIRED_COLUMNS};
use crate::request::EnrichRequest;
use crate::state::PipelineState;

/// Errors raised while loading a source file.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("file not found: {0}")]
    #[diagnostic(code(rowloom::loader::not_found))]
    NotFound(String),

    /// Extension we do not parse. `.xlsx`/`.xls` are recognized but not
    /// supported by this build.
    #[error("unsupported file format: {0}")]
    #[diagnostic(
        code(rowloom::loader::unsupported_format),
        help("supply a .csv file")
    )]
    UnsupportedFormat(String),

    #[error("missing required columns: {0:?}")]
    #[diagnostic(
        code(rowloom::loader::missing_columns),
        help("input files must carry PRODUCT_ID, PRODUCT_NAME, and PRODUCT_DESCRIPTION")
    )]
    MissingColumns(Vec<String>),

    #[error("file exceeds the size limit: {size} > {limit} bytes")]
    #[diagnostic(
        code(rowloom::loader::too_large),
        help("raise MAX_FILE_SIZE or trim the input")
    )]
    TooLarge { size: u64, limit: u64 },

    #[error("failed to parse file: {0}")]
    #[diagnostic(code(rowloom::loader::parse))]
    Parse(#[from] csv::Error),
}

/// A successfully loaded file.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub records: Vec<Record>,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub byte_size: u64,
}

/// Loads tabular files into ordered record sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordLoader {
    max_bytes: Option<u64>,
}

impl RecordLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps accepted input size; larger files fail with
    /// [`LoadError::TooLarge`] before any parsing.
    #[must_use]
    pub fn with_max_size(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Loads and schema-validates the file at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Loaded, LoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::NotFound(path.display().to_string()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if extension != "csv" {
            return Err(LoadError::UnsupportedFormat(extension));
        }

        let byte_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        if let Some(limit) = self.max_bytes {
            if byte_size > limit {
                return Err(LoadError::TooLarge {
                    size: byte_size,
                    limit,
                });
            }
        }

        let mut reader = csv::Reader::from_path(path)?;
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !columns.iter().any(|c| c == *required))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let record: Record = columns
                .iter()
                .zip(row.iter())
                .map(|(column, cell)| (column.clone(), Value::String(cell.to_string())))
                .collect();
            records.push(record);
        }

        let row_count = records.len();
        tracing::info!(path = %path.display(), rows = row_count, "file loaded");

        Ok(Loaded {
            records,
            columns,
            row_count,
            byte_size,
        })
    }

    /// Loads `path` into a pipeline state, converting failures into an
    /// error-bearing state per executor failure semantics.
    #[must_use]
    pub fn load_state(&self, path: &str, request: &EnrichRequest) -> PipelineState {
        match self.load(path) {
            Ok(loaded) => {
                let mut state = PipelineState::new(path, request.clone());
                state.set_meta("row_count", json!(loaded.row_count));
                state.set_meta("columns", json!(loaded.columns));
                state.set_meta("file_size", json!(loaded.byte_size));
                state.records = Some(loaded.records);
                state
            }
            Err(err) => PipelineState::failed(path, request.clone(), err.to_string()),
        }
    }
}
