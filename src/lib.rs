//! # Rowloom: Graph-driven Tabular Enrichment Pipeline
//!
//! Rowloom loads tabular product data, selects and normalizes records,
//! enriches them in paced batches through a language-model client, and
//! writes the results back out as timestamped CSV files with a run summary.
//!
//! ## Core Concepts
//!
//! - **Records**: Ordered field maps parsed from uploaded CSV files
//! - **Requests**: Per-run configuration (task, model, batching, row selection)
//! - **Graph**: Declarative workflow of load/filter/enrich/output nodes
//! - **State**: Immutable snapshot threaded from stage to stage
//! - **Jobs**: Background run tracking behind a swappable store
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use rowloom::executor::WorkflowExecutor;
//! use rowloom::generation::OpenAiClient;
//! use rowloom::request::{EnrichRequest, TaskKind};
//!
//! # async fn run() {
//! let client = Arc::new(OpenAiClient::new("sk-..."));
//! let executor = WorkflowExecutor::new(client, "outputs");
//!
//! let request = EnrichRequest::for_task(TaskKind::CategoryClassification);
//! let state = executor.run("uploads/products.csv", &request).await;
//!
//! if let Some(error) = state.error {
//!     eprintln!("run failed: {error}");
//! }
//! # }
//! ```
//!
//! Requests may carry an explicit [`graph::WorkflowGraph`]; without one the
//! executor runs the fixed linear pipeline. Either way each stage produces a
//! fresh [`state::PipelineState`], and a stage error short-circuits the run.

pub mod config;
pub mod executor;
pub mod generation;
pub mod graph;
pub mod jobs;
pub mod pacing;
pub mod prompts;
pub mod record;
pub mod request;
pub mod stages;
pub mod state;
pub mod telemetry;
