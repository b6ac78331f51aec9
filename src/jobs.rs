//! Background job tracking for enrichment runs.
//!
//! A run executes in a detached task; callers poll its [`Job`] record
//! through a [`JobStore`]. The store is a trait so the in-memory map can
//! be swapped for a persistent backend without touching the executor.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::executor::WorkflowExecutor;
use crate::request::EnrichRequest;
use crate::state::{PipelineState, META_OUTPUT_FILE};

/// Lifecycle of a background run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

/// Snapshot of one run's progress and outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub processed_count: usize,
    pub total_count: usize,
    /// Path of the written output, once the run completes.
    pub output_file: Option<String>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    #[must_use]
    pub fn started(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: JobStatus::Processing,
            processed_count: 0,
            total_count: 0,
            output_file: None,
            error: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Folds a finished run's state into this job record.
    #[must_use]
    pub fn finished(mut self, state: &PipelineState) -> Self {
        self.updated_at = Utc::now();
        if let Some(error) = state.error.as_ref() {
            self.status = JobStatus::Failed;
            self.error = Some(error.clone());
            return self;
        }
        self.status = JobStatus::Completed;
        self.processed_count = state.results.as_ref().map_or(0, Vec::len);
        self.total_count = state
            .metadata
            .get("original_count")
            .and_then(serde_json::Value::as_u64)
            .map_or(self.processed_count, |n| n as usize);
        self.output_file = state
            .metadata
            .get(META_OUTPUT_FILE)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        self
    }
}

/// Storage for job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, id: &str) -> Option<Job>;
    async fn put(&self, job: Job);
    async fn list(&self) -> Vec<Job>;
}

/// Process-local store backed by a read-write locked map.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<FxHashMap<String, Job>>,
}

impl InMemoryJobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    async fn put(&self, job: Job) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    async fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        jobs
    }
}

/// Starts a run in a detached task, registering it under a fresh job id.
/// Returns the id immediately; callers poll the store for progress.
pub async fn spawn_run(
    store: Arc<dyn JobStore>,
    executor: Arc<WorkflowExecutor>,
    path: String,
    request: EnrichRequest,
) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    store.put(Job::started(&id)).await;
    info!(job = %id, path = %path, "run started");

    let job_id = id.clone();
    tokio::spawn(async move {
        let state = executor.run(&path, &request).await;
        let job = match store.get(&job_id).await {
            Some(job) => job.finished(&state),
            None => Job::started(&job_id).finished(&state),
        };
        match job.status {
            JobStatus::Completed => {
                info!(job = %job_id, processed = job.processed_count, "run completed");
            }
            _ => {
                error!(job = %job_id, error = job.error.as_deref().unwrap_or(""), "run failed");
            }
        }
        store.put(job).await;
    });

    id
}
