mod common;
use common::*;

use std::sync::Arc;
use std::time::Duration;

use rowloom::executor::WorkflowExecutor;
use rowloom::jobs::{spawn_run, InMemoryJobStore, JobStatus, JobStore};

async fn wait_for_terminal(store: &dyn JobStore, id: &str) -> JobStatus {
    for _ in 0..100 {
        if let Some(job) = store.get(id).await {
            if job.status != JobStatus::Processing {
                return job.status;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {id} never finished");
}

#[tokio::test]
async fn spawned_run_completes_and_records_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = sample_csv(dir.path(), 3);
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let executor = Arc::new(
        WorkflowExecutor::new(Arc::new(StaticClient::structured()), dir.path())
            .with_batch_interval(Duration::ZERO),
    );

    let id = spawn_run(
        store.clone(),
        executor,
        path.to_string_lossy().into_owned(),
        default_request(),
    )
    .await;

    // Visible as processing (or already done) immediately after spawn.
    assert!(store.get(&id).await.is_some());

    let status = wait_for_terminal(store.as_ref(), &id).await;
    assert_eq!(status, JobStatus::Completed);

    let job = store.get(&id).await.unwrap();
    assert_eq!(job.processed_count, 3);
    assert!(job.output_file.is_some());
    assert!(job.error.is_none());
}

#[tokio::test]
async fn spawned_run_against_missing_file_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let executor = Arc::new(
        WorkflowExecutor::new(Arc::new(StaticClient::structured()), dir.path())
            .with_batch_interval(Duration::ZERO),
    );

    let id = spawn_run(
        store.clone(),
        executor,
        "missing/file.csv".to_string(),
        default_request(),
    )
    .await;

    let status = wait_for_terminal(store.as_ref(), &id).await;
    assert_eq!(status, JobStatus::Failed);
    assert!(store.get(&id).await.unwrap().error.is_some());
}
