//! Command-line runner: enriches one file and prints the run summary.
//!
//! Usage: `rowloom <file.csv> [task]` where `task` is one of the wire
//! names listed by [`TaskKind::all`]. Settings come from the environment
//! (see [`Settings`]).

use std::sync::Arc;

use miette::{miette, IntoDiagnostic, Result};
use tracing::info;

use rowloom::config::Settings;
use rowloom::executor::WorkflowExecutor;
use rowloom::generation::OpenAiClient;
use rowloom::request::{EnrichRequest, TaskKind};
use rowloom::state::META_OUTPUT_FILE;
use rowloom::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let settings = Settings::from_env().into_diagnostic()?;

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| miette!("usage: rowloom <file.csv> [task]"))?;
    let task = match args.next() {
        Some(raw) => TaskKind::parse(&raw)
            .ok_or_else(|| miette!("unknown task {raw:?}; expected one of {:?}", task_names()))?,
        None => TaskKind::default(),
    };

    let client = Arc::new(OpenAiClient::new(settings.openai_api_key.clone()));
    let executor = WorkflowExecutor::new(client, settings.output_dir.clone())
        .with_batch_interval(settings.batch_delay)
        .with_max_file_size(settings.max_file_size);

    let request = EnrichRequest::for_task(task);
    let input = resolve_input(&settings, &path);
    let state = executor.run(&input, &request).await;

    if let Some(error) = state.error {
        return Err(miette!("run failed: {error}"));
    }
    if let Some(output) = state.metadata.get(META_OUTPUT_FILE) {
        info!(output = %output, "run complete");
        println!("{}", serde_json::to_string_pretty(&state.metadata).into_diagnostic()?);
    }
    Ok(())
}

fn task_names() -> Vec<&'static str> {
    TaskKind::all().iter().map(TaskKind::as_str).collect()
}

/// Bare filenames resolve against the configured upload directory;
/// anything that already points at an existing path is used as given.
fn resolve_input(settings: &Settings, raw: &str) -> String {
    if std::path::Path::new(raw).exists() {
        raw.to_string()
    } else {
        settings.upload_dir.join(raw).to_string_lossy().into_owned()
    }
}
