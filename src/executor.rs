//! Workflow executor: drives a [`WorkflowGraph`] over the pipeline stages.
//!
//! Runs either the fixed linear pipeline (load, filter, enrich, emit) or an
//! explicit graph from the request. Graph runs resolve a topological order,
//! thread a fresh [`PipelineState`] through each node, and pick the final
//! state from the graph's terminal nodes.
//!
//! Node errors abort the run: the error-bearing state becomes the result and
//! downstream nodes never execute.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::generation::GenerationClient;
use crate::graph::{NodeSpec, NodeType, WorkflowGraph};
use crate::request::EnrichRequest;
use crate::stages::emit::ResultEmitter;
use crate::stages::enrich::EnrichmentStage;
use crate::stages::filter::RecordFilter;
use crate::stages::loader::RecordLoader;
use crate::state::PipelineState;

/// Error text for a graph whose nodes all fail to execute.
const NO_NODES_EXECUTED: &str = "no workflow nodes executed";

/// Owns the pipeline stages and runs requests through them.
pub struct WorkflowExecutor {
    loader: RecordLoader,
    filter: RecordFilter,
    enrich: EnrichmentStage,
    emitter: ResultEmitter,
}

impl WorkflowExecutor {
    #[must_use]
    pub fn new(client: Arc<dyn GenerationClient>, output_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            loader: RecordLoader::new(),
            filter: RecordFilter::new(),
            enrich: EnrichmentStage::new(client),
            emitter: ResultEmitter::new(output_dir),
        }
    }

    /// Overrides the pacing interval between enrichment batches.
    #[must_use]
    pub fn with_batch_interval(mut self, interval: Duration) -> Self {
        self.enrich = self.enrich.with_interval(interval);
        self
    }

    /// Caps accepted input file size for every load node.
    #[must_use]
    pub fn with_max_file_size(mut self, max_bytes: u64) -> Self {
        self.loader = self.loader.with_max_size(max_bytes);
        self
    }

    /// Runs `request` against the file at `path`. The returned state either
    /// carries results and output metadata or an error description; this
    /// method itself never fails.
    ///
    /// Only a request with no workflow at all falls back to the linear
    /// pipeline. An explicit graph with no nodes errors out, since the
    /// caller declared a workflow and none of it could execute.
    pub async fn run(&self, path: &str, request: &EnrichRequest) -> PipelineState {
        match request.workflow.as_ref() {
            Some(graph) => self.run_graph(path, request, graph).await,
            None => self.run_linear(path, request).await,
        }
    }

    /// The fixed pipeline used when the request carries no explicit graph.
    async fn run_linear(&self, path: &str, request: &EnrichRequest) -> PipelineState {
        let state = self.loader.load_state(path, request);
        if state.has_error() {
            return state;
        }
        let state = self.filter.apply(&state);
        if state.has_error() {
            return state;
        }
        let state = self.enrich.apply(&state).await;
        if state.has_error() {
            return state;
        }
        self.emitter.apply(&state)
    }

    async fn run_graph(
        &self,
        path: &str,
        request: &EnrichRequest,
        graph: &WorkflowGraph,
    ) -> PipelineState {
        let order = graph.execution_order();
        info!(nodes = order.len(), "executing workflow");

        let base = PipelineState::new(path, request.clone());
        let mut outputs: Vec<(String, PipelineState)> = Vec::with_capacity(order.len());

        for id in &order {
            let Some(node) = graph.node(id) else {
                continue;
            };
            // Single-predecessor merge: the first incoming edge wins; nodes
            // without predecessors start from the base state.
            let input = graph
                .predecessors(id)
                .first()
                .copied()
                .and_then(|pred| outputs.iter().find(|(n, _)| n == pred))
                .map(|(_, s)| s.clone())
                .unwrap_or_else(|| base.clone());

            let output = self.run_node(path, node, &input).await;
            if output.has_error() {
                warn!(
                    node = %node.id,
                    error = output.error.as_deref().unwrap_or(""),
                    "workflow aborted"
                );
                return output;
            }
            outputs.push((node.id.clone(), output));
        }

        self.select_terminal(graph, &order, outputs)
            .unwrap_or_else(|| base.with_error(NO_NODES_EXECUTED))
    }

    async fn run_node(
        &self,
        path: &str,
        node: &NodeSpec,
        input: &PipelineState,
    ) -> PipelineState {
        // Node config overlays the run's request for this node onward.
        let state = match input.request.as_ref() {
            Some(request) if !node.config.is_empty() => {
                input.with_request(request.overlay(&node.config))
            }
            _ => input.clone(),
        };

        match &node.node_type {
            NodeType::Load => {
                // Load reads from disk regardless of upstream state.
                let request = state.request.clone().unwrap_or_default();
                self.loader.load_state(path, &request)
            }
            NodeType::Filter => self.filter.apply(&state),
            NodeType::Enrich => {
                // Tolerate graphs that skip the filter node.
                let state = if state.filtered.is_none() {
                    self.filter.apply(&state)
                } else {
                    state
                };
                if state.has_error() {
                    return state;
                }
                self.enrich.apply(&state).await
            }
            NodeType::Output => self.emitter.apply(&state),
            NodeType::Other(kind) => {
                warn!(node = %node.id, kind = %kind, "unknown node type, passing state through");
                state
            }
        }
    }

    /// Picks the run's final state: the first terminal whose state is
    /// materialized, else the first terminal, else the last node executed.
    fn select_terminal(
        &self,
        graph: &WorkflowGraph,
        order: &[String],
        outputs: Vec<(String, PipelineState)>,
    ) -> Option<PipelineState> {
        if outputs.is_empty() {
            return None;
        }
        let terminals = graph.terminals();
        let of = |id: &str| outputs.iter().find(|(n, _)| n == id).map(|(_, s)| s);

        if let Some(state) = terminals
            .iter()
            .find_map(|id| of(id).filter(|s| s.is_materialized()))
        {
            return Some(state.clone());
        }
        if let Some(state) = terminals.first().and_then(|id| of(id)) {
            return Some(state.clone());
        }
        order.iter().rev().find_map(|id| of(id)).cloned()
    }
}
