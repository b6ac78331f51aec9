//! Workflow graph definition.
//!
//! A [`WorkflowGraph`] is the declared node/edge structure of a run: a list
//! of typed [`NodeSpec`]s and directed [`EdgeSpec`]s, deserializable from a
//! request payload. The graph is expected to be acyclic, but a malformed
//! graph still attempts execution: cycle detection falls back to declaration
//! order instead of failing, and dangling edges are warned about and
//! skipped.
//!
//! # Examples
//!
//! ```
//! use rowloom::graph::{WorkflowGraph, NodeSpec, EdgeSpec, NodeType};
//!
//! let graph = WorkflowGraph::new(
//!     vec![
//!         NodeSpec::new("load", NodeType::Load),
//!         NodeSpec::new("enrich", NodeType::Enrich),
//!     ],
//!     vec![EdgeSpec::new("load", "enrich")],
//! );
//!
//! let order = graph.execution_order();
//! assert_eq!(order, vec!["load".to_string(), "enrich".to_string()]);
//! assert_eq!(graph.terminals(), vec!["enrich".to_string()]);
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::record::FieldMap;

/// The processing stage a graph node dispatches to.
///
/// Unknown type strings land in [`NodeType::Other`] and pass state through
/// unchanged, so future node kinds do not fail a run.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    Load,
    Filter,
    Enrich,
    Output,
    Other(String),
}

impl NodeType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Load => "load",
            NodeType::Filter => "filter",
            NodeType::Enrich => "enrich",
            NodeType::Output => "output",
            NodeType::Other(s) => s,
        }
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        match s {
            "load" => NodeType::Load,
            "filter" | "preprocess" => NodeType::Filter,
            "enrich" | "process" => NodeType::Enrich,
            "output" => NodeType::Output,
            other => NodeType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeType::from(s.as_str()))
    }
}

/// One typed unit of work in the graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique identifier within the graph.
    #[serde(rename = "node_id")]
    pub id: String,
    #[serde(rename = "node_type")]
    pub node_type: NodeType,
    /// Opaque per-node request overrides, interpreted by
    /// [`EnrichRequest::overlay`](crate::request::EnrichRequest::overlay).
    #[serde(default)]
    pub config: FieldMap,
}

impl NodeSpec {
    #[must_use]
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            config: FieldMap::new(),
        }
    }

    /// Adds a config override, builder style.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }
}

/// A directed edge between two nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
}

impl EdgeSpec {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Declared workflow structure: typed nodes plus directed edges.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

impl WorkflowGraph {
    #[must_use]
    pub fn new(nodes: Vec<NodeSpec>, edges: Vec<EdgeSpec>) -> Self {
        Self { nodes, edges }
    }

    /// The fixed four-stage linear pipeline as an explicit graph. Executing
    /// it is equivalent to the no-graph fallback.
    #[must_use]
    pub fn linear() -> Self {
        Self::new(
            vec![
                NodeSpec::new("load", NodeType::Load),
                NodeSpec::new("filter", NodeType::Filter),
                NodeSpec::new("enrich", NodeType::Enrich),
                NodeSpec::new("output", NodeType::Output),
            ],
            vec![
                EdgeSpec::new("load", "filter"),
                EdgeSpec::new("filter", "enrich"),
                EdgeSpec::new("enrich", "output"),
            ],
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Declared nodes with duplicate ids removed, first declaration wins.
    /// Extra declarations are warned about and ignored by every traversal
    /// below, so a duplicated id can never schedule a node twice.
    fn unique_nodes(&self) -> Vec<&NodeSpec> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        self.nodes
            .iter()
            .filter(|n| {
                let fresh = seen.insert(n.id.as_str());
                if !fresh {
                    tracing::warn!(node = %n.id, "duplicate node id, keeping first declaration");
                }
                fresh
            })
            .collect()
    }

    /// Edges whose endpoints reference declared nodes. Dangling edges are
    /// warned about and otherwise ignored by every traversal below.
    fn valid_edges(&self) -> impl Iterator<Item = &EdgeSpec> {
        let ids: FxHashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges.iter().filter(move |e| {
            let ok = ids.contains(e.source.as_str()) && ids.contains(e.target.as_str());
            if !ok {
                tracing::warn!(source = %e.source, target = %e.target, "skipping dangling edge");
            }
            ok
        })
    }

    /// Predecessors of `id`, in edge declaration order.
    #[must_use]
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.valid_edges()
            .filter(|e| e.target == id)
            .map(|e| e.source.as_str())
            .collect()
    }

    /// Node ids with no outgoing edges, in declaration order.
    #[must_use]
    pub fn terminals(&self) -> Vec<String> {
        let sources: FxHashSet<&str> = self.valid_edges().map(|e| e.source.as_str()).collect();
        self.unique_nodes()
            .into_iter()
            .filter(|n| !sources.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Computes a topological execution order via Kahn's algorithm.
    ///
    /// In-degrees are taken from the declared edges; nodes become ready when
    /// all predecessors have been emitted, and ready nodes are processed in
    /// declaration order so the result is deterministic. If the graph
    /// contains a cycle the produced order would be shorter than the node
    /// count; in that case this falls back to declaration order with a
    /// warning so a malformed graph still attempts execution.
    #[must_use]
    pub fn execution_order(&self) -> Vec<String> {
        let nodes = self.unique_nodes();
        let mut in_degree: FxHashMap<&str, usize> =
            nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
        let mut successors: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
        for edge in self.valid_edges() {
            *in_degree.entry(edge.target.as_str()).or_insert(0) += 1;
            successors
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.target.as_str());
        }

        // Seed with zero in-degree nodes in declaration order.
        let mut queue: VecDeque<&str> = nodes
            .iter()
            .map(|n| n.id.as_str())
            .filter(|id| in_degree.get(id).copied().unwrap_or(0) == 0)
            .collect();

        let mut order: Vec<String> = Vec::with_capacity(nodes.len());
        while let Some(id) = queue.pop_front() {
            order.push(id.to_string());
            if let Some(next) = successors.get(id) {
                for &succ in next {
                    if let Some(deg) = in_degree.get_mut(succ) {
                        *deg = deg.saturating_sub(1);
                        if *deg == 0 {
                            queue.push_back(succ);
                        }
                    }
                }
            }
        }

        if order.len() < nodes.len() {
            tracing::warn!(
                ordered = order.len(),
                declared = nodes.len(),
                "workflow graph contains a cycle, executing in declaration order"
            );
            return nodes.iter().map(|n| n.id.clone()).collect();
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> WorkflowGraph {
        WorkflowGraph::new(
            vec![
                NodeSpec::new("a", NodeType::Load),
                NodeSpec::new("b", NodeType::Filter),
                NodeSpec::new("c", NodeType::Filter),
                NodeSpec::new("d", NodeType::Output),
            ],
            vec![
                EdgeSpec::new("a", "b"),
                EdgeSpec::new("a", "c"),
                EdgeSpec::new("b", "d"),
                EdgeSpec::new("c", "d"),
            ],
        )
    }

    #[test]
    fn order_respects_edges() {
        let graph = diamond();
        let order = graph.execution_order();
        let pos = |id: &str| order.iter().position(|n| n == id).unwrap();
        assert_eq!(order.len(), 4);
        assert!(pos("a") < pos("b"));
        assert!(pos("a") < pos("c"));
        assert!(pos("b") < pos("d"));
        assert!(pos("c") < pos("d"));
    }

    #[test]
    fn cycle_falls_back_to_declaration_order() {
        let graph = WorkflowGraph::new(
            vec![
                NodeSpec::new("a", NodeType::Load),
                NodeSpec::new("b", NodeType::Enrich),
            ],
            vec![EdgeSpec::new("a", "b"), EdgeSpec::new("b", "a")],
        );
        assert_eq!(
            graph.execution_order(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn dangling_edges_are_ignored() {
        let graph = WorkflowGraph::new(
            vec![NodeSpec::new("a", NodeType::Load)],
            vec![EdgeSpec::new("a", "ghost")],
        );
        assert_eq!(graph.execution_order(), vec!["a".to_string()]);
        assert_eq!(graph.terminals(), vec!["a".to_string()]);
    }

    #[test]
    fn duplicate_node_ids_schedule_once() {
        let graph = WorkflowGraph::new(
            vec![
                NodeSpec::new("a", NodeType::Load),
                NodeSpec::new("a", NodeType::Filter),
                NodeSpec::new("b", NodeType::Output),
            ],
            vec![EdgeSpec::new("a", "b")],
        );
        assert_eq!(
            graph.execution_order(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(graph.terminals(), vec!["b".to_string()]);
    }

    #[test]
    fn terminals_in_declaration_order() {
        let graph = diamond();
        assert_eq!(graph.terminals(), vec!["d".to_string()]);
    }

    #[test]
    fn node_type_aliases() {
        assert_eq!(NodeType::from("preprocess"), NodeType::Filter);
        assert_eq!(NodeType::from("process"), NodeType::Enrich);
        assert_eq!(
            NodeType::from("notify"),
            NodeType::Other("notify".to_string())
        );
    }

    #[test]
    fn graph_deserializes_from_payload() {
        let graph: WorkflowGraph = serde_json::from_value(serde_json::json!({
            "nodes": [
                {"node_id": "load", "node_type": "load", "config": {}},
                {"node_id": "proc", "node_type": "process", "config": {"batch_size": 2}},
            ],
            "edges": [{"source": "load", "target": "proc"}],
        }))
        .unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[1].node_type, NodeType::Enrich);
    }
}
