//! Pipeline processing stages.
//!
//! Each stage consumes a [`PipelineState`](crate::state::PipelineState) and
//! produces a new one; the executor decides which stage a graph node
//! dispatches to. Stage-level failures become error-bearing states, never
//! panics or propagated errors, so the executor can terminate a run with a
//! single human-readable message.

pub mod emit;
pub mod enrich;
pub mod filter;
pub mod loader;
