// src/pipeline/mod.rs

//! Pipeline composition and execution.
//!
//! A [`PipelineNode`] is a leaf task or an ordered/concurrent composition of
//! other nodes. Composing is purely structural; nothing touches the
//! filesystem until [`runner::run_node`] is invoked.

pub mod build;
pub mod runner;
pub mod task;

use std::sync::Arc;

pub use build::PipelineSet;
pub use runner::run_node;
pub use task::{Task, TaskReport};

/// A composed or leaf unit of orchestration.
#[derive(Debug, Clone)]
pub enum PipelineNode {
    Leaf(Arc<Task>),
    /// Children execute in strict order; the first failure aborts the rest.
    Series(Vec<PipelineNode>),
    /// Children start concurrently; the first observed failure becomes the
    /// node's result, but started siblings run to completion.
    Parallel(Vec<PipelineNode>),
}

impl PipelineNode {
    pub fn leaf(task: Arc<Task>) -> Self {
        PipelineNode::Leaf(task)
    }
}

/// Ordered composition.
pub fn series(nodes: Vec<PipelineNode>) -> PipelineNode {
    PipelineNode::Series(nodes)
}

/// Concurrent composition.
pub fn parallel(nodes: Vec<PipelineNode>) -> PipelineNode {
    PipelineNode::Parallel(nodes)
}
