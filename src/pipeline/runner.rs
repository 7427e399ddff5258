// src/pipeline/runner.rs

//! Executes composed pipeline nodes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::context::PipelineContext;
use crate::errors::Result;
use crate::pipeline::PipelineNode;

/// Run a pipeline node to completion.
///
/// - Series: children in listed order, fail-fast; the first child failure is
///   surfaced as the series' own failure and remaining children never start.
/// - Parallel: all children are spawned; the node completes when every child
///   has finished. The first-observed failure is returned; failures of other
///   siblings are logged, not suppressed silently.
/// - Leaf: the task runs and its error, if any, is tagged with the task name.
pub fn run_node(
    node: PipelineNode,
    ctx: Arc<PipelineContext>,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
    Box::pin(async move {
        match node {
            PipelineNode::Leaf(task) => {
                let name = task.name().to_string();
                let report = task.run(&ctx).await.map_err(|e| e.tagged(&name))?;
                debug!(
                    task = %name,
                    skipped = report.skipped,
                    processed = report.processed,
                    "leaf node finished"
                );
                Ok(())
            }
            PipelineNode::Series(children) => {
                for child in children {
                    run_node(child, Arc::clone(&ctx)).await?;
                }
                Ok(())
            }
            PipelineNode::Parallel(children) => {
                let mut set = JoinSet::new();
                for child in children {
                    set.spawn(run_node(child, Arc::clone(&ctx)));
                }

                let mut first_error = None;
                while let Some(joined) = set.join_next().await {
                    let result = match joined {
                        Ok(result) => result,
                        Err(join_err) => Err(anyhow!("parallel branch panicked: {join_err}").into()),
                    };
                    if let Err(err) = result {
                        if first_error.is_none() {
                            first_error = Some(err);
                        } else {
                            warn!(error = %err, "additional parallel branch failure");
                        }
                    }
                }

                match first_error {
                    Some(err) => Err(err),
                    None => Ok(()),
                }
            }
        }
    })
}
