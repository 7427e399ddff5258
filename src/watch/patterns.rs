// src/watch/patterns.rs

//! Per-task watch bindings: compiled glob patterns plus the pipeline node to
//! run when they match.

use std::fmt;

use globset::GlobSet;

use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::globs::build_globset;
use crate::pipeline::{PipelineNode, PipelineSet};

/// Association between a filesystem glob set and the node to run on change.
///
/// Lives for the duration of a watch session.
#[derive(Clone)]
pub struct WatchBinding {
    name: String,
    set: GlobSet,
    node: PipelineNode,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new(name: impl Into<String>, set: GlobSet, node: PipelineNode) -> Self {
        Self {
            name: name.into(),
            set,
            node,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &PipelineNode {
        &self.node
    }

    /// Whether this binding is interested in the given root-relative path
    /// (forward slashes, e.g. `"src/styles/style.scss"`).
    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

/// Build one binding per configured task from its `watch` globs (falling back
/// to `src`).
pub fn build_bindings(cfg: &ConfigFile, set: &PipelineSet) -> Result<Vec<WatchBinding>> {
    let mut bindings = Vec::with_capacity(cfg.task.len());

    for (name, tc) in &cfg.task {
        // Tasks exist for every config entry; PipelineSet was built from the
        // same config.
        let Some(task) = set.task(name) else { continue };
        let watch_set = build_globset(tc.watch_patterns())?;
        bindings.push(WatchBinding::new(
            name.clone(),
            watch_set,
            PipelineNode::leaf(std::sync::Arc::clone(task)),
        ));
    }

    Ok(bindings)
}
