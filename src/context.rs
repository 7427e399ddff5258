// src/context.rs

//! Shared execution context.
//!
//! One [`PipelineContext`] is created per invocation (or per watch session)
//! and passed explicitly to every task and the watch session. There is no
//! global state; teardown is dropping the context.

use std::path::{Path, PathBuf};

use crate::reload::ReloadHub;

/// Everything a running task needs to know about its surroundings.
#[derive(Debug)]
pub struct PipelineContext {
    /// Project root; all configured paths resolve against it.
    root: PathBuf,
    /// Resolved output directory (`<root>/<project.dist>`).
    dist: PathBuf,
    /// Live-reload notification hub.
    reload: ReloadHub,
}

impl PipelineContext {
    pub fn new(root: impl Into<PathBuf>, dist: &str) -> Self {
        let root = root.into();
        let dist = root.join(dist);
        Self {
            root,
            dist,
            reload: ReloadHub::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dist(&self) -> &Path {
        &self.dist
    }

    pub fn reload(&self) -> &ReloadHub {
        &self.reload
    }

    /// Resolve a configured (root-relative) path.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
