// src/transform/mod.rs

//! External transform collaborators.
//!
//! Asset-specific work (style compilation, image conversion, font
//! conversion, minification) is never implemented here; it is delegated to
//! external tools behind the [`Transform`] trait. Production tasks use
//! [`command::CommandTransform`] (a configured command template) or
//! [`copy::CopyTransform`] (plain copy / concatenation); tests plug in their
//! own implementations.

pub mod command;
pub mod copy;

use std::fmt::Debug;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::changes::OutputMap;
use crate::context::PipelineContext;
use crate::errors::Result;

/// One unit of transform work: the stale inputs of a task plus where their
/// outputs go.
#[derive(Debug, Clone, Copy)]
pub struct TransformJob<'a> {
    pub task: &'a str,
    pub inputs: &'a [PathBuf],
    /// Literal prefix of the task's src globs; per-file outputs keep the
    /// input path below it.
    pub base: &'a Path,
    pub dest: &'a Path,
    pub output: &'a OutputMap,
}

/// Uniform interface over external transformation tools.
///
/// Implementations must not assume anything about file contents; they map
/// inputs to outputs under `job.dest` and report produced paths.
pub trait Transform: Send + Sync + Debug {
    fn apply<'a>(
        &'a self,
        ctx: &'a PipelineContext,
        job: TransformJob<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PathBuf>>> + Send + 'a>>;
}

pub use command::CommandTransform;
pub use copy::CopyTransform;
