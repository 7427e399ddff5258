// src/pipeline/task.rs

//! Leaf unit of work: a named transformation from input globs to an output
//! directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::GlobSet;
use tracing::{debug, info};

use crate::changes::hash::{compute_hash_for_paths, HashCache};
use crate::changes::{compute_change_set, OutputMap};
use crate::config::model::{FreshnessPolicy, TaskConfig};
use crate::context::PipelineContext;
use crate::errors::{PipelineError, Result};
use crate::globs::{build_globset, collect_matching_files, glob_base};
use crate::transform::{CommandTransform, CopyTransform, Transform, TransformJob};

/// A declarative, idempotent unit of file transformation work.
#[derive(Debug)]
pub struct Task {
    name: String,
    src_patterns: Vec<String>,
    src_set: GlobSet,
    dest: PathBuf,
    output: OutputMap,
    incremental: bool,
    freshness: FreshnessPolicy,
    allow_empty: bool,
    transform: Arc<dyn Transform>,
}

/// What a single task run did.
#[derive(Debug, Clone, Default)]
pub struct TaskReport {
    /// Inputs handed to the transform.
    pub processed: usize,
    /// Outputs the transform reported producing.
    pub outputs: Vec<PathBuf>,
    /// True when the change detector found nothing to do.
    pub skipped: bool,
}

impl Task {
    /// Build a task from its config section, resolving paths against the
    /// context root.
    pub fn from_config(name: &str, cfg: &TaskConfig, ctx: &PipelineContext) -> Result<Self> {
        let transform: Arc<dyn Transform> = match &cfg.run {
            Some(template) => Arc::new(CommandTransform::new(template.clone())),
            None => Arc::new(CopyTransform),
        };
        Ok(Self {
            name: name.to_string(),
            src_patterns: cfg.src.clone(),
            src_set: build_globset(&cfg.src)?,
            dest: ctx.resolve(&cfg.dest),
            output: output_map_from_config(cfg),
            incremental: cfg.incremental,
            freshness: cfg.freshness,
            allow_empty: cfg.allow_empty,
            transform,
        })
    }

    /// Construct a task directly; used by tests to plug in fake transforms.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        src_patterns: Vec<String>,
        dest: PathBuf,
        output: OutputMap,
        incremental: bool,
        freshness: FreshnessPolicy,
        allow_empty: bool,
        transform: Arc<dyn Transform>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            src_set: build_globset(&src_patterns)?,
            src_patterns,
            dest,
            output,
            incremental,
            freshness,
            allow_empty,
            transform,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the task: expand inputs, consult the change detector, invoke the
    /// transform on what's stale.
    pub async fn run(&self, ctx: &PipelineContext) -> Result<TaskReport> {
        let inputs = collect_matching_files(ctx.root(), &self.src_set)?;

        if inputs.is_empty() {
            if self.allow_empty {
                debug!(task = %self.name, "no inputs matched; nothing to do");
                return Ok(TaskReport {
                    skipped: true,
                    ..TaskReport::default()
                });
            }
            return Err(PipelineError::Input {
                task: self.name.clone(),
                patterns: self.src_patterns.clone(),
            });
        }

        // Per-file outputs keep the input path below the literal glob prefix.
        let base = ctx.resolve(glob_base(&self.src_patterns));

        let stale = self.select_stale(ctx, &inputs, &base)?;
        if stale.is_empty() {
            info!(task = %self.name, inputs = inputs.len(), "up to date; skipping");
            return Ok(TaskReport {
                skipped: true,
                ..TaskReport::default()
            });
        }

        let job = TransformJob {
            task: &self.name,
            inputs: &stale,
            base: &base,
            dest: &self.dest,
            output: &self.output,
        };
        let outputs = self.transform.apply(ctx, job).await?;

        // Record the new input hash only after the transform succeeded, so a
        // failed run stays stale.
        if self.incremental && self.freshness == FreshnessPolicy::Hash {
            let hash = compute_hash_for_paths(&inputs)?;
            HashCache::new(ctx.root()).save(&self.name, &hash)?;
        }

        info!(
            task = %self.name,
            processed = stale.len(),
            outputs = outputs.len(),
            "task finished"
        );

        Ok(TaskReport {
            processed: stale.len(),
            outputs,
            skipped: false,
        })
    }

    /// Which of the matched inputs need processing this run.
    fn select_stale(
        &self,
        ctx: &PipelineContext,
        inputs: &[PathBuf],
        base: &Path,
    ) -> Result<Vec<PathBuf>> {
        if !self.incremental {
            return Ok(inputs.to_vec());
        }

        match self.freshness {
            FreshnessPolicy::Mtime => {
                let changes = compute_change_set(inputs, base, &self.dest, &self.output)?;
                debug!(
                    task = %self.name,
                    stale = changes.len(),
                    total = inputs.len(),
                    "change detector result"
                );
                Ok(changes.stale)
            }
            FreshnessPolicy::Hash => {
                let current = compute_hash_for_paths(inputs)?;
                let stored = HashCache::new(ctx.root()).load(&self.name)?;
                if stored.as_deref() == Some(current.as_str()) {
                    Ok(Vec::new())
                } else {
                    Ok(inputs.to_vec())
                }
            }
        }
    }
}

fn output_map_from_config(cfg: &TaskConfig) -> OutputMap {
    match (&cfg.out, &cfg.out_ext) {
        (Some(name), _) => OutputMap::Single { name: name.clone() },
        (None, ext) => OutputMap::PerFile { ext: ext.clone() },
    }
}
