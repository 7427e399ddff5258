// src/pipeline/build.rs

//! Builds runnable pipelines from a validated [`ConfigFile`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::model::{ConfigFile, PipelineConfig, Step};
use crate::context::PipelineContext;
use crate::errors::{PipelineError, Result};
use crate::pipeline::task::Task;
use crate::pipeline::{parallel, series, PipelineNode};

/// All tasks and pipelines from one config, ready to resolve into nodes.
#[derive(Debug)]
pub struct PipelineSet {
    tasks: HashMap<String, Arc<Task>>,
    pipelines: BTreeMap<String, PipelineConfig>,
}

impl PipelineSet {
    /// Instantiate every configured task. Config validation has already
    /// checked name uniqueness, step references, and reference cycles.
    pub fn from_config(cfg: &ConfigFile, ctx: &PipelineContext) -> Result<Self> {
        let mut tasks = HashMap::new();
        for (name, tc) in &cfg.task {
            let task = Task::from_config(name, tc, ctx)?;
            tasks.insert(name.clone(), Arc::new(task));
        }
        Ok(Self {
            tasks,
            pipelines: cfg.pipeline.clone(),
        })
    }

    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.get(name)
    }

    pub fn pipeline(&self, name: &str) -> Option<&PipelineConfig> {
        self.pipelines.get(name)
    }

    pub fn has_target(&self, name: &str) -> bool {
        self.tasks.contains_key(name) || self.pipelines.contains_key(name)
    }

    /// Resolve a target name into a runnable node.
    ///
    /// A task name becomes a leaf; a pipeline name becomes a series of its
    /// steps, with nested arrays becoming parallel groups. Pipeline names
    /// inside steps are resolved recursively.
    pub fn node_for(&self, name: &str) -> Result<PipelineNode> {
        if let Some(task) = self.tasks.get(name) {
            return Ok(PipelineNode::leaf(Arc::clone(task)));
        }

        let pipeline = self.pipelines.get(name).ok_or_else(|| {
            PipelineError::Config(format!("unknown task or pipeline '{name}'"))
        })?;

        let mut nodes = Vec::with_capacity(pipeline.steps.len());
        for step in &pipeline.steps {
            nodes.push(match step {
                Step::Single(step_name) => self.node_for(step_name)?,
                Step::Group(step_names) => {
                    let mut group = Vec::with_capacity(step_names.len());
                    for step_name in step_names {
                        group.push(self.node_for(step_name)?);
                    }
                    parallel(group)
                }
            });
        }

        Ok(series(nodes))
    }
}
