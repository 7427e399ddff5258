// src/config/validate.rs

//! Semantic validation of a deserialized [`ConfigFile`].
//!
//! TOML deserialization only checks shape; this module checks meaning:
//! - tasks have usable src/dest and a coherent output mapping
//! - glob patterns compile
//! - pipeline steps reference known tasks/pipelines
//! - pipeline references are acyclic
//! - nothing shadows a built-in target name

use std::collections::HashSet;

use globset::Glob;

use crate::config::model::{ConfigFile, Step};
use crate::errors::{PipelineError, Result};

/// Target names handled directly by the run dispatcher.
pub const RESERVED_TARGETS: &[&str] = &["watch", "clean", "zip", "publish"];

pub fn validate(cfg: &ConfigFile) -> Result<()> {
    for (name, task) in &cfg.task {
        validate_name(name, cfg)?;

        if task.src.is_empty() {
            return Err(PipelineError::Config(format!(
                "task '{name}': src must list at least one glob"
            )));
        }
        if task.dest.trim().is_empty() {
            return Err(PipelineError::Config(format!(
                "task '{name}': dest must not be empty"
            )));
        }
        if task.out.is_some() && task.out_ext.is_some() {
            return Err(PipelineError::Config(format!(
                "task '{name}': 'out' and 'out_ext' are mutually exclusive"
            )));
        }

        for pattern in task.src.iter().chain(task.watch_patterns()) {
            Glob::new(pattern).map_err(|e| {
                PipelineError::Config(format!("task '{name}': invalid glob '{pattern}': {e}"))
            })?;
        }
    }

    for (name, pipeline) in &cfg.pipeline {
        validate_name(name, cfg)?;

        if pipeline.steps.is_empty() {
            return Err(PipelineError::Config(format!(
                "pipeline '{name}': steps must not be empty"
            )));
        }

        for step in &pipeline.steps {
            if let Step::Group(names) = step {
                if names.is_empty() {
                    return Err(PipelineError::Config(format!(
                        "pipeline '{name}': empty parallel group"
                    )));
                }
            }
            for referenced in step.names() {
                if !cfg.task.contains_key(referenced) && !cfg.pipeline.contains_key(referenced) {
                    return Err(PipelineError::Config(format!(
                        "pipeline '{name}': unknown step '{referenced}'"
                    )));
                }
            }
        }
    }

    check_pipeline_cycles(cfg)?;

    Ok(())
}

fn validate_name(name: &str, cfg: &ConfigFile) -> Result<()> {
    if RESERVED_TARGETS.contains(&name) {
        return Err(PipelineError::Config(format!(
            "'{name}' is a built-in target and cannot be redefined"
        )));
    }
    // A name may be a task or a pipeline, never both.
    if cfg.task.contains_key(name) && cfg.pipeline.contains_key(name) {
        return Err(PipelineError::Config(format!(
            "'{name}' is defined as both a task and a pipeline"
        )));
    }
    Ok(())
}

/// Reject pipelines that (transitively) reference themselves.
fn check_pipeline_cycles(cfg: &ConfigFile) -> Result<()> {
    for start in cfg.pipeline.keys() {
        let mut on_path = HashSet::new();
        visit(cfg, start, &mut on_path)?;
    }
    Ok(())
}

fn visit<'a>(cfg: &'a ConfigFile, name: &'a str, on_path: &mut HashSet<&'a str>) -> Result<()> {
    if !on_path.insert(name) {
        return Err(PipelineError::Config(format!(
            "pipeline reference cycle involving '{name}'"
        )));
    }

    if let Some(pipeline) = cfg.pipeline.get(name) {
        for step in &pipeline.steps {
            for referenced in step.names() {
                if cfg.pipeline.contains_key(referenced) {
                    visit(cfg, referenced, on_path)?;
                }
            }
        }
    }

    on_path.remove(name);
    Ok(())
}
