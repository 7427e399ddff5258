// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("task '{task}': no inputs matched {patterns:?}")]
    Input { task: String, patterns: Vec<String> },

    #[error("transform failed: {message}")]
    Transform { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("glob error: {0}")]
    Glob(#[from] globset::Error),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("VCS error: {0}")]
    Vcs(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A task failed somewhere inside a composed pipeline. The name tags the
    /// originating leaf; the source is the unmodified underlying error.
    #[error("task '{task}' failed: {source}")]
    Task {
        task: String,
        #[source]
        source: Box<PipelineError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Wrap an error with the name of the task it originated from, unless it
    /// already carries one.
    pub fn tagged(self, task: &str) -> Self {
        match self {
            already @ PipelineError::Task { .. } => already,
            other => PipelineError::Task {
                task: task.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Name of the task this error originated from, if known.
    pub fn task_name(&self) -> Option<&str> {
        match self {
            PipelineError::Task { task, .. } => Some(task),
            PipelineError::Input { task, .. } => Some(task),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
