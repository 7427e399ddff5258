// tests/common/mod.rs

//! Shared helpers and fake transforms for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Once};

use assetpipe::context::PipelineContext;
use assetpipe::errors::{PipelineError, Result};
use assetpipe::transform::{Transform, TransformJob};

/// Initialise tracing once for all tests in a binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Transform that records which task invoked it, in order, without touching
/// the filesystem.
#[derive(Debug, Clone)]
pub struct RecordingTransform {
    pub log: Arc<Mutex<Vec<String>>>,
}

impl RecordingTransform {
    pub fn new(log: Arc<Mutex<Vec<String>>>) -> Self {
        Self { log }
    }
}

impl Transform for RecordingTransform {
    fn apply<'a>(
        &'a self,
        _ctx: &'a PipelineContext,
        job: TransformJob<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PathBuf>>> + Send + 'a>> {
        let log = Arc::clone(&self.log);
        Box::pin(async move {
            log.lock().unwrap().push(job.task.to_string());
            Ok(Vec::new())
        })
    }
}

/// Transform that always fails.
#[derive(Debug, Clone, Default)]
pub struct FailTransform;

impl Transform for FailTransform {
    fn apply<'a>(
        &'a self,
        _ctx: &'a PipelineContext,
        _job: TransformJob<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PathBuf>>> + Send + 'a>> {
        Box::pin(async move {
            Err(PipelineError::Transform {
                message: "synthetic failure".to_string(),
            })
        })
    }
}
