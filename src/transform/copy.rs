// src/transform/copy.rs

//! Default transform for tasks without a `run` command.

use std::fs::{self, File};
use std::future::Future;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::pin::Pin;

use tracing::debug;

use crate::changes::OutputMap;
use crate::context::PipelineContext;
use crate::errors::Result;
use crate::transform::{Transform, TransformJob};

/// Copies per-file inputs to their mapped outputs; bundle tasks concatenate
/// all inputs, in src order, into the single output file.
#[derive(Debug, Clone, Default)]
pub struct CopyTransform;

impl Transform for CopyTransform {
    fn apply<'a>(
        &'a self,
        _ctx: &'a PipelineContext,
        job: TransformJob<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PathBuf>>> + Send + 'a>> {
        Box::pin(async move {
            fs::create_dir_all(job.dest)?;

            let mut produced = Vec::new();

            match job.output {
                OutputMap::Single { .. } => {
                    let first = match job.inputs.first() {
                        Some(first) => first,
                        None => return Ok(produced),
                    };
                    let out = job.output.output_for(job.dest, job.base, first);
                    let mut writer = BufWriter::new(File::create(&out)?);
                    for input in job.inputs {
                        let contents = fs::read(input)?;
                        writer.write_all(&contents)?;
                    }
                    writer.flush()?;
                    debug!(task = %job.task, out = ?out, inputs = job.inputs.len(), "concatenated bundle");
                    produced.push(out);
                }
                OutputMap::PerFile { .. } => {
                    for input in job.inputs {
                        let out = job.output.output_for(job.dest, job.base, input);
                        if let Some(parent) = out.parent() {
                            fs::create_dir_all(parent)?;
                        }
                        fs::copy(input, &out)?;
                        produced.push(out);
                    }
                    debug!(task = %job.task, copied = produced.len(), "copied inputs");
                }
            }

            Ok(produced)
        })
    }
}
