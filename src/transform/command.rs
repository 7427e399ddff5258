// src/transform/command.rs

//! Transform backed by an external command template.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::changes::OutputMap;
use crate::context::PipelineContext;
use crate::errors::{PipelineError, Result};
use crate::transform::{Transform, TransformJob};

/// Runs a configured command template through the platform shell.
///
/// Placeholders:
/// - `{in}`: the input file; for bundle tasks, all inputs joined by spaces
/// - `{out}`: the mapped output path
/// - `{dest}`: the output directory
///
/// Per-file tasks invoke the command once per stale input; bundle tasks
/// invoke it once with the full input list.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    template: String,
}

impl CommandTransform {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    fn render(&self, inputs: &str, out: &Path, dest: &Path) -> String {
        self.template
            .replace("{in}", inputs)
            .replace("{out}", &out.display().to_string())
            .replace("{dest}", &dest.display().to_string())
    }
}

impl Transform for CommandTransform {
    fn apply<'a>(
        &'a self,
        ctx: &'a PipelineContext,
        job: TransformJob<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PathBuf>>> + Send + 'a>> {
        Box::pin(async move {
            std::fs::create_dir_all(job.dest)?;

            let mut produced = Vec::new();

            match job.output {
                OutputMap::Single { .. } => {
                    let first = match job.inputs.first() {
                        Some(first) => first,
                        None => return Ok(produced),
                    };
                    let out = job.output.output_for(job.dest, job.base, first);
                    let joined = job
                        .inputs
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(" ");
                    let cmd = self.render(&joined, &out, job.dest);
                    run_shell(ctx, job.task, &cmd).await?;
                    produced.push(out);
                }
                OutputMap::PerFile { .. } => {
                    for input in job.inputs {
                        let out = job.output.output_for(job.dest, job.base, input);
                        if let Some(parent) = out.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        let cmd = self.render(&input.display().to_string(), &out, job.dest);
                        run_shell(ctx, job.task, &cmd).await?;
                        produced.push(out);
                    }
                }
            }

            Ok(produced)
        })
    }
}

/// Run a shell command in the project root, mapping failure to a transform
/// error carrying the tool's stderr.
async fn run_shell(ctx: &PipelineContext, task: &str, cmd_line: &str) -> Result<()> {
    info!(task = %task, cmd = %cmd_line, "running external transform");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_line);
        c
    };

    let output = cmd
        .current_dir(ctx.root())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    debug!(
        task = %task,
        exit_code = output.status.code().unwrap_or(-1),
        "external transform exited"
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::Transform {
            message: format!(
                "'{}' exited with {}: {}",
                cmd_line,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            ),
        });
    }

    Ok(())
}
