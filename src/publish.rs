// src/publish.rs

//! Publishing source trees to a VCS remote via the external `git` binary.
//!
//! `git` is treated like any other external collaborator: invoked as a
//! subprocess, with non-zero exits surfaced as `Vcs` errors and never
//! retried. Before staging anything, the working tree is checked for
//! uncommitted changes outside the configured publish set; silently sweeping
//! unrelated changes into the commit is refused.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::model::PublishSection;
use crate::errors::{PipelineError, Result};

/// Stage the configured paths, commit, and push to the configured
/// remote/branch.
pub async fn publish(root: &Path, cfg: &PublishSection) -> Result<()> {
    let dirty = dirty_paths(root).await?;
    let unrelated: Vec<&str> = dirty
        .iter()
        .map(|s| s.as_str())
        .filter(|path| !covered_by(path, &cfg.paths))
        .collect();

    if !unrelated.is_empty() {
        return Err(PipelineError::Vcs(format!(
            "uncommitted changes outside the publish set would be left behind or \
             accidentally included: {unrelated:?}; commit or stash them first"
        )));
    }

    if dirty.is_empty() {
        info!("working tree clean; nothing to publish");
        return Ok(());
    }

    let mut add_args = vec!["add", "--"];
    add_args.extend(cfg.paths.iter().map(|s| s.as_str()));
    run_git(root, &add_args).await?;

    run_git(root, &["commit", "-m", &cfg.message]).await?;
    run_git(root, &["push", &cfg.remote, &cfg.branch]).await?;

    info!(
        remote = %cfg.remote,
        branch = %cfg.branch,
        "published"
    );
    Ok(())
}

/// Paths with uncommitted changes, from `git status --porcelain`.
async fn dirty_paths(root: &Path) -> Result<Vec<String>> {
    let stdout = run_git(root, &["status", "--porcelain"]).await?;
    Ok(parse_porcelain(&stdout))
}

/// Parse `git status --porcelain` output into the listed paths.
fn parse_porcelain(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            // Format: two status columns, a space, then the path. Renames
            // use "old -> new"; the new path is what would be committed.
            let path = line.get(3..)?.trim();
            if path.is_empty() {
                return None;
            }
            let path = match path.split_once(" -> ") {
                Some((_, new)) => new,
                None => path,
            };
            Some(unquote(path))
        })
        .collect()
}

/// Undo git's path quoting (`core.quotePath`): surrounding quotes plus
/// backslash escapes, including octal byte sequences for non-ASCII names.
fn unquote(path: &str) -> String {
    let Some(inner) = path
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
    else {
        return path.to_string();
    };

    let bytes = inner.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' || i + 1 == bytes.len() {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        i += 1;
        match bytes[i] {
            b'n' => {
                out.push(b'\n');
                i += 1;
            }
            b't' => {
                out.push(b'\t');
                i += 1;
            }
            b'0'..=b'7' => {
                let mut value = 0u32;
                let mut digits = 0;
                while digits < 3 && i < bytes.len() && (b'0'..=b'7').contains(&bytes[i]) {
                    value = value * 8 + u32::from(bytes[i] - b'0');
                    i += 1;
                    digits += 1;
                }
                out.push(value as u8);
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Whether a dirty path falls under one of the configured publish paths.
fn covered_by(path: &str, publish_paths: &[String]) -> bool {
    publish_paths.iter().any(|p| {
        let prefix = p.trim_end_matches('/');
        path == prefix || path.starts_with(&format!("{prefix}/"))
    })
}

/// Run git with the given arguments in `root`, returning stdout.
async fn run_git(root: &Path, args: &[&str]) -> Result<String> {
    debug!(?args, "running git");

    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| PipelineError::Vcs(format!("failed to spawn git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::Vcs(format!(
            "git {} failed with {}: {}",
            args.first().unwrap_or(&""),
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
