// src/changes/mod.rs

//! Staleness detection: which inputs actually need re-processing.
//!
//! The mtime policy lives here; the content-hash alternative is in [`hash`].

pub mod hash;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::errors::Result;

/// How a task's inputs map to outputs under its destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMap {
    /// One output per input, keeping the file name; `ext` optionally rewrites
    /// the extension (e.g. `ttf` -> `woff2`).
    PerFile { ext: Option<String> },
    /// All inputs feed a single named output (bundle tasks).
    Single { name: String },
}

impl OutputMap {
    /// The output path a given input maps to.
    ///
    /// Per-file outputs keep the input's path below `base` (the literal
    /// prefix of the task's src globs), so nested inputs land in matching
    /// subdirectories instead of flattening onto each other.
    pub fn output_for(&self, dest: &Path, base: &Path, input: &Path) -> PathBuf {
        match self {
            OutputMap::PerFile { ext } => {
                let rel = match input.strip_prefix(base) {
                    Ok(rel) => rel,
                    Err(_) => Path::new(input.file_name().unwrap_or(input.as_os_str())),
                };
                let mut out = dest.join(rel);
                if let Some(ext) = ext {
                    out.set_extension(ext);
                }
                out
            }
            OutputMap::Single { name } => dest.join(name),
        }
    }
}

/// The subset of matched inputs requiring re-processing.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub stale: Vec<PathBuf>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.stale.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stale.len()
    }
}

/// Compute the [`ChangeSet`] for the given inputs against `dest`, mapping
/// per-file outputs relative to `base`.
///
/// An input is stale when its mtime strictly exceeds the mapped output's
/// mtime, or the output does not exist. Equal mtimes count as up to date:
/// ties are common on fast successive builds and skipping avoids redundant
/// work. Stale outputs are never deleted here.
///
/// For [`OutputMap::Single`] any stale input marks the whole input set stale,
/// since the bundle must be rebuilt from all of them.
pub fn compute_change_set(
    inputs: &[PathBuf],
    base: &Path,
    dest: &Path,
    map: &OutputMap,
) -> Result<ChangeSet> {
    let mut stale = Vec::new();

    for input in inputs {
        let output = map.output_for(dest, base, input);
        if is_newer(input, &output)? {
            stale.push(input.clone());
        }
    }

    if matches!(map, OutputMap::Single { .. }) && !stale.is_empty() {
        debug!(
            stale = stale.len(),
            total = inputs.len(),
            "bundle output stale; rebuilding from all inputs"
        );
        stale = inputs.to_vec();
    }

    Ok(ChangeSet { stale })
}

/// Whether `input` is strictly newer than `output` (or `output` is missing).
fn is_newer(input: &Path, output: &Path) -> Result<bool> {
    let out_mtime = match fs::metadata(output) {
        Ok(meta) => meta.modified()?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e.into()),
    };

    let in_mtime = mtime_of(input)?;
    Ok(in_mtime > out_mtime)
}

fn mtime_of(path: &Path) -> Result<SystemTime> {
    Ok(fs::metadata(path)?.modified()?)
}
