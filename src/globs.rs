// src/globs.rs

//! Glob compilation and matching-file collection.
//!
//! All patterns are evaluated relative to the project root; matching uses
//! forward-slash relative paths regardless of platform.

use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::Result;

/// Build a [`GlobSet`] from string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Literal directory prefix shared by the given patterns.
///
/// Components are taken up to the first one containing glob metacharacters;
/// the final component is always dropped (it names files, not a directory).
/// Per-file tasks preserve the part of each input path below this base, so
/// `src/img/**` matching `src/img/icons/logo.png` keeps `icons/logo.png`.
pub fn glob_base(patterns: &[String]) -> PathBuf {
    let mut common: Option<Vec<&str>> = None;

    for pat in patterns {
        let parts: Vec<&str> = pat.split('/').collect();
        let mut literal = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            if i + 1 == parts.len() || part.contains(['*', '?', '[', '{']) {
                break;
            }
            literal.push(*part);
        }
        common = Some(match common {
            None => literal,
            Some(prev) => prev
                .into_iter()
                .zip(literal)
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect(),
        });
    }

    common.unwrap_or_default().iter().collect()
}

/// Relative, forward-slash form of `path` under `root`, if it is under root.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// Collect all files under `root` matching the given set, sorted by path for
/// deterministic processing order.
pub fn collect_matching_files(root: &Path, set: &GlobSet) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            // A watched directory can disappear between walk steps.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                if let Some(rel) = relative_key(root, &path) {
                    if set.is_match(&rel) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}
