// src/clean.rs

//! Built-in clean target: empty the dist tree, minus configured keepers.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::model::CleanSection;
use crate::errors::Result;

/// Remove everything directly under `dist` except the top-level entries named
/// in `cfg.keep` (e.g. `["img", "fonts"]`, whose conversions are expensive).
/// A missing dist directory is a no-op.
pub fn clean(dist: &Path, cfg: &CleanSection) -> Result<()> {
    if !dist.exists() {
        debug!(dist = ?dist, "nothing to clean");
        return Ok(());
    }

    let mut removed = 0usize;
    for entry in fs::read_dir(dist)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if cfg.keep.iter().any(|keep| *keep == name) {
            debug!(entry = %name, "keeping");
            continue;
        }

        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }

    info!(dist = ?dist, removed, kept = cfg.keep.len(), "cleaned");
    Ok(())
}
