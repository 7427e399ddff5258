// src/archive.rs

//! Deterministic zip archiving of the output tree.
//!
//! Entries are sorted by path and written with a fixed modification
//! timestamp, so repeated runs over identical content produce byte-identical
//! archives.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::{PipelineError, Result};
use crate::globs::relative_key;

/// Package every file under `source_dir` into a zip at `dest_path`.
///
/// Fails when `source_dir` is missing, unreadable, or contains no files.
pub fn archive(source_dir: &Path, dest_path: &Path) -> Result<()> {
    if !source_dir.is_dir() {
        return Err(PipelineError::Archive(format!(
            "source directory {:?} does not exist",
            source_dir
        )));
    }

    let files = collect_files(source_dir)?;
    if files.is_empty() {
        return Err(PipelineError::Archive(format!(
            "source directory {:?} contains no files",
            source_dir
        )));
    }

    let file = File::create(dest_path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    // Fixed timestamp (zip epoch, 1980-01-01) keeps output reproducible.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for path in &files {
        let Some(entry_name) = relative_key(source_dir, path) else {
            continue;
        };
        writer
            .start_file(&entry_name, options)
            .map_err(|e| PipelineError::Archive(format!("writing entry '{entry_name}': {e}")))?;

        let mut input = File::open(path)?;
        let mut buf = [0u8; 8192];
        loop {
            let n = input.read(&mut buf)?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n])?;
        }
    }

    writer
        .finish()
        .map_err(|e| PipelineError::Archive(format!("finalizing archive: {e}")))?;

    info!(
        entries = files.len(),
        archive = ?dest_path,
        "archive written"
    );
    Ok(())
}

/// All files under `dir`, sorted by path for deterministic entry order.
fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
