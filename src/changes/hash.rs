// src/changes/hash.rs

//! Content-hash freshness policy.
//!
//! Tasks with `freshness = "hash"` skip their transform entirely when the
//! aggregate blake3 hash of their matched inputs equals the hash recorded on
//! the previous run. Hashes persist across invocations in a plain-text file
//! at `.assetpipe/hashes` under the project root, one `<task> <hash>` per
//! line.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Relative path (from the project root) to the hashes file.
pub const HASH_FILE_PATH: &str = ".assetpipe/hashes";

/// Compute the hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compute a deterministic aggregate hash over the contents of the given
/// files. Order of `paths` does not matter; they are sorted before hashing.
pub fn compute_hash_for_paths<I, P>(paths: I) -> Result<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut paths_vec: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .collect();
    paths_vec.sort();

    let mut hasher = Hasher::new();
    for path in paths_vec {
        if path.is_file() {
            let file_hash = compute_file_hash(&path)?;
            hasher.update(file_hash.as_bytes());
        }
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, "computed aggregate input hash");
    Ok(hash)
}

/// Per-task hash storage backed by `<root>/.assetpipe/hashes`.
#[derive(Debug)]
pub struct HashCache {
    root: PathBuf,
}

impl HashCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_path(&self) -> PathBuf {
        self.root.join(HASH_FILE_PATH)
    }

    /// Stored hash for a task, if any.
    pub fn load(&self, task: &str) -> Result<Option<String>> {
        let map = self.load_all()?;
        Ok(map.get(task).cloned())
    }

    /// Record the hash for a task.
    pub fn save(&self, task: &str, hash: &str) -> Result<()> {
        let mut map = self.load_all()?;
        map.insert(task.to_string(), hash.to_string());
        self.save_all(&map)?;
        debug!(task = %task, hash = %hash, "stored task input hash");
        Ok(())
    }

    fn load_all(&self) -> Result<HashMap<String, String>> {
        let path = self.file_path();

        if !path.exists() {
            return Ok(HashMap::new());
        }

        let file = File::open(&path).with_context(|| format!("opening hash file at {:?}", path))?;
        let reader = BufReader::new(file);

        let mut map = HashMap::new();
        for line_res in reader.lines() {
            let line = line_res?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some((name, hash)) = trimmed.split_once(char::is_whitespace) {
                map.insert(name.to_string(), hash.trim().to_string());
            }
        }

        Ok(map)
    }

    fn save_all(&self, map: &HashMap<String, String>) -> Result<()> {
        let path = self.file_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating hash directory at {:?}", parent))?;
        }

        let file =
            File::create(&path).with_context(|| format!("creating hash file at {:?}", path))?;
        let mut writer = BufWriter::new(file);

        // Sorted output keeps the file diff-friendly.
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort();
        for (name, hash) in entries {
            writeln!(writer, "{} {}", name, hash)?;
        }

        writer.flush()?;
        Ok(())
    }
}
