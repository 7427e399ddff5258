// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from an `Assetpipe.toml` file.
///
/// ```toml
/// [project]
/// dist = "dist"
///
/// [task.styles]
/// src = ["src/styles/style.scss"]
/// watch = ["src/styles/**/*.scss"]
/// dest = "dist/css"
/// out = "style.min.css"
/// run = "sass {in} {out}"
///
/// [pipeline.build]
/// steps = ["html", ["styles", "scripts", "images"], "fonts"]
/// clean_first = true
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Project-wide paths from `[project]`.
    #[serde(default)]
    pub project: ProjectSection,

    /// All tasks from `[task.<name>]`. Keys are the task names.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Composed pipelines from `[pipeline.<name>]`.
    #[serde(default)]
    pub pipeline: BTreeMap<String, PipelineConfig>,

    /// `[clean]` behaviour for the built-in clean target.
    #[serde(default)]
    pub clean: CleanSection,

    /// `[archive]` settings for the built-in zip target.
    #[serde(default)]
    pub archive: ArchiveSection,

    /// `[publish]` settings; publishing is disabled when the section is absent.
    #[serde(default)]
    pub publish: Option<PublishSection>,
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Output directory, relative to the project root.
    #[serde(default = "default_dist")]
    pub dist: String,
}

fn default_dist() -> String {
    "dist".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            dist: default_dist(),
        }
    }
}

/// Staleness policy used by incremental tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessPolicy {
    /// Compare input mtimes against mapped output mtimes.
    #[default]
    Mtime,
    /// Compare an aggregate blake3 hash of the inputs against the stored hash
    /// from the previous run (`.assetpipe/hashes`).
    Hash,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Input glob patterns, relative to the project root.
    pub src: Vec<String>,

    /// Optional distinct globs used for change-triggering in watch mode.
    ///
    /// If `None`, the `src` patterns are watched.
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    /// Output directory, relative to the project root.
    pub dest: String,

    /// Single-output name for bundle tasks (e.g. `main.min.js`).
    ///
    /// Mutually exclusive with `out_ext`.
    #[serde(default)]
    pub out: Option<String>,

    /// Per-file output extension rewrite (e.g. `webp`, `woff2`).
    #[serde(default)]
    pub out_ext: Option<String>,

    /// Command template invoking the external transform tool.
    ///
    /// Placeholders: `{in}` (input file, or all inputs for bundle tasks),
    /// `{out}` (mapped output path), `{dest}` (output directory).
    /// If absent, inputs are copied to the output directory unchanged.
    #[serde(default)]
    pub run: Option<String>,

    /// Whether to consult the change detector and skip up-to-date inputs.
    #[serde(default = "default_incremental")]
    pub incremental: bool,

    /// Staleness policy for incremental runs.
    #[serde(default)]
    pub freshness: FreshnessPolicy,

    /// If false (the default), zero matched inputs is an error.
    #[serde(default)]
    pub allow_empty: bool,
}

fn default_incremental() -> bool {
    true
}

impl TaskConfig {
    /// Globs to watch for this task: `watch` if set, else `src`.
    pub fn watch_patterns(&self) -> &[String] {
        match &self.watch {
            Some(patterns) => patterns,
            None => &self.src,
        }
    }
}

/// `[pipeline.<name>]` section.
///
/// `steps` is a series; a nested array is a parallel group within the series:
///
/// ```toml
/// steps = ["html", ["styles", "scripts"], "fonts"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub steps: Vec<Step>,

    /// Run the built-in clean before the first step.
    #[serde(default)]
    pub clean_first: bool,
}

/// One step of a pipeline: a single task/pipeline name, or a parallel group
/// of names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Single(String),
    Group(Vec<String>),
}

impl Step {
    /// All names referenced by this step.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Step::Single(name) => vec![name.as_str()],
            Step::Group(names) => names.iter().map(|s| s.as_str()).collect(),
        }
    }
}

/// `[clean]` section for the built-in clean target.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CleanSection {
    /// Top-level entries under dist to keep (e.g. `["img", "fonts"]`).
    #[serde(default)]
    pub keep: Vec<String>,
}

/// `[archive]` section for the built-in zip target.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveSection {
    /// Archive file name, written to the project root.
    #[serde(default = "default_archive_name")]
    pub name: String,
}

fn default_archive_name() -> String {
    "archive.zip".to_string()
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            name: default_archive_name(),
        }
    }
}

/// `[publish]` section for the built-in publish target.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishSection {
    /// Remote to push to.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branch to push to.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Paths to stage. Uncommitted changes outside this set abort the publish.
    pub paths: Vec<String>,

    /// Commit message.
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_message() -> String {
    "site update".to_string()
}
