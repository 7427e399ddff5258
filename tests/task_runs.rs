// tests/task_runs.rs

//! Task execution: input expansion, incremental skipping, idempotence.

mod common;
use crate::common::init_tracing;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use assetpipe::changes::OutputMap;
use assetpipe::config::FreshnessPolicy;
use assetpipe::context::PipelineContext;
use assetpipe::errors::PipelineError;
use assetpipe::pipeline::Task;
use assetpipe::transform::CopyTransform;

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn copy_task(name: &str, src: &str, dest: &Path, incremental: bool) -> Task {
    Task::new(
        name,
        vec![src.to_string()],
        dest.to_path_buf(),
        OutputMap::PerFile { ext: None },
        incremental,
        FreshnessPolicy::Mtime,
        false,
        Arc::new(CopyTransform),
    )
    .unwrap()
}

#[tokio::test]
async fn second_run_on_unchanged_inputs_is_a_skip() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("src/styles/a.css"), "body {}");

    let ctx = PipelineContext::new(dir.path(), "dist");
    let task = copy_task(
        "styles",
        "src/styles/**/*.css",
        &dir.path().join("dist/css"),
        true,
    );

    let first = task.run(&ctx).await.unwrap();
    assert!(!first.skipped);
    assert_eq!(first.processed, 1);
    assert!(dir.path().join("dist/css/a.css").is_file());

    let second = task.run(&ctx).await.unwrap();
    assert!(second.skipped, "unchanged inputs must be a no-op");
    assert_eq!(second.processed, 0);
}

#[tokio::test]
async fn modified_input_is_reprocessed() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("src/styles/a.css");
    write(&input, "body {}");

    let ctx = PipelineContext::new(dir.path(), "dist");
    let task = copy_task(
        "styles",
        "src/styles/**/*.css",
        &dir.path().join("dist/css"),
        true,
    );

    task.run(&ctx).await.unwrap();

    // Push the input mtime past the output's.
    let newer = std::time::SystemTime::now() + std::time::Duration::from_secs(5);
    fs::File::options()
        .write(true)
        .open(&input)
        .unwrap()
        .set_modified(newer)
        .unwrap();

    let rerun = task.run(&ctx).await.unwrap();
    assert!(!rerun.skipped);
    assert_eq!(rerun.processed, 1);
}

#[tokio::test]
async fn non_incremental_task_always_reprocesses() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("src/styles/a.css"), "body {}");

    let ctx = PipelineContext::new(dir.path(), "dist");
    let task = copy_task(
        "styles",
        "src/styles/**/*.css",
        &dir.path().join("dist/css"),
        false,
    );

    assert!(!task.run(&ctx).await.unwrap().skipped);
    assert!(!task.run(&ctx).await.unwrap().skipped);
}

#[tokio::test]
async fn zero_matches_is_an_input_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let ctx = PipelineContext::new(dir.path(), "dist");
    let task = copy_task(
        "styles",
        "src/styles/**/*.css",
        &dir.path().join("dist/css"),
        true,
    );

    let err = task.run(&ctx).await.unwrap_err();
    assert!(matches!(err, PipelineError::Input { .. }), "got: {err}");
}

#[tokio::test]
async fn allow_empty_makes_zero_matches_a_skip() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let ctx = PipelineContext::new(dir.path(), "dist");
    let task = Task::new(
        "images",
        vec!["src/img/**".to_string()],
        dir.path().join("dist/img"),
        OutputMap::PerFile { ext: None },
        true,
        FreshnessPolicy::Mtime,
        true,
        Arc::new(CopyTransform),
    )
    .unwrap();

    let report = task.run(&ctx).await.unwrap();
    assert!(report.skipped);
}

#[tokio::test]
async fn bundle_task_concatenates_in_src_order() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("src/scripts/a.js"), "let a;\n");
    write(&dir.path().join("src/scripts/b.js"), "let b;\n");

    let ctx = PipelineContext::new(dir.path(), "dist");
    let task = Task::new(
        "scripts",
        vec!["src/scripts/**/*.js".to_string()],
        dir.path().join("dist/js"),
        OutputMap::Single {
            name: "main.js".to_string(),
        },
        true,
        FreshnessPolicy::Mtime,
        false,
        Arc::new(CopyTransform),
    )
    .unwrap();

    task.run(&ctx).await.unwrap();

    let bundle = fs::read_to_string(dir.path().join("dist/js/main.js")).unwrap();
    assert_eq!(bundle, "let a;\nlet b;\n");

    // Unchanged inputs: the bundle is up to date.
    assert!(task.run(&ctx).await.unwrap().skipped);
}

#[tokio::test]
async fn hash_freshness_skips_until_content_changes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("src/fonts/font.ttf");
    write(&input, "glyphs-v1");

    let ctx = PipelineContext::new(dir.path(), "dist");
    let task = Task::new(
        "fonts",
        vec!["src/fonts/*.ttf".to_string()],
        dir.path().join("dist/fonts"),
        OutputMap::PerFile { ext: None },
        true,
        FreshnessPolicy::Hash,
        false,
        Arc::new(CopyTransform),
    )
    .unwrap();

    assert!(!task.run(&ctx).await.unwrap().skipped);
    // Same content, touched mtime: the hash policy still skips.
    let newer = std::time::SystemTime::now() + std::time::Duration::from_secs(5);
    fs::File::options()
        .write(true)
        .open(&input)
        .unwrap()
        .set_modified(newer)
        .unwrap();
    assert!(task.run(&ctx).await.unwrap().skipped);

    // Different content: processed again.
    write(&input, "glyphs-v2");
    assert!(!task.run(&ctx).await.unwrap().skipped);
}

#[tokio::test]
async fn nested_inputs_keep_their_directory_structure() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("src/img/icons/logo.png"), "icon");
    write(&dir.path().join("src/img/photos/logo.png"), "photo");

    let ctx = PipelineContext::new(dir.path(), "dist");
    let task = copy_task("images", "src/img/**", &dir.path().join("dist/img"), true);

    let report = task.run(&ctx).await.unwrap();
    assert_eq!(report.processed, 2);

    let icons = dir.path().join("dist/img/icons/logo.png");
    let photos = dir.path().join("dist/img/photos/logo.png");
    assert!(icons.is_file(), "nested input must map to a nested output");
    assert!(photos.is_file(), "same-named inputs must not overwrite each other");
    assert_eq!(fs::read_to_string(icons).unwrap(), "icon");
    assert_eq!(fs::read_to_string(photos).unwrap(), "photo");
}
