// tests/pipeline_composition.rs

//! Series / parallel composition semantics.

mod common;
use crate::common::{init_tracing, FailTransform, RecordingTransform};

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use assetpipe::changes::OutputMap;
use assetpipe::config::{ConfigFile, FreshnessPolicy};
use assetpipe::context::PipelineContext;
use assetpipe::pipeline::{parallel, run_node, series, PipelineNode, PipelineSet, Task};
use assetpipe::transform::{CopyTransform, Transform};

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn task_with(name: &str, src: &str, dest: &Path, transform: Arc<dyn Transform>) -> PipelineNode {
    let task = Task::new(
        name,
        vec![src.to_string()],
        dest.to_path_buf(),
        OutputMap::PerFile { ext: None },
        false,
        FreshnessPolicy::Mtime,
        false,
        transform,
    )
    .unwrap();
    PipelineNode::leaf(Arc::new(task))
}

#[tokio::test]
async fn series_runs_in_listed_order() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("src/a.txt"), "a");
    write(&dir.path().join("src/b.txt"), "b");
    write(&dir.path().join("src/c.txt"), "c");

    let ctx = Arc::new(PipelineContext::new(dir.path(), "dist"));
    let log = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::new(RecordingTransform::new(Arc::clone(&log)));

    let node = series(vec![
        task_with("first", "src/a.txt", &dir.path().join("dist"), recorder.clone()),
        task_with("second", "src/b.txt", &dir.path().join("dist"), recorder.clone()),
        task_with("third", "src/c.txt", &dir.path().join("dist"), recorder.clone()),
    ]);

    run_node(node, ctx).await.unwrap();

    let order = log.lock().unwrap().clone();
    assert_eq!(order, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn series_fails_fast_and_surfaces_the_failure() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("src/a.txt"), "a");
    write(&dir.path().join("src/b.txt"), "b");

    let ctx = Arc::new(PipelineContext::new(dir.path(), "dist"));
    let log = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::new(RecordingTransform::new(Arc::clone(&log)));

    let node = series(vec![
        task_with("broken", "src/a.txt", &dir.path().join("dist"), Arc::new(FailTransform)),
        task_with("after", "src/b.txt", &dir.path().join("dist"), recorder),
    ]);

    let err = run_node(node, ctx).await.unwrap_err();
    assert_eq!(err.task_name(), Some("broken"));
    assert!(
        log.lock().unwrap().is_empty(),
        "later series children must never start after a failure"
    );
}

#[tokio::test]
async fn parallel_failure_does_not_cancel_siblings() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("src/a.txt"), "a");
    write(&dir.path().join("src/b.txt"), "b");

    let ctx = Arc::new(PipelineContext::new(dir.path(), "dist"));

    let node = parallel(vec![
        task_with("broken", "src/a.txt", &dir.path().join("dist"), Arc::new(FailTransform)),
        task_with("copies", "src/b.txt", &dir.path().join("dist"), Arc::new(CopyTransform)),
    ]);

    let err = run_node(node, ctx).await.unwrap_err();
    assert_eq!(err.task_name(), Some("broken"));
    assert!(
        dir.path().join("dist/b.txt").is_file(),
        "sibling output must still be written"
    );
}

#[tokio::test]
async fn nested_composition_preserves_series_ordering() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    for name in ["a", "b", "c", "d"] {
        write(&dir.path().join(format!("src/{name}.txt")), name);
    }

    let ctx = Arc::new(PipelineContext::new(dir.path(), "dist"));
    let log = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::new(RecordingTransform::new(Arc::clone(&log)));

    // before -> [mid1 || mid2] -> after
    let node = series(vec![
        task_with("before", "src/a.txt", &dir.path().join("dist"), recorder.clone()),
        parallel(vec![
            task_with("mid1", "src/b.txt", &dir.path().join("dist"), recorder.clone()),
            task_with("mid2", "src/c.txt", &dir.path().join("dist"), recorder.clone()),
        ]),
        task_with("after", "src/d.txt", &dir.path().join("dist"), recorder.clone()),
    ]);

    run_node(node, ctx).await.unwrap();

    let order = log.lock().unwrap().clone();
    assert_eq!(order.len(), 4);
    assert_eq!(order.first().map(String::as_str), Some("before"));
    assert_eq!(order.last().map(String::as_str), Some("after"));
    assert!(order[1..3].contains(&"mid1".to_string()));
    assert!(order[1..3].contains(&"mid2".to_string()));
}

#[tokio::test]
async fn pipeline_set_builds_and_runs_from_config() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("src/a.html"), "<html>");
    write(&dir.path().join("src/styles/a.css"), "body {}");

    let cfg: ConfigFile = toml::from_str(
        r#"
[task.html]
src = ["src/*.html"]
dest = "dist"

[task.styles]
src = ["src/styles/**/*.css"]
dest = "dist/css"

[pipeline.build]
steps = ["html", ["styles"]]
"#,
    )
    .unwrap();

    let ctx = Arc::new(PipelineContext::new(dir.path(), "dist"));
    let set = PipelineSet::from_config(&cfg, &ctx).unwrap();
    assert!(set.has_target("build"));

    let node = set.node_for("build").unwrap();
    run_node(node, ctx).await.unwrap();

    assert!(dir.path().join("dist/a.html").is_file());
    assert!(dir.path().join("dist/css/a.css").is_file());
}
