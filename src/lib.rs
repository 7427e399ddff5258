// src/lib.rs

pub mod archive;
pub mod changes;
pub mod clean;
pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod globs;
pub mod logging;
pub mod pipeline;
pub mod publish;
pub mod reload;
pub mod transform;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, Step};
use crate::context::PipelineContext;
use crate::errors::{PipelineError, Result};
use crate::pipeline::{run_node, PipelineSet};
use crate::watch::{build_bindings, spawn_watcher, SessionEvent, SpawnDispatcher, WatchSession};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - task / pipeline construction
/// - built-in targets (clean, zip, publish, watch)
/// - the watch session with Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = config::load_and_validate(&config_path)?;

    let root = config_root_dir(&config_path);
    let ctx = Arc::new(PipelineContext::new(root, &cfg.project.dist));

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    match args.target.as_str() {
        "clean" => clean::clean(ctx.dist(), &cfg.clean),
        "zip" => archive::archive(ctx.dist(), &ctx.resolve(&cfg.archive.name)),
        "publish" => {
            let section = cfg.publish.as_ref().ok_or_else(|| {
                PipelineError::Config("publishing requires a [publish] section".to_string())
            })?;
            publish::publish(ctx.root(), section).await
        }
        "watch" => run_watch(&cfg, ctx).await,
        target => {
            let set = PipelineSet::from_config(&cfg, &ctx)?;
            run_target(&cfg, &set, ctx, target).await
        }
    }
}

/// Run a configured task or pipeline by name.
async fn run_target(
    cfg: &ConfigFile,
    set: &PipelineSet,
    ctx: Arc<PipelineContext>,
    target: &str,
) -> Result<()> {
    if !set.has_target(target) {
        return Err(PipelineError::Config(format!(
            "unknown target '{target}'; define [task.{target}] or [pipeline.{target}]"
        )));
    }

    if let Some(pipeline) = set.pipeline(target) {
        if pipeline.clean_first {
            clean::clean(ctx.dist(), &cfg.clean)?;
        }
    }

    let node = set.node_for(target)?;
    run_node(node, ctx).await
}

/// Run the build pipeline, then watch source globs until shutdown.
async fn run_watch(cfg: &ConfigFile, ctx: Arc<PipelineContext>) -> Result<()> {
    let set = PipelineSet::from_config(cfg, &ctx)?;

    // Initial full build so watching starts from a consistent output tree.
    if set.has_target("build") {
        run_target(cfg, &set, Arc::clone(&ctx), "build").await?;
    } else {
        warn!("no 'build' target configured; watching without an initial build");
    }

    let bindings = build_bindings(cfg, &set)?;
    if bindings.is_empty() {
        return Err(PipelineError::Config(
            "nothing to watch; no tasks configured".to_string(),
        ));
    }

    let (session_tx, session_rx) = mpsc::channel::<SessionEvent>(64);

    // Keep the OS watcher alive for the duration of the session.
    let _watcher_handle = spawn_watcher(ctx.root(), session_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = session_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(SessionEvent::Shutdown).await;
        });
    }

    let session = WatchSession::new(bindings, ctx, session_rx, session_tx, SpawnDispatcher);
    session.run().await
}

/// Figure out the project root from the config path.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetpipe.toml"),
///   we use that directory.
/// - If it's just a bare filename (parent = ""), we fall back to the current
///   working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print tasks, pipelines and built-in settings.
fn print_dry_run(cfg: &ConfigFile) {
    println!("assetpipe dry-run");
    println!("  project.dist = {}", cfg.project.dist);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      src: {:?}", task.src);
        println!("      dest: {}", task.dest);
        if let Some(ref watch) = task.watch {
            println!("      watch: {:?}", watch);
        }
        if let Some(ref out) = task.out {
            println!("      out: {out}");
        }
        if let Some(ref ext) = task.out_ext {
            println!("      out_ext: {ext}");
        }
        match &task.run {
            Some(cmd) => println!("      run: {cmd}"),
            None => println!("      run: (copy)"),
        }
        println!(
            "      incremental: {} ({:?})",
            task.incremental, task.freshness
        );
    }

    println!();
    println!("pipelines ({}):", cfg.pipeline.len());
    for (name, pipeline) in cfg.pipeline.iter() {
        let steps: Vec<String> = pipeline
            .steps
            .iter()
            .map(|s| match s {
                Step::Single(n) => n.clone(),
                Step::Group(names) => format!("[{}]", names.join(", ")),
            })
            .collect();
        println!("  - {name}: {}", steps.join(" -> "));
        if pipeline.clean_first {
            println!("      clean_first: true");
        }
    }

    if !cfg.clean.keep.is_empty() {
        println!();
        println!("clean.keep = {:?}", cfg.clean.keep);
    }
    if let Some(ref publish) = cfg.publish {
        println!();
        println!(
            "publish: {} {} {:?}",
            publish.remote, publish.branch, publish.paths
        );
    }

    info!("dry-run complete (no execution)");
}
