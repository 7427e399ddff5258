// src/watch/session.rs

//! Async shell around the pure coalescing core.
//!
//! The session loop consumes [`SessionEvent`]s, feeds them into the
//! [`Coalescer`], and executes the resulting directives: dispatching runs,
//! publishing reload notifications, and eventually exiting after a shutdown
//! request once every binding is idle. Individual run failures never
//! terminate the session.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::context::PipelineContext;
use crate::errors::Result;
use crate::globs::relative_key;
use crate::pipeline::{run_node, PipelineNode};
use crate::reload::ReloadEvent;
use crate::watch::coalesce::{Coalescer, Directive};
use crate::watch::patterns::WatchBinding;
use crate::watch::{RunOutcome, SessionEvent};

/// How the session dispatches a pipeline run for a binding.
///
/// Production uses [`SpawnDispatcher`]; tests can record dispatches and
/// complete them synthetically.
pub trait RunDispatcher: Send {
    fn dispatch(
        &mut self,
        binding: usize,
        node: PipelineNode,
        ctx: Arc<PipelineContext>,
        done_tx: mpsc::Sender<SessionEvent>,
    );
}

/// Dispatcher that runs the node on a spawned tokio task and reports the
/// outcome back into the session channel.
#[derive(Debug, Default)]
pub struct SpawnDispatcher;

impl RunDispatcher for SpawnDispatcher {
    fn dispatch(
        &mut self,
        binding: usize,
        node: PipelineNode,
        ctx: Arc<PipelineContext>,
        done_tx: mpsc::Sender<SessionEvent>,
    ) {
        tokio::spawn(async move {
            let outcome = match run_node(node, ctx).await {
                Ok(()) => RunOutcome::Success,
                Err(err) => RunOutcome::Failed(err.to_string()),
            };
            let _ = done_tx
                .send(SessionEvent::RunFinished { binding, outcome })
                .await;
        });
    }
}

/// A live watch session: bindings, their scheduling state, and the event
/// loop.
pub struct WatchSession<D: RunDispatcher> {
    bindings: Vec<WatchBinding>,
    core: Coalescer,
    ctx: Arc<PipelineContext>,
    event_rx: mpsc::Receiver<SessionEvent>,
    event_tx: mpsc::Sender<SessionEvent>,
    dispatcher: D,
}

impl<D: RunDispatcher> WatchSession<D> {
    pub fn new(
        bindings: Vec<WatchBinding>,
        ctx: Arc<PipelineContext>,
        event_rx: mpsc::Receiver<SessionEvent>,
        event_tx: mpsc::Sender<SessionEvent>,
        dispatcher: D,
    ) -> Self {
        let core = Coalescer::new(bindings.len());
        Self {
            bindings,
            core,
            ctx,
            event_rx,
            event_tx,
            dispatcher,
        }
    }

    /// Main event loop. Returns when the channel closes or a shutdown
    /// request has drained all in-flight runs.
    pub async fn run(mut self) -> Result<()> {
        info!(bindings = self.bindings.len(), "watch session started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("session event channel closed; exiting");
                    break;
                }
            };

            let directives = match event {
                SessionEvent::FsPaths(paths) => {
                    let mut directives = Vec::new();
                    for binding in self.matched_bindings(&paths) {
                        directives.extend(self.core.on_change(binding));
                    }
                    directives
                }
                SessionEvent::RunFinished { binding, outcome } => {
                    self.core.on_finished(binding, &outcome)
                }
                SessionEvent::Shutdown => {
                    info!("shutdown requested; waiting for in-flight runs");
                    self.core.on_shutdown()
                }
            };

            if !self.execute(directives) {
                break;
            }
        }

        info!("watch session exiting");
        Ok(())
    }

    /// Indices of bindings interested in any of the changed paths.
    fn matched_bindings(&self, paths: &[std::path::PathBuf]) -> BTreeSet<usize> {
        let root = self.ctx.root();
        let mut matched = BTreeSet::new();
        for path in paths {
            let Some(rel) = relative_or_canonical(root, path) else {
                continue;
            };
            for (idx, binding) in self.bindings.iter().enumerate() {
                if binding.matches(&rel) {
                    debug!(binding = %binding.name(), path = %rel, "change matched binding");
                    matched.insert(idx);
                }
            }
        }
        matched
    }

    /// Execute directives; returns false when the loop should stop.
    fn execute(&mut self, directives: Vec<Directive>) -> bool {
        for directive in directives {
            match directive {
                Directive::Start(binding) => {
                    let b = &self.bindings[binding];
                    debug!(binding = %b.name(), "dispatching run");
                    self.dispatcher.dispatch(
                        binding,
                        b.node().clone(),
                        Arc::clone(&self.ctx),
                        self.event_tx.clone(),
                    );
                }
                Directive::Reload(binding) => {
                    let task = self.bindings[binding].name().to_string();
                    info!(task = %task, "run finished; notifying reload clients");
                    self.ctx.reload().notify(ReloadEvent::Changed { task });
                }
                Directive::ReportFailure { binding, message } => {
                    let task = self.bindings[binding].name().to_string();
                    warn!(task = %task, error = %message, "watch-triggered run failed");
                    self.ctx
                        .reload()
                        .notify(ReloadEvent::BuildFailed { task, message });
                }
                Directive::Exit => {
                    return false;
                }
            }
        }
        true
    }
}

/// Relativize a notify path against the session root. The watcher
/// canonicalizes its root, so retry against the canonical form when the
/// plain strip fails.
fn relative_or_canonical(root: &Path, path: &Path) -> Option<String> {
    relative_key(root, path).or_else(|| {
        let canonical = root.canonicalize().ok()?;
        relative_key(&canonical, path)
    })
}
