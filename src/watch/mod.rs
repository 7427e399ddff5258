// src/watch/mod.rs

//! File watching and watch-session orchestration.
//!
//! - [`patterns`]: compiled per-task watch bindings.
//! - [`watcher`]: cross-platform filesystem watcher (`notify`) bridged into
//!   the async session channel.
//! - [`coalesce`]: the pure per-binding scheduling state machine (at most one
//!   run in flight plus one queued re-run per binding).
//! - [`session`]: the async event loop driving bindings and reload
//!   notifications.

pub mod coalesce;
pub mod patterns;
pub mod session;
pub mod watcher;

use std::path::PathBuf;

/// Result of one watch-triggered pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed(String),
}

/// Events flowing into the watch session loop.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Filesystem paths reported changed by the watcher.
    FsPaths(Vec<PathBuf>),
    /// A dispatched run for the given binding finished.
    RunFinished { binding: usize, outcome: RunOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    Shutdown,
}

pub use coalesce::{BindingState, Coalescer, Directive};
pub use patterns::{build_bindings, WatchBinding};
pub use session::{RunDispatcher, SpawnDispatcher, WatchSession};
pub use watcher::{spawn_watcher, WatcherHandle};
