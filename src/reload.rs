// src/reload.rs

//! Live-reload notification side channel.
//!
//! Task completion is decoupled from "tell the browser to reload": the watch
//! session publishes [`ReloadEvent`]s on a broadcast channel and any number
//! of subscribers (a live-reload server, tests) consume them. Publishing with
//! no subscribers is fine; events are simply dropped.

use tokio::sync::broadcast;
use tracing::debug;

/// Notification published after a watch-triggered run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// The named task's pipeline completed; clients should reload.
    Changed { task: String },
    /// The named task's pipeline failed; clients may show an error overlay.
    BuildFailed { task: String, message: String },
}

/// Broadcast hub for reload notifications.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadEvent>,
}

impl ReloadHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to reload notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn notify(&self, event: ReloadEvent) {
        match self.tx.send(event) {
            Ok(receivers) => debug!(receivers, "reload event delivered"),
            Err(_) => debug!("reload event dropped; no subscribers"),
        }
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new(16)
    }
}
