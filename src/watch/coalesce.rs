// src/watch/coalesce.rs

//! Pure per-binding scheduling state machine.
//!
//! Rapid file saves must not race each other into inconsistent output state:
//! per binding there is at most one run in flight plus at most one queued
//! re-run, and any further change events coalesce into that queued re-run.
//!
//! This module is synchronous and deterministic; the async shell lives in
//! [`super::session`]. It can be tested without Tokio, channels, or a real
//! filesystem.

use tracing::debug;

use crate::watch::RunOutcome;

/// Scheduling state of a single watch binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Idle,
    Running,
    /// A run is in flight and one re-run is queued behind it.
    RunningQueued,
}

/// Instruction for the session shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Dispatch a run for this binding.
    Start(usize),
    /// Notify live-reload clients that this binding's task updated outputs.
    Reload(usize),
    /// Report a failed run (console + build-error overlay); the session
    /// itself keeps going.
    ReportFailure { binding: usize, message: String },
    /// All bindings idle after a shutdown request; the loop may exit.
    Exit,
}

/// Tracks all binding states plus the shutdown flag.
#[derive(Debug)]
pub struct Coalescer {
    states: Vec<BindingState>,
    shutting_down: bool,
}

impl Coalescer {
    pub fn new(bindings: usize) -> Self {
        Self {
            states: vec![BindingState::Idle; bindings],
            shutting_down: false,
        }
    }

    pub fn state(&self, binding: usize) -> BindingState {
        self.states[binding]
    }

    fn all_idle(&self) -> bool {
        self.states.iter().all(|s| *s == BindingState::Idle)
    }

    /// A filesystem change matched this binding.
    pub fn on_change(&mut self, binding: usize) -> Vec<Directive> {
        if self.shutting_down {
            debug!(binding, "ignoring change event during shutdown");
            return Vec::new();
        }

        match self.states[binding] {
            BindingState::Idle => {
                self.states[binding] = BindingState::Running;
                vec![Directive::Start(binding)]
            }
            BindingState::Running => {
                debug!(binding, "run in flight; queueing one re-run");
                self.states[binding] = BindingState::RunningQueued;
                Vec::new()
            }
            BindingState::RunningQueued => {
                debug!(binding, "re-run already queued; coalescing");
                Vec::new()
            }
        }
    }

    /// A dispatched run for this binding finished.
    pub fn on_finished(&mut self, binding: usize, outcome: &RunOutcome) -> Vec<Directive> {
        let mut directives = Vec::new();

        match outcome {
            RunOutcome::Success => directives.push(Directive::Reload(binding)),
            RunOutcome::Failed(message) => directives.push(Directive::ReportFailure {
                binding,
                message: message.clone(),
            }),
        }

        let had_queued = self.states[binding] == BindingState::RunningQueued;
        if had_queued && !self.shutting_down {
            self.states[binding] = BindingState::Running;
            directives.push(Directive::Start(binding));
        } else {
            self.states[binding] = BindingState::Idle;
        }

        if self.shutting_down && self.all_idle() {
            directives.push(Directive::Exit);
        }

        directives
    }

    /// Shutdown requested: stop accepting changes, let in-flight runs finish.
    pub fn on_shutdown(&mut self) -> Vec<Directive> {
        self.shutting_down = true;
        if self.all_idle() {
            vec![Directive::Exit]
        } else {
            debug!("shutdown requested; waiting for in-flight runs");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(directives: &[Directive]) -> usize {
        directives
            .iter()
            .filter(|d| matches!(d, Directive::Start(_)))
            .count()
    }

    #[test]
    fn idle_change_starts_a_run() {
        let mut core = Coalescer::new(1);
        let directives = core.on_change(0);
        assert_eq!(directives, vec![Directive::Start(0)]);
        assert_eq!(core.state(0), BindingState::Running);
    }

    #[test]
    fn three_rapid_events_yield_exactly_two_runs() {
        let mut core = Coalescer::new(1);
        let mut total_starts = 0;

        total_starts += starts(&core.on_change(0));
        // Two more events while the first run is in flight.
        total_starts += starts(&core.on_change(0));
        total_starts += starts(&core.on_change(0));
        assert_eq!(core.state(0), BindingState::RunningQueued);

        // First run completes; the queued re-run starts.
        total_starts += starts(&core.on_finished(0, &RunOutcome::Success));
        assert_eq!(core.state(0), BindingState::Running);

        // Second run completes with nothing queued behind it.
        total_starts += starts(&core.on_finished(0, &RunOutcome::Success));
        assert_eq!(core.state(0), BindingState::Idle);

        assert_eq!(total_starts, 2);
    }

    #[test]
    fn failure_reports_but_still_starts_queued_rerun() {
        let mut core = Coalescer::new(1);
        core.on_change(0);
        core.on_change(0);

        let directives = core.on_finished(0, &RunOutcome::Failed("boom".into()));
        assert!(matches!(
            directives[0],
            Directive::ReportFailure { binding: 0, .. }
        ));
        assert_eq!(directives[1], Directive::Start(0));
    }

    #[test]
    fn bindings_are_independent() {
        let mut core = Coalescer::new(2);
        assert_eq!(core.on_change(0), vec![Directive::Start(0)]);
        assert_eq!(core.on_change(1), vec![Directive::Start(1)]);
        assert_eq!(core.state(0), BindingState::Running);
        assert_eq!(core.state(1), BindingState::Running);
    }

    #[test]
    fn shutdown_with_idle_bindings_exits_immediately() {
        let mut core = Coalescer::new(2);
        assert_eq!(core.on_shutdown(), vec![Directive::Exit]);
    }

    #[test]
    fn shutdown_waits_for_in_flight_run_and_drops_queued() {
        let mut core = Coalescer::new(1);
        core.on_change(0);
        core.on_change(0); // queued

        assert!(core.on_shutdown().is_empty());
        // Changes after shutdown are ignored.
        assert!(core.on_change(0).is_empty());

        let directives = core.on_finished(0, &RunOutcome::Success);
        // Reload still fires for the completed run, then exit; the queued
        // re-run is dropped.
        assert_eq!(directives[0], Directive::Reload(0));
        assert_eq!(*directives.last().unwrap(), Directive::Exit);
        assert_eq!(starts(&directives), 0);
    }
}
