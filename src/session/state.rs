//! Session phase, timers and the read-only status snapshot.

use serde::Serialize;

use super::SessionConfig;
use crate::load::LoadHandle;
use crate::scene::NodeId;

/// Slack allowed when deciding a countdown has run out, absorbing the error
/// of summing many frame deltas.
const TIMER_SLACK_SECS: f32 = 1e-6;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SessionPhase {
    /// No session is active.
    #[default]
    Idle,
    /// Build pieces are being swapped for runtime pieces.
    Replacing,
    /// Waiting for physics to settle before the load is dropped.
    Settling,
    /// The load is in place and structural integrity is watched.
    Monitoring,
    /// The session finished and an outcome was produced.
    Evaluated,
}

impl SessionPhase {
    /// Whether the phase blocks a new session from starting.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Replacing | Self::Settling | Self::Monitoring)
    }
}

/// State of the single session owned by a
/// [`TestOrchestrator`](super::TestOrchestrator).
///
/// Created on a successful start and dropped on manual stop. Timers are plain
/// fields advanced by `tick`, so the whole machine can be inspected and driven
/// with synthetic frame deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    phase: SessionPhase,
    root: NodeId,
    load_kind: String,
    snapshot: Vec<NodeId>,
    settle_delay_secs: f32,
    monitor_window_secs: f32,
    settle_remaining_secs: f32,
    elapsed_secs: f32,
    current_load: Option<LoadHandle>,
}

impl SessionState {
    pub(crate) fn new(
        root: NodeId,
        load_kind: &str,
        snapshot: Vec<NodeId>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            phase: SessionPhase::Replacing,
            root,
            load_kind: load_kind.to_owned(),
            snapshot,
            settle_delay_secs: config.settle_delay_secs,
            monitor_window_secs: config.monitor_window_secs,
            settle_remaining_secs: config.settle_delay_secs,
            elapsed_secs: 0.0,
            current_load: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Structure root captured at start; retargeting the orchestrator does
    /// not move a session that is already under way.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Load kind requested for this session.
    #[must_use]
    pub fn load_kind(&self) -> &str {
        &self.load_kind
    }

    /// Structure children captured when the session started, in order.
    #[must_use]
    pub fn snapshot(&self) -> &[NodeId] {
        &self.snapshot
    }

    /// Number of pieces under the root when the session started.
    #[must_use]
    pub fn initial_piece_count(&self) -> usize {
        self.snapshot.len()
    }

    /// Configured settle delay.
    #[must_use]
    pub const fn settle_delay_secs(&self) -> f32 {
        self.settle_delay_secs
    }

    /// Configured monitoring window.
    #[must_use]
    pub const fn monitor_window_secs(&self) -> f32 {
        self.monitor_window_secs
    }

    /// Settle time still to run; zero once monitoring has begun.
    #[must_use]
    pub const fn settle_remaining_secs(&self) -> f32 {
        self.settle_remaining_secs
    }

    /// Seconds spent monitoring so far.
    #[must_use]
    pub const fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    /// Load dropped for this session, if the injector produced one.
    #[must_use]
    pub const fn current_load(&self) -> Option<&LoadHandle> {
        self.current_load.as_ref()
    }

    pub(crate) fn begin_settling(&mut self) {
        self.phase = SessionPhase::Settling;
        self.settle_remaining_secs = self.settle_delay_secs;
    }

    /// Runs the settle countdown; `true` once it has expired.
    pub(crate) fn advance_settle(&mut self, delta_secs: f32) -> bool {
        self.settle_remaining_secs = (self.settle_remaining_secs - delta_secs).max(0.0);
        self.settle_remaining_secs <= TIMER_SLACK_SECS
    }

    pub(crate) fn begin_monitoring(&mut self, load: Option<LoadHandle>) {
        self.phase = SessionPhase::Monitoring;
        self.settle_remaining_secs = 0.0;
        self.elapsed_secs = 0.0;
        self.current_load = load;
    }

    pub(crate) fn advance_monitor(&mut self, delta_secs: f32) {
        self.elapsed_secs += delta_secs;
    }

    /// Whether monitoring has run strictly past the window.
    pub(crate) fn window_expired(&self) -> bool {
        self.elapsed_secs > self.monitor_window_secs
    }

    pub(crate) fn finish(&mut self) {
        self.phase = SessionPhase::Evaluated;
    }
}

/// Read-only summary suitable for debug panels and HUDs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SessionStatus {
    /// Whether a session is replacing, settling or monitoring.
    pub is_running: bool,
    /// Current phase.
    pub phase: SessionPhase,
    /// Seconds spent monitoring; zero unless a test is running.
    pub elapsed_secs: f32,
    /// Pieces currently under the structure root.
    pub remaining_piece_count: usize,
    /// Pieces under the root when the current session started.
    pub initial_piece_count: usize,
}
