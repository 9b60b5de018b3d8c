//! Reasons a session request is refused or a running session is aborted.

use thiserror::Error;

use crate::scene::NodeId;

/// Failure surfaced by the test orchestrator.
///
/// None of these leave the session half-applied: start requests are rejected
/// before any scene mutation, and tick-time faults force the session to idle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A start was requested while another session is replacing, settling or
    /// monitoring.
    #[error("a structure test is already running")]
    AlreadyRunning,
    /// No structure root is configured, or the configured node is gone.
    #[error("no structure root is configured")]
    MissingStructureRoot,
    /// No piece registry was supplied.
    #[error("no piece registry is configured")]
    MissingRegistry,
    /// No load injector was supplied.
    #[error("no load injector is configured")]
    MissingInjector,
    /// The structure root has no pieces to test.
    #[error("the structure has no pieces to test")]
    EmptyStructure,
    /// The structure root was destroyed while a session was in progress.
    #[error("structure root {0:?} disappeared mid-session")]
    StructureRootLost(NodeId),
}

impl SessionError {
    /// Whether the error stems from missing setup rather than session state.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingStructureRoot | Self::MissingRegistry | Self::MissingInjector
        )
    }
}
