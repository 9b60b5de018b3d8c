//! Test-session orchestration.
//!
//! [`TestOrchestrator`] owns at most one [`SessionState`] and drives it
//! through replacement, settling, monitoring and evaluation. Collaborators are
//! supplied once as typed trait objects; the scene is passed into every call
//! so the orchestrator never holds a long-lived borrow of it.

mod config;
mod error;
pub mod monitor;
pub mod outcome;
pub mod replace;
mod state;

pub use config::{ConfigError, SessionConfig};
pub use error::SessionError;
pub use monitor::{survey, IntegritySurvey};
pub use outcome::{evaluate, survival_rate, EvaluationContext, SurvivalTier, TestOutcome};
pub use replace::{replace_structure, Replacement, ReplacementReport};
pub use state::{SessionPhase, SessionState, SessionStatus};

use log::{debug, error, info, warn};

use crate::load::LoadInjector;
use crate::registry::PieceRegistry;
use crate::scene::{NodeId, SceneGraph};

/// Best-effort hook asking the failure tracker to pick up freshly spawned
/// runtime pieces.
pub trait FailureRescan: Send + Sync {
    /// Rescans the scene for pieces that can break.
    fn collect_targets_now(&mut self, scene: &SceneGraph);
}

/// Runs structure tests against a [`SceneGraph`].
///
/// # Examples
///
/// ```
/// use trestle::load::LoadDropper;
/// use trestle::registry::{Prefab, PrefabCatalog};
/// use trestle::scene::{Body, NodeTemplate, Pose, SceneGraph};
/// use trestle::session::{SessionConfig, SessionPhase, TestOrchestrator};
///
/// let mut catalog = PrefabCatalog::new();
/// let beam = catalog.register(Prefab::new(
///     "Beam",
///     NodeTemplate::new("Beam_Build"),
///     Some(NodeTemplate::new("Beam_Runtime").with_body(Body::dynamic(50.0))),
/// ))
/// .expect("catalogue has room");
///
/// let mut scene = SceneGraph::new();
/// let root = scene.spawn("Bridge", None);
/// let drop_point = scene.spawn("DropPoint", None);
/// catalog
///     .spawn_build(&mut scene, beam, Some(root), Pose::from_xyz(0.0, 1.0, 0.0))
///     .expect("registered prefab");
///
/// let mut orchestrator = TestOrchestrator::new(SessionConfig::default())
///     .with_registry(catalog)
///     .with_injector(LoadDropper::new(drop_point).with_template("car", NodeTemplate::new("Car")));
/// orchestrator.set_structure_root(root);
///
/// orchestrator.start_simulation(&mut scene, "car").expect("session starts");
/// assert_eq!(orchestrator.phase(), SessionPhase::Settling);
/// ```
pub struct TestOrchestrator {
    config: SessionConfig,
    structure_root: Option<NodeId>,
    registry: Option<Box<dyn PieceRegistry>>,
    injector: Option<Box<dyn LoadInjector>>,
    rescan: Option<Box<dyn FailureRescan>>,
    session: Option<SessionState>,
    last_outcome: Option<TestOutcome>,
    last_fault: Option<SessionError>,
}

impl Default for TestOrchestrator {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl std::fmt::Debug for TestOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestOrchestrator")
            .field("config", &self.config)
            .field("structure_root", &self.structure_root)
            .field("has_registry", &self.registry.is_some())
            .field("has_injector", &self.injector.is_some())
            .field("has_rescan", &self.rescan.is_some())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl TestOrchestrator {
    /// Creates an orchestrator with no collaborators and no structure root.
    #[must_use]
    pub const fn new(config: SessionConfig) -> Self {
        Self {
            config,
            structure_root: None,
            registry: None,
            injector: None,
            rescan: None,
            session: None,
            last_outcome: None,
            last_fault: None,
        }
    }

    /// Supplies the registry used to find runtime counterparts.
    #[must_use]
    pub fn with_registry(mut self, registry: impl PieceRegistry + 'static) -> Self {
        self.registry = Some(Box::new(registry));
        self
    }

    /// Supplies the collaborator that drops the test load.
    #[must_use]
    pub fn with_injector(mut self, injector: impl LoadInjector + 'static) -> Self {
        self.injector = Some(Box::new(injector));
        self
    }

    /// Supplies the optional failure rescan hook.
    #[must_use]
    pub fn with_rescan(mut self, rescan: impl FailureRescan + 'static) -> Self {
        self.rescan = Some(Box::new(rescan));
        self
    }

    /// Points the orchestrator at the node whose children form the structure.
    ///
    /// A running session keeps the root it started with; the new root applies
    /// from the next start.
    pub fn set_structure_root(&mut self, root: NodeId) {
        if self.is_running() {
            debug!("structure root changed to {root:?}; takes effect on the next test");
        }
        self.structure_root = Some(root);
    }

    /// Configured structure root, alive or not.
    #[must_use]
    pub const fn structure_root(&self) -> Option<NodeId> {
        self.structure_root
    }

    /// Timing and threshold settings applied to new sessions.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replaces the settings used by the next session.
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    /// Phase of the current session, or `Idle` when there is none.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map_or(SessionPhase::Idle, SessionState::phase)
    }

    /// Whether a session is replacing, settling or monitoring.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase().is_running()
    }

    /// The current session; a finished one is kept until the next start or stop.
    #[must_use]
    pub const fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    /// Outcome of the most recently evaluated session.
    #[must_use]
    pub const fn last_outcome(&self) -> Option<&TestOutcome> {
        self.last_outcome.as_ref()
    }

    /// Takes the fault that last forced a running session back to idle.
    pub fn take_fault(&mut self) -> Option<SessionError> {
        self.last_fault.take()
    }

    /// Starts a structure test with a load of `load_kind`.
    ///
    /// Replacement runs to completion before this returns, after which the
    /// session is settling. The build pieces that were swapped out are gone
    /// for good.
    ///
    /// # Errors
    ///
    /// Rejects the request without touching the scene when a session is
    /// already running, the structure root is missing or dead, a registry or
    /// injector has not been supplied, or the structure has no pieces.
    pub fn start_simulation(
        &mut self,
        scene: &mut SceneGraph,
        load_kind: &str,
    ) -> Result<ReplacementReport, SessionError> {
        let (root, registry) = self.admit(scene).inspect_err(|err| {
            warn!("structure test rejected: {err}");
        })?;

        let snapshot = scene.children(root).to_vec();
        let mut session = SessionState::new(root, load_kind, snapshot, &self.config);
        info!(
            "starting structure test: {} pieces, {load_kind} load",
            session.initial_piece_count()
        );

        let report = replace_structure(scene, root, session.snapshot(), registry);
        info!(
            "replaced {} pieces ({} without runtime variant, {} static)",
            report.replaced_count(),
            report.missing_template.len(),
            report.untagged.len()
        );

        if let Some(rescan) = self.rescan.as_mut() {
            rescan.collect_targets_now(scene);
        }

        session.begin_settling();
        self.session = Some(session);
        self.last_fault = None;
        Ok(report)
    }

    fn admit(&self, scene: &SceneGraph) -> Result<(NodeId, &dyn PieceRegistry), SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        let root = self
            .structure_root
            .filter(|root| scene.is_alive(*root))
            .ok_or(SessionError::MissingStructureRoot)?;
        let registry = self
            .registry
            .as_deref()
            .ok_or(SessionError::MissingRegistry)?;
        if self.injector.is_none() {
            return Err(SessionError::MissingInjector);
        }
        if scene.child_count(root) == 0 {
            return Err(SessionError::EmptyStructure);
        }
        Ok((root, registry))
    }

    /// Advances the running session by `delta_secs`.
    ///
    /// Returns the outcome on the tick the session is evaluated. Nothing
    /// escapes this call: a fault is logged, the session is dropped and the
    /// fault is kept for [`take_fault`](Self::take_fault).
    pub fn tick(&mut self, scene: &mut SceneGraph, delta_secs: f32) -> Option<TestOutcome> {
        let delta_secs = if delta_secs.is_finite() {
            delta_secs.max(0.0)
        } else {
            0.0
        };
        match self.phase() {
            SessionPhase::Settling => {
                self.tick_settling(scene, delta_secs);
                None
            }
            SessionPhase::Monitoring => match self.tick_monitoring(scene, delta_secs) {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.abort(err);
                    None
                }
            },
            SessionPhase::Idle | SessionPhase::Replacing | SessionPhase::Evaluated => None,
        }
    }

    fn tick_settling(&mut self, scene: &mut SceneGraph, delta_secs: f32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.advance_settle(delta_secs) {
            return;
        }
        let kind = session.load_kind().to_owned();
        let load = self
            .injector
            .as_mut()
            .and_then(|injector| injector.drop_load(scene, &kind, None));
        if load.is_none() {
            warn!("no {kind} load could be dropped; monitoring unloaded structure");
        }
        debug!("settle delay elapsed; monitoring");
        session.begin_monitoring(load);
    }

    fn tick_monitoring(
        &mut self,
        scene: &SceneGraph,
        delta_secs: f32,
    ) -> Result<Option<TestOutcome>, SessionError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        let root = session.root();
        if !scene.is_alive(root) {
            return Err(SessionError::StructureRootLost(root));
        }

        session.advance_monitor(delta_secs);
        let integrity = survey(scene, root, self.config.collapse_height);
        let early_collapse = integrity.is_collapsed();
        if early_collapse {
            info!(
                "structure collapsed after {:.2}s",
                session.elapsed_secs()
            );
        } else if !session.window_expired() {
            return Ok(None);
        }

        session.finish();
        let outcome = evaluate(
            scene,
            root,
            EvaluationContext {
                load_kind: session.load_kind(),
                initial_piece_count: session.initial_piece_count(),
                elapsed_secs: session.elapsed_secs(),
                early_collapse,
            },
        );
        log_outcome(&outcome);
        self.last_outcome = Some(outcome.clone());
        Ok(Some(outcome))
    }

    fn abort(&mut self, err: SessionError) {
        error!("structure test aborted: {err}");
        self.session = None;
        self.last_fault = Some(err);
    }

    /// Abandons any session without grading it. Safe to call repeatedly.
    ///
    /// A load that has not been dropped yet never will be.
    pub fn stop_simulation(&mut self) {
        if self.session.take().is_some_and(|s| s.phase().is_running()) {
            info!("structure test stopped");
        }
    }

    /// Snapshot of the session for status displays.
    #[must_use]
    pub fn status(&self, scene: &SceneGraph) -> SessionStatus {
        let phase = self.phase();
        SessionStatus {
            is_running: phase.is_running(),
            phase,
            elapsed_secs: self
                .session
                .as_ref()
                .filter(|_| phase.is_running())
                .map_or(0.0, SessionState::elapsed_secs),
            remaining_piece_count: self
                .session
                .as_ref()
                .map(SessionState::root)
                .or(self.structure_root)
                .map_or(0, |root| scene.child_count(root)),
            initial_piece_count: self
                .session
                .as_ref()
                .map_or(0, SessionState::initial_piece_count),
        }
    }
}

fn log_outcome(outcome: &TestOutcome) {
    info!("{}", outcome.tier.headline());
    info!(
        "survival rate {}% ({}/{} pieces, {:.2}s)",
        outcome.survival_percent(),
        outcome.remaining_piece_count,
        outcome.initial_piece_count,
        outcome.elapsed_secs
    );
    for (kind, count) in &outcome.remaining_by_type {
        info!("  {kind}: {count}");
    }
}
