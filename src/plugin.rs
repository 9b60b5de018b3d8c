//! Bevy plugin driving the test orchestrator from the frame clock.
//!
//! The scene and orchestrator live together in the [`TestBench`] resource.
//! Requests arrive as observer events, the orchestrator is ticked once per
//! `Update` with the frame's delta, and results and faults leave as events.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::{error, info};
use thiserror::Error;

use crate::scene::SceneGraph;
use crate::session::{SessionStatus, TestOrchestrator, TestOutcome};

/// Scene and orchestrator shared by the bench systems.
#[derive(Resource, Debug, Default)]
pub struct TestBench {
    /// Scene holding the structure, loads and any preview nodes.
    pub scene: SceneGraph,
    /// Orchestrator running tests against [`TestBench::scene`].
    pub orchestrator: TestOrchestrator,
}

impl TestBench {
    /// Bundles an already configured scene and orchestrator.
    #[must_use]
    pub const fn new(scene: SceneGraph, orchestrator: TestOrchestrator) -> Self {
        Self {
            scene,
            orchestrator,
        }
    }
}

/// Status refreshed after every tick for HUD-style consumers.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct TestBenchStatus(pub SessionStatus);

/// Outcome of the most recent completed test.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct LastTestOutcome(pub Option<TestOutcome>);

/// Request to start a structure test.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct StartStructureTest {
    /// Load kind to drop once the structure settles.
    pub load_kind: String,
}

impl StartStructureTest {
    /// A start request for `load_kind`.
    #[must_use]
    pub fn new(load_kind: impl Into<String>) -> Self {
        Self {
            load_kind: load_kind.into(),
        }
    }
}

/// Request to abandon the running test without grading it.
#[derive(Event, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopStructureTest;

/// Raised on the tick a test is graded.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct StructureTestCompleted {
    /// The graded result.
    pub outcome: TestOutcome,
}

/// Context carried by [`TestBenchError`] events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestBenchErrorContext {
    /// A start request was rejected.
    Start,
    /// A running test was aborted during a tick.
    Tick,
}

/// Event raised when a bench request or tick fails.
#[derive(Event, Debug, Clone, Error)]
#[error("{context:?}: {detail}")]
pub struct TestBenchError {
    /// Where the failure occurred.
    pub context: TestBenchErrorContext,
    /// Description of the underlying error.
    pub detail: String,
}

impl TestBenchError {
    /// Convenience constructor used by systems to emit error events.
    #[must_use]
    pub fn new(context: TestBenchErrorContext, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn start_structure_test(
    event: On<StartStructureTest>,
    mut bench: ResMut<TestBench>,
    mut commands: Commands,
) {
    let TestBench {
        scene,
        orchestrator,
    } = &mut *bench;
    if let Err(err) = orchestrator.start_simulation(scene, &event.event().load_kind) {
        commands.trigger(TestBenchError::new(
            TestBenchErrorContext::Start,
            err.to_string(),
        ));
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn stop_structure_test(_event: On<StopStructureTest>, mut bench: ResMut<TestBench>) {
    bench.orchestrator.stop_simulation();
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn record_outcome(event: On<StructureTestCompleted>, mut last: ResMut<LastTestOutcome>) {
    let outcome = &event.event().outcome;
    info!(
        "test completed: {:?} with {}% surviving",
        outcome.tier,
        outcome.survival_percent()
    );
    last.0 = Some(outcome.clone());
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_test_bench_error(event: On<TestBenchError>) {
    let TestBenchError { context, detail } = event.event();
    error!("test bench error during {context:?}: {detail}");
}

/// Advances the orchestrator by the frame delta and publishes the results.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn tick_test_bench(
    time: Res<Time>,
    mut bench: ResMut<TestBench>,
    mut status: ResMut<TestBenchStatus>,
    mut commands: Commands,
) {
    let TestBench {
        scene,
        orchestrator,
    } = &mut *bench;
    let outcome = orchestrator.tick(scene, time.delta_secs());
    if let Some(fault) = orchestrator.take_fault() {
        commands.trigger(TestBenchError::new(
            TestBenchErrorContext::Tick,
            fault.to_string(),
        ));
    }
    status.0 = orchestrator.status(scene);
    if let Some(outcome) = outcome {
        commands.trigger(StructureTestCompleted { outcome });
    }
}

/// Bevy plugin installing the test bench resources, observers and tick system.
///
/// An existing [`TestBench`] resource is kept, so apps can insert a fully
/// configured bench before adding the plugin.
#[derive(Default)]
pub struct TestBenchPlugin;

impl Plugin for TestBenchPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TestBench>()
            .init_resource::<TestBenchStatus>()
            .init_resource::<LastTestOutcome>();
        app.add_observer(start_structure_test)
            .add_observer(stop_structure_test)
            .add_observer(record_outcome)
            .add_observer(log_test_bench_error);
        app.add_systems(Update, tick_test_bench);
    }
}
