//! Utility helpers for tests.

pub mod bridge;
pub mod collaborators;

pub use bridge::{Bridge, BridgeBuilder, BEAM, RAIL};
pub use collaborators::{CountingRescan, InjectionLog, RecordingInjector};

use trestle::{Pose, SceneGraph, TestOrchestrator, TestOutcome, POSE_TOLERANCE};

/// Assert that two poses match within [`POSE_TOLERANCE`].
///
/// # Panics
/// Panics with both poses if they differ.
pub fn assert_pose_eq(actual: &Pose, expected: &Pose) {
    assert!(
        actual.abs_diff_eq(expected, POSE_TOLERANCE),
        "pose mismatch: {actual:?} != {expected:?}"
    );
}

/// Ticks `orchestrator` with `delta_secs` until it yields an outcome or
/// `max_ticks` pass.
pub fn run_until_outcome(
    orchestrator: &mut TestOrchestrator,
    scene: &mut SceneGraph,
    delta_secs: f32,
    max_ticks: usize,
) -> Option<TestOutcome> {
    (0..max_ticks).find_map(|_| orchestrator.tick(scene, delta_secs))
}
