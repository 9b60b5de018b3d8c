//! End-to-end structure test sessions driven with synthetic frame deltas.

use approx::assert_relative_eq;
use rstest::{fixture, rstest};
use test_utils::{assert_pose_eq, run_until_outcome, Bridge, BridgeBuilder, CountingRescan};
use trestle::{
    NodeId, SessionConfig, SessionError, SessionPhase, SurvivalTier, COLLAPSE_HEIGHT,
};

const FRAME: f32 = 0.05;

fn config() -> SessionConfig {
    SessionConfig {
        settle_delay_secs: 0.3,
        monitor_window_secs: 8.0,
        ..SessionConfig::default()
    }
}

#[fixture]
fn mixed_bridge() -> Bridge {
    BridgeBuilder::new().registered(8).unregistered(2).build()
}

/// Ticks until the orchestrator leaves `Settling`, returning the ticks taken.
fn settle(orchestrator: &mut trestle::TestOrchestrator, bridge: &mut Bridge) -> usize {
    let mut ticks = 0;
    while orchestrator.phase() == SessionPhase::Settling && ticks < 1_000 {
        orchestrator.tick(&mut bridge.scene, FRAME);
        ticks += 1;
    }
    ticks
}

#[rstest]
fn mixed_bridge_keeps_every_piece_after_replacement(mut mixed_bridge: Bridge) {
    let poses: Vec<_> = mixed_bridge
        .pieces
        .iter()
        .map(|p| mixed_bridge.scene.world_pose(*p).expect("alive"))
        .collect();
    let (mut orchestrator, _) = mixed_bridge.orchestrator(config());

    let report = orchestrator
        .start_simulation(&mut mixed_bridge.scene, "car")
        .expect("session starts");

    assert_eq!(report.replaced_count(), 8);
    assert_eq!(report.missing_template.len(), 2);
    assert_eq!(mixed_bridge.scene.child_count(mixed_bridge.root), 10);

    let children = mixed_bridge.scene.children(mixed_bridge.root).to_vec();
    let runtime = children
        .iter()
        .filter(|c| mixed_bridge.scene.name(**c) == Some("Beam_Runtime"))
        .count();
    assert_eq!(runtime, 8);
    for (original, pose) in mixed_bridge.pieces.iter().zip(&poses) {
        let survivor = report
            .replaced
            .iter()
            .find(|r| r.original == *original)
            .map_or(*original, |r| r.replacement);
        let after = mixed_bridge.scene.world_pose(survivor).expect("alive");
        assert_pose_eq(&after, pose);
    }
}

#[rstest]
fn load_drops_once_after_settle_and_nine_of_ten_is_excellent(mut mixed_bridge: Bridge) {
    let (mut orchestrator, injections) = mixed_bridge.orchestrator(config());
    orchestrator
        .start_simulation(&mut mixed_bridge.scene, "car")
        .expect("session starts");

    let ticks = settle(&mut orchestrator, &mut mixed_bridge);
    assert_eq!(ticks, 6, "0.3s of 0.05s frames");
    assert_eq!(injections.kinds(), vec!["car".to_owned()]);

    mixed_bridge.break_children(1);
    let outcome = run_until_outcome(&mut orchestrator, &mut mixed_bridge.scene, FRAME, 1_000)
        .expect("window expires");

    assert_eq!(injections.count(), 1);
    assert!(!outcome.early_collapse);
    assert!(outcome.elapsed_secs > 8.0);
    assert_eq!(outcome.initial_piece_count, 10);
    assert_eq!(outcome.remaining_piece_count, 9);
    assert_relative_eq!(outcome.survival_rate, 0.9);
    assert_eq!(outcome.tier, SurvivalTier::Excellent);
    assert_eq!(outcome.remaining_by_type.values().sum::<usize>(), 9);
}

#[rstest]
fn total_collapse_ends_the_session_early(mut mixed_bridge: Bridge) {
    let (mut orchestrator, _) = mixed_bridge.orchestrator(config());
    orchestrator
        .start_simulation(&mut mixed_bridge.scene, "truck")
        .expect("session starts");
    settle(&mut orchestrator, &mut mixed_bridge);
    orchestrator.tick(&mut mixed_bridge.scene, FRAME);

    mixed_bridge.drop_children_to(10, COLLAPSE_HEIGHT - 0.5);
    let outcome = orchestrator
        .tick(&mut mixed_bridge.scene, FRAME)
        .expect("collapse is graded on the same tick");

    assert!(outcome.early_collapse);
    assert!(outcome.elapsed_secs < 1.0);
    // Fallen pieces are still children of the root, so they still count.
    assert_eq!(outcome.remaining_piece_count, 10);
    assert_eq!(orchestrator.phase(), SessionPhase::Evaluated);
}

#[rstest]
fn static_pieces_count_towards_survival() {
    let mut bridge = BridgeBuilder::new().registered(2).unregistered(3).build();
    let (mut orchestrator, _) = bridge.orchestrator(config());
    orchestrator
        .start_simulation(&mut bridge.scene, "car")
        .expect("session starts");
    settle(&mut orchestrator, &mut bridge);

    let runtime: Vec<NodeId> = bridge
        .scene
        .children(bridge.root)
        .iter()
        .copied()
        .filter(|c| bridge.scene.name(*c) == Some("Beam_Runtime"))
        .collect();
    for piece in runtime {
        bridge.scene.destroy(piece);
    }

    let outcome = run_until_outcome(&mut orchestrator, &mut bridge.scene, FRAME, 1_000)
        .expect("window expires");
    assert_relative_eq!(outcome.survival_rate, 0.6);
    assert_eq!(outcome.tier, SurvivalTier::Good);
    assert_eq!(outcome.remaining_by_type.get("Rail"), Some(&3));
}

#[rstest]
fn anchors_are_left_alone() {
    let mut bridge = BridgeBuilder::new().registered(1).anchors(2).build();
    let (mut orchestrator, _) = bridge.orchestrator(config());
    let report = orchestrator
        .start_simulation(&mut bridge.scene, "car")
        .expect("session starts");

    assert_eq!(report.untagged.len(), 2);
    assert!(report.untagged.iter().all(|a| bridge.scene.is_alive(*a)));
}

#[rstest]
fn empty_structure_is_a_no_op() {
    let mut bridge = BridgeBuilder::new().build();
    let (mut orchestrator, injections) = bridge.orchestrator(config());

    let err = orchestrator
        .start_simulation(&mut bridge.scene, "car")
        .expect_err("nothing to test");

    assert_eq!(err, SessionError::EmptyStructure);
    assert_eq!(orchestrator.phase(), SessionPhase::Idle);
    assert!(run_until_outcome(&mut orchestrator, &mut bridge.scene, FRAME, 200).is_none());
    assert_eq!(injections.count(), 0);
}

#[rstest]
fn rescan_hook_runs_once_per_start(mut mixed_bridge: Bridge) {
    let rescan = CountingRescan::default();
    let (orchestrator, _) = mixed_bridge.orchestrator(config());
    let mut orchestrator = orchestrator.with_rescan(rescan.clone());

    orchestrator
        .start_simulation(&mut mixed_bridge.scene, "car")
        .expect("session starts");
    let _ = orchestrator.start_simulation(&mut mixed_bridge.scene, "car");

    assert_eq!(rescan.count(), 1);
}

#[rstest]
fn status_tracks_the_session(mut mixed_bridge: Bridge) {
    let (mut orchestrator, _) = mixed_bridge.orchestrator(config());
    let idle = orchestrator.status(&mixed_bridge.scene);
    assert!(!idle.is_running);
    assert_eq!(idle.initial_piece_count, 0);
    assert_eq!(idle.remaining_piece_count, 10);

    orchestrator
        .start_simulation(&mut mixed_bridge.scene, "car")
        .expect("session starts");
    settle(&mut orchestrator, &mut mixed_bridge);
    orchestrator.tick(&mut mixed_bridge.scene, FRAME);
    mixed_bridge.break_children(4);

    let running = orchestrator.status(&mixed_bridge.scene);
    assert!(running.is_running);
    assert_eq!(running.phase, SessionPhase::Monitoring);
    assert_eq!(running.initial_piece_count, 10);
    assert_eq!(running.remaining_piece_count, 6);
    assert_relative_eq!(running.elapsed_secs, FRAME);
}
