//! Drives structure tests through the Bevy plugin with a manual frame clock.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rstest::{fixture, rstest};
use test_utils::BridgeBuilder;
use trestle::{
    LastTestOutcome, SessionConfig, SessionPhase, StartStructureTest, StopStructureTest,
    SurvivalTier, TestBench, TestBenchPlugin, TestBenchStatus,
};

const MAX_FRAMES: usize = 200;

#[fixture]
fn app() -> App {
    let bridge = BridgeBuilder::new().registered(4).unregistered(1).build();
    let config = SessionConfig {
        settle_delay_secs: 0.2,
        monitor_window_secs: 1.0,
        ..SessionConfig::default()
    };
    let (orchestrator, _) = bridge.orchestrator(config);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)))
        .insert_resource(TestBench::new(bridge.scene, orchestrator))
        .add_plugins(TestBenchPlugin);
    app
}

fn phase(app: &App) -> SessionPhase {
    app.world().resource::<TestBench>().orchestrator.phase()
}

#[rstest]
fn start_event_runs_a_test_to_completion(mut app: App) {
    app.world_mut().trigger(StartStructureTest::new("car"));
    assert_eq!(phase(&app), SessionPhase::Settling);

    let mut frames = 0;
    while app.world().resource::<LastTestOutcome>().0.is_none() && frames < MAX_FRAMES {
        app.update();
        frames += 1;
    }

    let outcome = app
        .world()
        .resource::<LastTestOutcome>()
        .0
        .clone()
        .expect("test completes within the frame budget");
    assert_eq!(outcome.load_kind, "car");
    assert_eq!(outcome.initial_piece_count, 5);
    assert_eq!(outcome.remaining_piece_count, 5);
    assert_eq!(outcome.tier, SurvivalTier::Excellent);
    assert!(!outcome.early_collapse);
    assert_eq!(phase(&app), SessionPhase::Evaluated);

    let status = app.world().resource::<TestBenchStatus>().0;
    assert!(!status.is_running);
    assert_eq!(status.phase, SessionPhase::Evaluated);
}

#[rstest]
fn status_resource_follows_the_session(mut app: App) {
    app.world_mut().trigger(StartStructureTest::new("truck"));
    for _ in 0..10 {
        app.update();
    }

    let status = app.world().resource::<TestBenchStatus>().0;
    assert!(status.is_running);
    assert_eq!(status.phase, SessionPhase::Monitoring);
    assert_eq!(status.initial_piece_count, 5);
}

#[rstest]
fn stop_event_abandons_the_test(mut app: App) {
    app.world_mut().trigger(StartStructureTest::new("car"));
    app.update();
    app.world_mut().trigger(StopStructureTest);
    assert_eq!(phase(&app), SessionPhase::Idle);

    for _ in 0..MAX_FRAMES {
        app.update();
    }
    assert!(app.world().resource::<LastTestOutcome>().0.is_none());
    assert!(!app.world().resource::<TestBenchStatus>().0.is_running);
}
