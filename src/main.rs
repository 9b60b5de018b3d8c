//! Headless structure test runner: builds a demo bridge, loads it and prints
//! the graded outcome as JSON.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use clap::Parser;
use log::info;
use trestle::{
    init_logging, Body, BuildIndex, LastTestOutcome, LoadDropper, MaterialCatalog, NodeTemplate,
    Pose, Prefab, PrefabCatalog, SceneGraph, SessionConfig, SessionPhase, StartStructureTest,
    TestBench, TestBenchPlugin, TestOrchestrator, Workbench, DEFAULT_LOAD_KIND,
    STANDARD_LOAD_KINDS,
};

/// Build a bridge, load it and report how much of it survives
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Load to drop on the structure
    #[arg(short, long, default_value = DEFAULT_LOAD_KIND)]
    load: String,
    /// Number of pieces in the bridge
    #[arg(long, default_value_t = 10)]
    pieces: u32,
    /// How many of those pieces have no physics variant
    #[arg(long, default_value_t = 2)]
    unregistered: u32,
    /// Pieces the scripted failure knocks off the bridge once it is loaded
    #[arg(long, default_value_t = 1)]
    knock_down: usize,
    /// JSON session config
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the settle delay in seconds
    #[arg(long)]
    settle: Option<f32>,
    /// Override the monitoring window in seconds
    #[arg(long)]
    window: Option<f32>,
    /// Simulated frame length in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
}

/// Stand-in for the physics layer: breaks `count` pieces once the load is on.
#[derive(Resource)]
struct ScriptedFailure {
    count: usize,
    fired: bool,
}

fn scripted_failure(mut failure: ResMut<ScriptedFailure>, mut bench: ResMut<TestBench>) {
    if failure.fired || bench.orchestrator.phase() != SessionPhase::Monitoring {
        return;
    }
    let TestBench {
        scene,
        orchestrator,
    } = &mut *bench;
    let Some(root) = orchestrator.structure_root() else {
        return;
    };
    let victims: Vec<_> = scene.children(root).iter().copied().take(failure.count).collect();
    for piece in victims {
        scene.destroy(piece);
    }
    failure.fired = true;
}

fn session_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(settle) = args.settle {
        config.settle_delay_secs = settle;
    }
    if let Some(window) = args.window {
        config.monitor_window_secs = window;
    }
    Ok(config.validate()?)
}

fn prefabs() -> PrefabCatalog {
    let mut catalog = PrefabCatalog::new();
    catalog.register(Prefab::new(
        "Beam",
        NodeTemplate::new("Beam_Build").with_body(Body::fixed().with_volume(0.4)),
        Some(NodeTemplate::new("Beam_Runtime").with_body(Body::dynamic(1.0).with_volume(0.4))),
    ));
    catalog.register(Prefab::new(
        "Rail",
        NodeTemplate::new("Rail_Build").with_body(Body::fixed().with_volume(0.05)),
        None,
    ));
    catalog
}

fn loads(drop_point: trestle::NodeId) -> LoadDropper {
    let masses = [80.0, 1500.0, 12_000.0, 40_000.0];
    STANDARD_LOAD_KINDS
        .iter()
        .zip(masses)
        .fold(LoadDropper::new(drop_point), |dropper, (kind, mass)| {
            dropper.with_template(*kind, NodeTemplate::new(*kind).with_body(Body::dynamic(mass)))
        })
}

fn build_bench(args: &Args, config: SessionConfig) -> Result<TestBench> {
    if args.unregistered > args.pieces {
        bail!(
            "cannot leave {} of {} pieces unregistered",
            args.unregistered,
            args.pieces
        );
    }
    let prefabs = Arc::new(prefabs());
    let mut scene = SceneGraph::new();
    let root = scene.spawn("BridgeRoot", None);
    let drop_point = scene.spawn("DropPoint", None);
    scene.set_local_pose(drop_point, Pose::from_xyz(0.0, 2.0, 0.0));

    let mut workbench = Workbench::new(Arc::clone(&prefabs), MaterialCatalog::default(), root);
    for i in 0..args.pieces {
        let index = if i < args.pieces - args.unregistered {
            BuildIndex(0)
        } else {
            BuildIndex(1)
        };
        workbench.select_component(&mut scene, index);
        workbench.preview(&mut scene, Some(Pose::from_xyz(f32::from(u16::try_from(i)?), 1.0, 0.0)));
        workbench.place_selected(&mut scene)?;
    }
    workbench.clear_ghost(&mut scene);
    info!("built bridge with {} pieces", scene.child_count(root));

    let mut orchestrator = TestOrchestrator::new(config)
        .with_registry(prefabs)
        .with_injector(loads(drop_point));
    orchestrator.set_structure_root(root);
    Ok(TestBench::new(scene, orchestrator))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = session_config(&args)?;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            args.frame_ms,
        )))
        .insert_resource(build_bench(&args, config)?)
        .insert_resource(ScriptedFailure {
            count: args.knock_down,
            fired: false,
        })
        .add_plugins(TestBenchPlugin)
        .add_systems(Update, scripted_failure.after(trestle::tick_test_bench));

    app.world_mut().trigger(StartStructureTest::new(args.load.clone()));
    if !app.world().resource::<TestBench>().orchestrator.is_running() {
        bail!("structure test with a {} load did not start", args.load);
    }

    let outcome = loop {
        app.update();
        if let Some(outcome) = app.world().resource::<LastTestOutcome>().0.clone() {
            break outcome;
        }
        if !app.world().resource::<TestBench>().orchestrator.is_running() {
            bail!("structure test aborted before it was graded");
        }
    };

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &outcome)?;
    writeln!(stdout)?;
    Ok(())
}
