//! Collaborator doubles that record how the orchestrator used them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use trestle::{FailureRescan, LoadHandle, LoadInjector, NodeId, Pose, SceneGraph};

/// Shared view of the loads a [`RecordingInjector`] dropped.
#[derive(Debug, Clone, Default)]
pub struct InjectionLog(Arc<Mutex<Vec<String>>>);

impl InjectionLog {
    /// Kinds requested so far, in order.
    pub fn kinds(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of drops requested so far.
    pub fn count(&self) -> usize {
        self.kinds().len()
    }

    fn push(&self, kind: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(kind.to_owned());
    }
}

/// Injector that spawns a bare node above the drop point and logs the request.
#[derive(Debug, Clone)]
pub struct RecordingInjector {
    drop_point: NodeId,
    log: InjectionLog,
}

impl RecordingInjector {
    /// An injector dropping loads above `drop_point`.
    pub fn new(drop_point: NodeId) -> Self {
        Self {
            drop_point,
            log: InjectionLog::default(),
        }
    }

    /// Handle for inspecting requests after the injector is moved.
    pub fn log(&self) -> InjectionLog {
        self.log.clone()
    }
}

impl LoadInjector for RecordingInjector {
    fn drop_load(
        &mut self,
        scene: &mut SceneGraph,
        kind: &str,
        height_override: Option<f32>,
    ) -> Option<LoadHandle> {
        self.log.push(kind);
        let mut pose = scene.world_pose(self.drop_point)?;
        pose.translation.y += height_override.unwrap_or(3.0);
        let node = scene.spawn(format!("Load_{kind}"), None);
        scene.set_world_pose(node, Pose::from_translation(pose.translation));
        Some(LoadHandle {
            node,
            kind: kind.to_owned(),
        })
    }
}

/// Rescan hook counting how often it was invoked.
#[derive(Debug, Clone, Default)]
pub struct CountingRescan(Arc<AtomicUsize>);

impl CountingRescan {
    /// Number of rescans so far.
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl FailureRescan for CountingRescan {
    fn collect_targets_now(&mut self, _scene: &SceneGraph) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
