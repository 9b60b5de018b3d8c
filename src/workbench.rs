//! Build-mode workbench: component and material selection, the placement
//! ghost, and handing the finished structure to the test orchestrator.

use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;

use crate::material::MaterialCatalog;
use crate::registry::PrefabCatalog;
use crate::scene::{BuildIndex, NodeId, Pose, SceneGraph};
use crate::session::{ReplacementReport, SessionError, TestOrchestrator};
use crate::DEFAULT_PLACEMENT_POSITION;

/// Why a build piece could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkbenchError {
    /// The selected index names no prefab.
    #[error("no prefab registered for {0:?}")]
    UnknownComponent(BuildIndex),
    /// The structure root is gone.
    #[error("structure root {0:?} no longer exists")]
    MissingStructureRoot(NodeId),
}

/// Build-mode state for one structure.
#[derive(Debug, Clone)]
pub struct Workbench {
    prefabs: Arc<PrefabCatalog>,
    materials: MaterialCatalog,
    structure_root: NodeId,
    selected: BuildIndex,
    ghost: Option<(NodeId, BuildIndex)>,
    last_preview: Option<Pose>,
}

impl Workbench {
    /// A workbench placing pieces from `prefabs` under `structure_root`.
    #[must_use]
    pub fn new(prefabs: Arc<PrefabCatalog>, materials: MaterialCatalog, structure_root: NodeId) -> Self {
        Self {
            prefabs,
            materials,
            structure_root,
            selected: BuildIndex(0),
            ghost: None,
            last_preview: None,
        }
    }

    /// Prefab placed by [`place_selected`](Self::place_selected).
    #[must_use]
    pub const fn selected_component(&self) -> BuildIndex {
        self.selected
    }

    /// Material applied to newly placed pieces.
    #[must_use]
    pub fn selected_material(&self) -> &str {
        self.materials.selected()
    }

    /// The material presets in use.
    #[must_use]
    pub const fn materials(&self) -> &MaterialCatalog {
        &self.materials
    }

    /// The live preview node, if one is showing.
    #[must_use]
    pub fn ghost(&self, scene: &SceneGraph) -> Option<NodeId> {
        self.ghost
            .map(|(node, _)| node)
            .filter(|node| scene.is_alive(*node))
    }

    /// Selects the prefab to place and refreshes the preview at the last pose.
    pub fn select_component(&mut self, scene: &mut SceneGraph, index: BuildIndex) {
        self.selected = index;
        info!("selected component {index:?}");
        if self.last_preview.is_some() {
            self.preview(scene, None);
        }
    }

    /// Selects the material and re-tints the preview.
    pub fn select_material(&mut self, scene: &mut SceneGraph, name: &str) {
        if name.is_empty() {
            return;
        }
        self.materials.select(name);
        if let Some(ghost) = self.ghost(scene) {
            self.materials.apply_to_instance(scene, ghost, None, true);
        }
    }

    /// Shows the preview ghost at `pose`, or at the last previewed pose.
    ///
    /// The ghost is respawned when the selected prefab changed since it was
    /// created; otherwise it is moved.
    pub fn preview(&mut self, scene: &mut SceneGraph, pose: Option<Pose>) -> Option<NodeId> {
        let pose = pose.or(self.last_preview)?;
        self.last_preview = Some(pose);

        match self.ghost.filter(|(node, _)| scene.is_alive(*node)) {
            Some((node, index)) if index == self.selected => {
                scene.set_world_pose(node, pose);
                Some(node)
            }
            stale => {
                if let Some((node, _)) = stale {
                    scene.destroy(node);
                }
                let node = self.prefabs.spawn_ghost(scene, self.selected, pose);
                if let Some(node) = node {
                    self.materials.apply_to_instance(scene, node, None, true);
                }
                self.ghost = node.map(|n| (n, self.selected));
                node
            }
        }
    }

    /// Places the selected prefab at the ghost's pose, or at the default
    /// spot under the structure root when no ghost is showing.
    ///
    /// # Errors
    ///
    /// Fails when the selection names no prefab or the root is gone.
    pub fn place_selected(&mut self, scene: &mut SceneGraph) -> Result<NodeId, WorkbenchError> {
        if !scene.is_alive(self.structure_root) {
            return Err(WorkbenchError::MissingStructureRoot(self.structure_root));
        }
        let ghost_pose = self.ghost(scene).and_then(|g| scene.world_pose(g));
        let piece = self
            .prefabs
            .spawn_build(
                scene,
                self.selected,
                Some(self.structure_root),
                Pose::from_translation(DEFAULT_PLACEMENT_POSITION),
            )
            .ok_or(WorkbenchError::UnknownComponent(self.selected))
            .inspect_err(|err| warn!("cannot place piece: {err}"))?;
        if let Some(pose) = ghost_pose {
            scene.set_world_pose(piece, pose);
        }
        self.materials.apply_to_instance(scene, piece, None, false);
        info!(
            "placed {:?} with {} as {piece:?}",
            self.selected,
            self.materials.selected()
        );
        Ok(piece)
    }

    /// Removes the preview ghost and forgets the last preview pose.
    pub fn clear_ghost(&mut self, scene: &mut SceneGraph) {
        if let Some((node, _)) = self.ghost.take() {
            scene.destroy(node);
        }
        self.last_preview = None;
    }

    /// Hands the structure to `orchestrator` for a test with `load_kind`.
    ///
    /// A successful start removes the preview ghost.
    ///
    /// # Errors
    ///
    /// Propagates the orchestrator's rejection.
    pub fn start_test(
        &mut self,
        orchestrator: &mut TestOrchestrator,
        scene: &mut SceneGraph,
        load_kind: &str,
    ) -> Result<ReplacementReport, SessionError> {
        info!("starting test with {load_kind} load");
        let report = orchestrator.start_simulation(scene, load_kind)?;
        self.clear_ghost(scene);
        Ok(report)
    }
}
