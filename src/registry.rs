//! Prefab catalogue and the runtime-template lookup used at test start.
//!
//! Every placeable piece has a build variant (static, editable) and usually a
//! runtime variant (simulated). The orchestrator only sees the
//! [`PieceRegistry`] side; the build workbench uses the catalogue to spawn
//! build pieces and ghosts.

use std::sync::Arc;

use log::{debug, warn};

use crate::scene::{BuildIndex, NodeId, NodeTemplate, PieceTags, Pose, SceneGraph};

/// Looks up the physics-enabled counterpart of a build piece.
///
/// Implementations must be idempotent and free of side effects.
pub trait PieceRegistry: Send + Sync {
    /// Template for the runtime variant of prefab `build_index`, if any.
    fn runtime_template(&self, build_index: BuildIndex) -> Option<NodeTemplate>;
}

impl<T: PieceRegistry + ?Sized> PieceRegistry for Arc<T> {
    fn runtime_template(&self, build_index: BuildIndex) -> Option<NodeTemplate> {
        (**self).runtime_template(build_index)
    }
}

/// One placeable piece type.
#[derive(Debug, Clone, PartialEq)]
pub struct Prefab {
    /// Category reported in outcome breakdowns, e.g. `"Beam"`.
    pub component_type: String,
    /// Static variant placed while building.
    pub build: NodeTemplate,
    /// Simulated variant swapped in when a test starts.
    pub runtime: Option<NodeTemplate>,
}

impl Prefab {
    /// A prefab with both variants.
    #[must_use]
    pub fn new(
        component_type: impl Into<String>,
        build: NodeTemplate,
        runtime: Option<NodeTemplate>,
    ) -> Self {
        Self {
            component_type: component_type.into(),
            build,
            runtime,
        }
    }
}

/// Ordered list of prefabs; a prefab's position is its [`BuildIndex`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefabCatalog {
    prefabs: Vec<Prefab>,
}

impl PrefabCatalog {
    /// Creates an empty catalogue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            prefabs: Vec::new(),
        }
    }

    /// Appends `prefab` and returns the index it was registered under, or
    /// `None` once the catalogue has run out of build indices.
    pub fn register(&mut self, prefab: Prefab) -> Option<BuildIndex> {
        let Ok(index) = u32::try_from(self.prefabs.len()) else {
            warn!("prefab catalogue is full; dropping {}", prefab.component_type);
            return None;
        };
        self.prefabs.push(prefab);
        Some(BuildIndex(index))
    }

    /// Prefab registered under `index`.
    #[must_use]
    pub fn get(&self, index: BuildIndex) -> Option<&Prefab> {
        usize::try_from(index.0)
            .ok()
            .and_then(|i| self.prefabs.get(i))
    }

    /// Number of registered prefabs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prefabs.len()
    }

    /// Whether no prefab is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }

    /// Spawns the build variant of `index` under `parent` at local `pose`.
    ///
    /// The piece is tagged with its build index and component type so the
    /// replacement engine can find its runtime counterpart later.
    pub fn spawn_build(
        &self,
        scene: &mut SceneGraph,
        index: BuildIndex,
        parent: Option<NodeId>,
        pose: Pose,
    ) -> Option<NodeId> {
        let prefab = self.get(index)?;
        let id = scene.instantiate(&prefab.build, parent);
        scene.set_local_pose(id, pose);
        scene.set_tags(id, PieceTags::build_piece(index, prefab.component_type.clone()));
        scene.set_active(id, true);
        debug!("spawned build piece {index:?} ({}) as {id:?}", prefab.component_type);
        Some(id)
    }

    /// Spawns an untagged preview of `index` at world `pose`, outside any structure.
    pub fn spawn_ghost(&self, scene: &mut SceneGraph, index: BuildIndex, pose: Pose) -> Option<NodeId> {
        let prefab = self.get(index)?;
        let id = scene.instantiate(&prefab.build, None);
        scene.set_world_pose(id, pose);
        scene.set_active(id, true);
        Some(id)
    }
}

impl PieceRegistry for PrefabCatalog {
    fn runtime_template(&self, build_index: BuildIndex) -> Option<NodeTemplate> {
        self.get(build_index).and_then(|p| p.runtime.clone())
    }
}
