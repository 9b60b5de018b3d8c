//! Test loads and the dropper that releases them over the structure.

use hashbrown::HashMap;
use log::{info, warn};
use serde::Serialize;

use crate::scene::{NodeId, NodeTemplate, Pose, SceneGraph};
use crate::{DEFAULT_DROP_HEIGHT, MIN_DROP_HEIGHT};

/// Handle to a load spawned for a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadHandle {
    /// Scene node of the spawned load.
    pub node: NodeId,
    /// Kind the load was requested as, e.g. `"truck"`.
    pub kind: String,
}

/// Introduces a test load into the scene.
pub trait LoadInjector: Send + Sync {
    /// Spawns a load of `kind`, optionally overriding the release height.
    ///
    /// Returns `None` when the load cannot be spawned; callers treat that as
    /// a logged, non-fatal failure.
    fn drop_load(
        &mut self,
        scene: &mut SceneGraph,
        kind: &str,
        height_override: Option<f32>,
    ) -> Option<LoadHandle>;
}

/// Releases catalogued loads from a fixed height above a drop point.
#[derive(Debug, Clone)]
pub struct LoadDropper {
    templates: HashMap<String, NodeTemplate>,
    drop_point: Option<NodeId>,
    drop_height: f32,
}

impl Default for LoadDropper {
    fn default() -> Self {
        Self {
            templates: HashMap::new(),
            drop_point: None,
            drop_height: DEFAULT_DROP_HEIGHT,
        }
    }
}

impl LoadDropper {
    /// Creates a dropper releasing loads above `drop_point`.
    #[must_use]
    pub fn new(drop_point: NodeId) -> Self {
        Self {
            drop_point: Some(drop_point),
            ..Self::default()
        }
    }

    /// Registers `template` as the load spawned for `kind`.
    #[must_use]
    pub fn with_template(mut self, kind: impl Into<String>, template: NodeTemplate) -> Self {
        self.templates.insert(kind.into(), template);
        self
    }

    /// Points the dropper at a different drop point.
    pub fn set_drop_point(&mut self, drop_point: Option<NodeId>) {
        self.drop_point = drop_point;
    }

    /// Current release height above the drop point.
    #[must_use]
    pub const fn drop_height(&self) -> f32 {
        self.drop_height
    }

    /// Sets the release height, clamped to at least [`MIN_DROP_HEIGHT`].
    pub fn set_drop_height(&mut self, height: f32) {
        self.drop_height = if height.is_nan() {
            MIN_DROP_HEIGHT
        } else {
            height.max(MIN_DROP_HEIGHT)
        };
        info!("drop height set to {}m", self.drop_height);
    }

    /// Whether a template is registered for `kind`.
    #[must_use]
    pub fn knows(&self, kind: &str) -> bool {
        self.templates.contains_key(kind)
    }
}

impl LoadInjector for LoadDropper {
    fn drop_load(
        &mut self,
        scene: &mut SceneGraph,
        kind: &str,
        height_override: Option<f32>,
    ) -> Option<LoadHandle> {
        let Some(template) = self.templates.get(kind) else {
            warn!("no load template registered for kind {kind:?}");
            return None;
        };
        let Some(drop_pose) = self.drop_point.and_then(|p| scene.world_pose(p)) else {
            warn!("load dropper has no live drop point");
            return None;
        };

        let height = height_override.unwrap_or(self.drop_height);
        let mut spawn = drop_pose.translation;
        spawn.y += height;

        let parent = self.drop_point.and_then(|p| scene.parent(p));
        let node = scene.instantiate(template, parent);
        scene.set_world_pose(node, Pose::from_translation(spawn));
        scene.set_active(node, true);

        info!("dropped {kind} load from {height}m");
        Some(LoadHandle {
            node,
            kind: kind.to_owned(),
        })
    }
}
