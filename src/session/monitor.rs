//! Per-tick structural integrity survey.

use serde::Serialize;

use crate::scene::{NodeId, Pose, SceneGraph};

/// Standing/fallen counts for the structure root's children on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IntegritySurvey {
    /// Pieces above the collapse height.
    pub standing: usize,
    /// Pieces at or below the collapse height.
    pub fallen: usize,
}

impl IntegritySurvey {
    /// Whether nothing is left standing.
    #[must_use]
    pub const fn is_collapsed(&self) -> bool {
        self.standing == 0
    }
}

/// Whether a piece at `pose` is still standing.
#[must_use]
pub fn is_standing(pose: &Pose, collapse_height: f32) -> bool {
    pose.height() > collapse_height
}

/// Counts standing and fallen children of `root`.
///
/// Children the physics layer destroyed since the list was read are ignored.
#[must_use]
pub fn survey(scene: &SceneGraph, root: NodeId, collapse_height: f32) -> IntegritySurvey {
    scene
        .children(root)
        .iter()
        .filter_map(|child| scene.world_pose(*child))
        .fold(IntegritySurvey::default(), |mut acc, pose| {
            if is_standing(&pose, collapse_height) {
                acc.standing += 1;
            } else {
                acc.fallen += 1;
            }
            acc
        })
}
