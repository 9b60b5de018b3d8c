//! Grab-and-follow placement of individual build pieces.
//!
//! A [`GrabbableBlock`] is idle until the grab button goes down while the
//! pointer ray rests on its piece. From then on the piece is pinned to the
//! cursor's follow target every update until the button is released. Release
//! is inferred from the stored pressed state of the previous update; a
//! controller that stops reporting button data drops the piece.

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::scene::{NodeId, Pose, SceneGraph};
use crate::GRAB_BUTTON_INDEX;

/// Button state reported by the grabbing controller.
pub trait GrabInput {
    /// Whether `button` is held, or `None` when the device reports no data
    /// for it.
    fn button_pressed(&self, button: usize) -> Option<bool>;
}

/// Everything the pointer provides when the grab button goes down.
#[derive(Clone, Copy, Default)]
pub struct Cursor<'a> {
    /// Node the pointer ray currently hits.
    pub hit: Option<NodeId>,
    /// Node whose world pose the grabbed piece follows.
    pub follow_target: Option<NodeId>,
    /// Controller whose buttons drive the grab.
    pub input: Option<&'a dyn GrabInput>,
}

/// Why a press did not start a grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// The pointer ray is not on this piece.
    #[error("pointer is not on the piece")]
    NotTargeted,
    /// The cursor has no follow target to pin the piece to.
    #[error("cursor has no follow target")]
    MissingFollowTarget,
    /// The pressing controller exposes no input device.
    #[error("controller has no input device")]
    MissingInput,
    /// The piece no longer exists.
    #[error("piece {0:?} no longer exists")]
    PieceGone(NodeId),
}

/// Whether a piece is being carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GrabState {
    /// Resting where it was last left.
    #[default]
    Idle,
    /// Following the cursor.
    Grabbed,
}

/// Result of one [`GrabbableBlock::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrabUpdate {
    /// Nothing is grabbed.
    Idle,
    /// The piece was moved to the follow target's pose.
    Following(Pose),
    /// The button was released; the piece stays where it is.
    Released,
    /// The controller stopped reporting the grab button.
    InputLost,
    /// The follow target disappeared.
    TargetLost,
}

/// Placement state machine for one build piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabbableBlock {
    piece: NodeId,
    state: GrabState,
    follow: Option<NodeId>,
    was_pressed: bool,
}

impl GrabbableBlock {
    /// An idle block controlling `piece`.
    #[must_use]
    pub const fn new(piece: NodeId) -> Self {
        Self {
            piece,
            state: GrabState::Idle,
            follow: None,
            was_pressed: false,
        }
    }

    /// The piece this block moves.
    #[must_use]
    pub const fn piece(&self) -> NodeId {
        self.piece
    }

    /// Current grab state.
    #[must_use]
    pub const fn state(&self) -> GrabState {
        self.state
    }

    /// Node being followed while grabbed.
    #[must_use]
    pub const fn follow_target(&self) -> Option<NodeId> {
        self.follow
    }

    /// Handles the grab button going down.
    ///
    /// On success the piece snaps to the follow target at once.
    ///
    /// # Errors
    ///
    /// Returns a [`PlacementError`] and stays idle when the pointer is not on
    /// the piece or the cursor lacks a follow target or input device.
    pub fn press(&mut self, scene: &mut SceneGraph, cursor: Cursor<'_>) -> Result<(), PlacementError> {
        if cursor.hit != Some(self.piece) {
            return Err(PlacementError::NotTargeted);
        }
        if !scene.is_alive(self.piece) {
            return Err(PlacementError::PieceGone(self.piece));
        }
        let (follow, target) = cursor
            .follow_target
            .and_then(|f| scene.world_pose(f).map(|pose| (f, pose)))
            .ok_or(PlacementError::MissingFollowTarget)
            .inspect_err(|_| warn!("cannot grab {:?}: cursor has no follow target", self.piece))?;
        if cursor.input.is_none() {
            warn!("cannot grab {:?}: controller has no input device", self.piece);
            return Err(PlacementError::MissingInput);
        }

        self.state = GrabState::Grabbed;
        self.follow = Some(follow);
        self.was_pressed = true;
        scene.set_world_pose(self.piece, target);
        info!("grabbed {:?}, following {follow:?}", self.piece);
        Ok(())
    }

    /// Advances the grab by one frame using `input`'s current button state.
    pub fn update(&mut self, scene: &mut SceneGraph, input: Option<&dyn GrabInput>) -> GrabUpdate {
        if self.state != GrabState::Grabbed {
            return GrabUpdate::Idle;
        }

        let Some(pressed) = input.and_then(|i| i.button_pressed(GRAB_BUTTON_INDEX)) else {
            warn!("lost grab input for {:?}; dropping it", self.piece);
            self.release();
            return GrabUpdate::InputLost;
        };
        if !pressed && self.was_pressed {
            info!("dropped {:?}", self.piece);
            self.release();
            return GrabUpdate::Released;
        }
        self.was_pressed = pressed;

        let Some(target) = self.follow.and_then(|f| scene.world_pose(f)) else {
            self.release();
            return GrabUpdate::TargetLost;
        };
        if !scene.set_world_pose(self.piece, target) {
            self.release();
            return GrabUpdate::TargetLost;
        }
        GrabUpdate::Following(target)
    }

    fn release(&mut self) {
        self.state = GrabState::Idle;
        self.follow = None;
        self.was_pressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::POSE_TOLERANCE;
    use glam::{Quat, Vec3};
    use rstest::{fixture, rstest};
    use std::cell::Cell;

    struct Trigger(Cell<Option<bool>>);

    impl Trigger {
        fn held() -> Self {
            Self(Cell::new(Some(true)))
        }

        fn set(&self, state: Option<bool>) {
            self.0.set(state);
        }
    }

    impl GrabInput for Trigger {
        fn button_pressed(&self, button: usize) -> Option<bool> {
            if button == GRAB_BUTTON_INDEX {
                self.0.get()
            } else {
                None
            }
        }
    }

    struct Rig {
        scene: SceneGraph,
        piece: NodeId,
        hit_point: NodeId,
    }

    #[fixture]
    fn rig() -> Rig {
        let mut scene = SceneGraph::new();
        let piece = scene.spawn("Beam_Build", None);
        let hit_point = scene.spawn("CursorHit", None);
        scene.set_world_pose(
            hit_point,
            Pose::new(Vec3::new(2.0, 1.0, -1.0), Quat::from_rotation_y(0.5)),
        );
        Rig {
            scene,
            piece,
            hit_point,
        }
    }

    fn cursor<'a>(rig: &Rig, input: &'a Trigger) -> Cursor<'a> {
        Cursor {
            hit: Some(rig.piece),
            follow_target: Some(rig.hit_point),
            input: Some(input),
        }
    }

    #[rstest]
    fn press_snaps_to_target(mut rig: Rig) {
        let trigger = Trigger::held();
        let mut block = GrabbableBlock::new(rig.piece);
        let c = cursor(&rig, &trigger);
        block.press(&mut rig.scene, c).expect("grab starts");

        assert_eq!(block.state(), GrabState::Grabbed);
        let target = rig.scene.world_pose(rig.hit_point).expect("alive");
        let piece = rig.scene.world_pose(rig.piece).expect("alive");
        assert!(piece.abs_diff_eq(&target, POSE_TOLERANCE));
    }

    #[rstest]
    fn follows_while_held_and_drops_on_release(mut rig: Rig) {
        let trigger = Trigger::held();
        let mut block = GrabbableBlock::new(rig.piece);
        let c = cursor(&rig, &trigger);
        block.press(&mut rig.scene, c).expect("grab starts");

        let moved = Pose::from_xyz(-3.0, 4.0, 0.5);
        rig.scene.set_world_pose(rig.hit_point, moved);
        assert_eq!(
            block.update(&mut rig.scene, Some(&trigger)),
            GrabUpdate::Following(moved)
        );

        trigger.set(Some(false));
        assert_eq!(block.update(&mut rig.scene, Some(&trigger)), GrabUpdate::Released);
        assert_eq!(block.state(), GrabState::Idle);

        rig.scene
            .set_world_pose(rig.hit_point, Pose::from_xyz(9.0, 9.0, 9.0));
        assert_eq!(block.update(&mut rig.scene, Some(&trigger)), GrabUpdate::Idle);
        let rest = rig.scene.world_pose(rig.piece).expect("alive");
        assert!(rest.abs_diff_eq(&moved, POSE_TOLERANCE));
    }

    #[rstest]
    fn missing_button_data_drops(mut rig: Rig) {
        let trigger = Trigger::held();
        let mut block = GrabbableBlock::new(rig.piece);
        let c = cursor(&rig, &trigger);
        block.press(&mut rig.scene, c).expect("grab starts");

        trigger.set(None);
        assert_eq!(block.update(&mut rig.scene, Some(&trigger)), GrabUpdate::InputLost);
        assert_eq!(block.state(), GrabState::Idle);
    }

    #[rstest]
    fn missing_device_drops(mut rig: Rig) {
        let trigger = Trigger::held();
        let mut block = GrabbableBlock::new(rig.piece);
        let c = cursor(&rig, &trigger);
        block.press(&mut rig.scene, c).expect("grab starts");

        assert_eq!(block.update(&mut rig.scene, None), GrabUpdate::InputLost);
        assert_eq!(block.follow_target(), None);
    }

    #[rstest]
    fn vanished_target_drops(mut rig: Rig) {
        let trigger = Trigger::held();
        let mut block = GrabbableBlock::new(rig.piece);
        let c = cursor(&rig, &trigger);
        block.press(&mut rig.scene, c).expect("grab starts");

        rig.scene.destroy(rig.hit_point);
        assert_eq!(block.update(&mut rig.scene, Some(&trigger)), GrabUpdate::TargetLost);
    }

    #[rstest]
    fn press_requires_pointer_target_and_device(mut rig: Rig) {
        let trigger = Trigger::held();
        let mut block = GrabbableBlock::new(rig.piece);

        let elsewhere = Cursor {
            hit: Some(rig.hit_point),
            ..cursor(&rig, &trigger)
        };
        assert_eq!(
            block.press(&mut rig.scene, elsewhere),
            Err(PlacementError::NotTargeted)
        );

        let no_target = Cursor {
            follow_target: None,
            ..cursor(&rig, &trigger)
        };
        assert_eq!(
            block.press(&mut rig.scene, no_target),
            Err(PlacementError::MissingFollowTarget)
        );

        let no_input = Cursor {
            input: None,
            ..cursor(&rig, &trigger)
        };
        assert_eq!(
            block.press(&mut rig.scene, no_input),
            Err(PlacementError::MissingInput)
        );
        assert_eq!(block.state(), GrabState::Idle);
    }
}
