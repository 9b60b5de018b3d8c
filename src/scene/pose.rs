//! Rigid poses (translation plus orientation) and their composition.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of a node, without scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in the parent's (or the world's) frame.
    pub translation: Vec3,
    /// Orientation in the parent's (or the world's) frame.
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// The pose that leaves every point where it is.
    pub const IDENTITY: Self = Self::new(Vec3::ZERO, Quat::IDENTITY);

    /// Creates a pose from its parts.
    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Creates an unrotated pose at `translation`.
    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::IDENTITY)
    }

    /// Creates an unrotated pose at `(x, y, z)`.
    #[must_use]
    pub const fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_translation(Vec3::new(x, y, z))
    }

    /// Returns this pose with `rotation` replaced.
    #[must_use]
    pub const fn with_rotation(self, rotation: Quat) -> Self {
        Self::new(self.translation, rotation)
    }

    /// Expresses `child`, given relative to `self`, in `self`'s parent frame.
    ///
    /// # Examples
    ///
    /// ```
    /// use glam::{Quat, Vec3};
    /// use trestle::scene::Pose;
    ///
    /// let parent = Pose::new(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
    /// let child = Pose::from_xyz(0.0, 0.0, 1.0);
    /// let world = parent.mul_pose(child);
    /// assert!(world.translation.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
    /// ```
    #[must_use]
    pub fn mul_pose(self, child: Self) -> Self {
        Self {
            translation: self.translation + self.rotation * child.translation,
            rotation: (self.rotation * child.rotation).normalize(),
        }
    }

    /// The pose that undoes `self`.
    #[must_use]
    pub fn inverse(self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            translation: rotation * -self.translation,
            rotation,
        }
    }

    /// Compares two poses component-wise within `max_abs_diff`.
    ///
    /// Orientations `q` and `-q` describe the same rotation and compare equal.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.translation
            .abs_diff_eq(other.translation, max_abs_diff)
            && (self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
                || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff))
    }

    /// Height of the pose along the vertical axis.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.translation.y
    }
}
