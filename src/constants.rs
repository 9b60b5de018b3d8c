//! Tuning constants shared by the build and test phases.
//!
//! Distances are expressed in scene units with `y` as the vertical axis.

use glam::Vec3;

/// Vertical coordinate at or below which a piece no longer counts as standing.
pub const COLLAPSE_HEIGHT: f32 = -5.0;
/// Seconds the physics layer is given to settle before the load is dropped.
pub const DEFAULT_SETTLE_DELAY_SECS: f32 = 0.3;
/// Seconds a loaded structure is watched before it is graded.
pub const DEFAULT_MONITOR_WINDOW_SECS: f32 = 8.0;
/// Load kind used when a caller does not name one.
pub const DEFAULT_LOAD_KIND: &str = "car";
/// Load kinds the stock [`LoadDropper`](crate::load::LoadDropper) understands.
pub const STANDARD_LOAD_KINDS: [&str; 4] = ["passenger", "car", "truck", "plane"];
/// Height above the drop point at which loads are released.
pub const DEFAULT_DROP_HEIGHT: f32 = 3.0;
/// Lowest drop height accepted by [`LoadDropper::set_drop_height`](crate::load::LoadDropper::set_drop_height).
pub const MIN_DROP_HEIGHT: f32 = 0.5;
/// Controller button used to grab build pieces.
pub const GRAB_BUTTON_INDEX: usize = 0;
/// Local position under the structure root used when no ghost is showing.
pub const DEFAULT_PLACEMENT_POSITION: Vec3 = Vec3::new(0.0, 2.0, 0.0);
/// Lower bound applied when a body's mass is derived from its material.
pub const MIN_PIECE_MASS: f32 = 0.001;
/// Material selected before the user picks one.
pub const DEFAULT_MATERIAL: &str = "concrete";
/// Breakdown bucket for pieces that carry no component type.
pub const UNKNOWN_COMPONENT_TYPE: &str = "Unknown";
/// Per-component tolerance used when comparing poses.
pub const POSE_TOLERANCE: f32 = 1e-4;
