//! Identity metadata carried by structure pieces.

use serde::{Deserialize, Serialize};

/// Index of the prefab a build piece was placed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildIndex(pub u32);

impl From<u32> for BuildIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl BuildIndex {
    /// Returns the raw prefab index.
    #[must_use]
    pub const fn into_inner(self) -> u32 {
        self.0
    }
}

/// Metadata that lets a piece be classified by its original type.
///
/// The build index is fixed when the tags are created; replacement copies the
/// whole record forward so runtime pieces still report where they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceTags {
    build_index: Option<BuildIndex>,
    component_type: Option<String>,
    material: Option<String>,
    ghost: bool,
}

impl PieceTags {
    /// Tags for a piece placed from prefab `build_index`.
    #[must_use]
    pub fn build_piece(build_index: BuildIndex, component_type: impl Into<String>) -> Self {
        Self {
            build_index: Some(build_index),
            component_type: Some(component_type.into()),
            ..Self::default()
        }
    }

    /// Tags for permanent structure such as anchors; never replaced.
    #[must_use]
    pub fn fixture(component_type: impl Into<String>) -> Self {
        Self {
            component_type: Some(component_type.into()),
            ..Self::default()
        }
    }

    /// Prefab index, if the piece was placed from one.
    #[must_use]
    pub const fn build_index(&self) -> Option<BuildIndex> {
        self.build_index
    }

    /// Human-readable piece category such as `"Beam"`.
    #[must_use]
    pub fn component_type(&self) -> Option<&str> {
        self.component_type.as_deref()
    }

    /// Name of the material last applied to the piece.
    #[must_use]
    pub fn material(&self) -> Option<&str> {
        self.material.as_deref()
    }

    /// Whether the piece is a translucent placement preview.
    #[must_use]
    pub const fn is_ghost(&self) -> bool {
        self.ghost
    }

    /// Records the material applied to the piece.
    pub fn set_material(&mut self, material: impl Into<String>, ghost: bool) {
        self.material = Some(material.into());
        self.ghost = ghost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn build_piece_carries_index_and_type() {
        let tags = PieceTags::build_piece(BuildIndex(3), "Deck");
        assert_eq!(tags.build_index(), Some(BuildIndex(3)));
        assert_eq!(tags.component_type(), Some("Deck"));
        assert!(tags.material().is_none());
    }

    #[rstest]
    fn material_stamp_keeps_build_index() {
        let mut tags = PieceTags::build_piece(BuildIndex(1), "Beam");
        tags.set_material("steel", true);
        assert_eq!(tags.build_index(), Some(BuildIndex(1)));
        assert_eq!(tags.material(), Some("steel"));
        assert!(tags.is_ghost());
    }

    #[rstest]
    fn fixture_has_no_build_index() {
        assert!(PieceTags::fixture("Anchor").build_index().is_none());
    }
}
