//! Swaps build pieces for their physics-enabled counterparts.
//!
//! Each snapshot entry is handled on its own: capture the world pose, clone
//! the runtime template under the structure root, restore the pose, carry the
//! tags forward, activate, and only then destroy the build piece. Pieces
//! without a build index and pieces whose prefab has no runtime variant stay
//! where they are as static structure.

use log::debug;
use serde::Serialize;

use crate::registry::PieceRegistry;
use crate::scene::{BuildIndex, NodeId, SceneGraph};

/// One build piece and the runtime piece that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Replacement {
    /// Build piece that was destroyed.
    pub original: NodeId,
    /// Runtime piece created in its place.
    pub replacement: NodeId,
    /// Prefab both pieces were made from.
    pub build_index: BuildIndex,
}

/// Summary of a replacement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplacementReport {
    /// Swaps performed, in snapshot order.
    pub replaced: Vec<Replacement>,
    /// Pieces whose prefab has no runtime variant.
    pub missing_template: Vec<NodeId>,
    /// Pieces with no build index, left as permanent structure.
    pub untagged: Vec<NodeId>,
    /// Snapshot entries that were already gone when their turn came.
    pub vanished: usize,
}

impl ReplacementReport {
    /// Number of pieces swapped for runtime variants.
    #[must_use]
    pub fn replaced_count(&self) -> usize {
        self.replaced.len()
    }

    /// The build piece a runtime piece was created from.
    #[must_use]
    pub fn original_of(&self, replacement: NodeId) -> Option<NodeId> {
        self.replaced
            .iter()
            .find(|r| r.replacement == replacement)
            .map(|r| r.original)
    }
}

enum Swap {
    Replaced(Replacement),
    MissingTemplate,
    Untagged,
    Vanished,
}

/// Replaces every registered piece in `snapshot` under `root`.
///
/// The pass runs to completion before returning; callers never observe a
/// partially swapped structure.
pub fn replace_structure(
    scene: &mut SceneGraph,
    root: NodeId,
    snapshot: &[NodeId],
    registry: &dyn PieceRegistry,
) -> ReplacementReport {
    let mut report = ReplacementReport::default();
    for &piece in snapshot {
        match replace_piece(scene, root, piece, registry) {
            Swap::Replaced(swap) => report.replaced.push(swap),
            Swap::MissingTemplate => report.missing_template.push(piece),
            Swap::Untagged => report.untagged.push(piece),
            Swap::Vanished => report.vanished += 1,
        }
    }
    report
}

fn replace_piece(
    scene: &mut SceneGraph,
    root: NodeId,
    piece: NodeId,
    registry: &dyn PieceRegistry,
) -> Swap {
    let (Some(tags), Some(pose)) = (scene.tags(piece).cloned(), scene.world_pose(piece)) else {
        return Swap::Vanished;
    };
    let Some(build_index) = tags.build_index() else {
        return Swap::Untagged;
    };
    let Some(template) = registry.runtime_template(build_index) else {
        debug!("no runtime variant for {build_index:?}; keeping {piece:?} static");
        return Swap::MissingTemplate;
    };

    let replacement = scene.instantiate(&template, Some(root));
    scene.set_world_pose(replacement, pose);
    scene.set_tags(replacement, tags);
    scene.set_active(replacement, true);
    scene.destroy(piece);

    debug!("replaced {piece:?} with {replacement:?} ({build_index:?})");
    Swap::Replaced(Replacement {
        original: piece,
        replacement,
        build_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Prefab, PrefabCatalog};
    use crate::scene::{Body, BodyKind, NodeTemplate, PieceTags, Pose};
    use crate::POSE_TOLERANCE;
    use glam::{Quat, Vec3};
    use mockall::mock;
    use rstest::{fixture, rstest};

    mock! {
        Registry {}
        impl PieceRegistry for Registry {
            fn runtime_template(&self, build_index: BuildIndex) -> Option<NodeTemplate>;
        }
    }

    struct Bridge {
        scene: SceneGraph,
        root: NodeId,
        catalog: PrefabCatalog,
    }

    #[fixture]
    fn bridge() -> Bridge {
        let mut catalog = PrefabCatalog::new();
        catalog.register(Prefab::new(
            "Beam",
            NodeTemplate::new("Beam_Build").with_body(Body::fixed()),
            Some(NodeTemplate::new("Beam_Runtime").with_body(Body::dynamic(80.0))),
        ));
        catalog.register(Prefab::new("Rail", NodeTemplate::new("Rail_Build"), None));

        let mut scene = SceneGraph::new();
        let root = scene.spawn("BridgeRoot", None);
        scene.set_local_pose(root, Pose::from_xyz(0.0, 0.5, 0.0));
        Bridge {
            scene,
            root,
            catalog,
        }
    }

    fn place(bridge: &mut Bridge, index: u32, x: f32) -> NodeId {
        let pose = Pose::new(Vec3::new(x, 1.0, 0.0), Quat::from_rotation_z(x * 0.1));
        bridge
            .catalog
            .spawn_build(&mut bridge.scene, BuildIndex(index), Some(bridge.root), pose)
            .expect("prefab is registered")
    }

    #[rstest]
    fn replacement_preserves_world_pose_and_tags(mut bridge: Bridge) {
        let pieces: Vec<_> = (0..4).map(|i| place(&mut bridge, 0, i as f32)).collect();
        let poses: Vec<_> = pieces
            .iter()
            .map(|p| bridge.scene.world_pose(*p).expect("alive"))
            .collect();

        let report = replace_structure(&mut bridge.scene, bridge.root, &pieces, &bridge.catalog);

        assert_eq!(report.replaced_count(), 4);
        assert_eq!(bridge.scene.child_count(bridge.root), 4);
        for (swap, before) in report.replaced.iter().zip(&poses) {
            assert!(!bridge.scene.is_alive(swap.original));
            let after = bridge.scene.world_pose(swap.replacement).expect("alive");
            assert!(after.abs_diff_eq(before, POSE_TOLERANCE));
            let tags = bridge.scene.tags(swap.replacement).expect("alive");
            assert_eq!(tags.build_index(), Some(BuildIndex(0)));
            assert_eq!(tags.component_type(), Some("Beam"));
            assert!(bridge.scene.is_active(swap.replacement));
            assert_eq!(
                bridge.scene.body(swap.replacement).map(|b| b.kind),
                Some(BodyKind::Dynamic)
            );
        }
    }

    #[rstest]
    fn every_runtime_piece_traces_to_one_original(mut bridge: Bridge) {
        let pieces: Vec<_> = (0..5).map(|i| place(&mut bridge, 0, i as f32)).collect();
        let report = replace_structure(&mut bridge.scene, bridge.root, &pieces, &bridge.catalog);

        let mut originals: Vec<_> = bridge
            .scene
            .children(bridge.root)
            .iter()
            .filter_map(|c| report.original_of(*c))
            .collect();
        originals.sort();
        let mut expected = pieces.clone();
        expected.sort();
        assert_eq!(originals, expected);
    }

    #[rstest]
    fn unregistered_and_untagged_pieces_stay(mut bridge: Bridge) {
        let beam = place(&mut bridge, 0, 0.0);
        let rail = place(&mut bridge, 1, 1.0);
        let anchor = bridge.scene.spawn("Anchor", Some(bridge.root));
        bridge.scene.set_tags(anchor, PieceTags::fixture("Anchor"));

        let report = replace_structure(
            &mut bridge.scene,
            bridge.root,
            &[beam, rail, anchor],
            &bridge.catalog,
        );

        assert_eq!(report.replaced_count(), 1);
        assert_eq!(report.missing_template, vec![rail]);
        assert_eq!(report.untagged, vec![anchor]);
        assert!(bridge.scene.is_alive(rail));
        assert!(bridge.scene.is_alive(anchor));
        assert_eq!(bridge.scene.child_count(bridge.root), 3);
    }

    #[rstest]
    fn vanished_pieces_are_skipped(mut bridge: Bridge) {
        let beam = place(&mut bridge, 0, 0.0);
        let doomed = place(&mut bridge, 0, 1.0);
        bridge.scene.destroy(doomed);

        let report =
            replace_structure(&mut bridge.scene, bridge.root, &[beam, doomed], &bridge.catalog);

        assert_eq!(report.replaced_count(), 1);
        assert_eq!(report.vanished, 1);
    }

    #[rstest]
    fn registry_is_consulted_once_per_tagged_piece(mut bridge: Bridge) {
        let pieces: Vec<_> = (0..3).map(|i| place(&mut bridge, 0, i as f32)).collect();
        let mut registry = MockRegistry::new();
        registry
            .expect_runtime_template()
            .times(3)
            .returning(|_| Some(NodeTemplate::new("Stub_Runtime")));

        let report = replace_structure(&mut bridge.scene, bridge.root, &pieces, &registry);
        assert_eq!(report.replaced_count(), 3);
    }
}
