//! Builder for a small bridge structure ready to be tested.

use std::sync::Arc;

use trestle::{
    Body, BuildIndex, NodeId, NodeTemplate, PieceTags, Pose, Prefab, PrefabCatalog, SceneGraph,
    SessionConfig, TestOrchestrator,
};

use crate::collaborators::{InjectionLog, RecordingInjector};

/// Build index of the prefab with a runtime variant.
pub const BEAM: BuildIndex = BuildIndex(0);
/// Build index of the prefab without a runtime variant.
pub const RAIL: BuildIndex = BuildIndex(1);

/// Catalogue with a replaceable `Beam` and a static-only `Rail`.
pub fn prefabs() -> PrefabCatalog {
    let mut catalog = PrefabCatalog::new();
    catalog.register(Prefab::new(
        "Beam",
        NodeTemplate::new("Beam_Build").with_body(Body::fixed().with_volume(0.2)),
        Some(NodeTemplate::new("Beam_Runtime").with_body(Body::dynamic(480.0).with_volume(0.2))),
    ));
    catalog.register(Prefab::new("Rail", NodeTemplate::new("Rail_Build"), None));
    catalog
}

/// Describes the bridge to build.
///
/// # Examples
/// ```
/// use test_utils::BridgeBuilder;
/// let bridge = BridgeBuilder::new().registered(3).unregistered(1).build();
/// assert_eq!(bridge.scene.child_count(bridge.root), 4);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeBuilder {
    registered: u16,
    unregistered: u16,
    anchors: u16,
}

impl BridgeBuilder {
    /// An empty bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` beams that have runtime variants.
    pub fn registered(mut self, count: u16) -> Self {
        self.registered = count;
        self
    }

    /// Adds `count` rails with no runtime variant.
    pub fn unregistered(mut self, count: u16) -> Self {
        self.unregistered = count;
        self
    }

    /// Adds `count` untagged anchors.
    pub fn anchors(mut self, count: u16) -> Self {
        self.anchors = count;
        self
    }

    /// Spawns the bridge: beams first, then rails, then anchors, one unit
    /// apart along `x` at `y = 1`.
    pub fn build(self) -> Bridge {
        let prefabs = Arc::new(prefabs());
        let mut scene = SceneGraph::new();
        let root = scene.spawn("BridgeRoot", None);
        let drop_point = scene.spawn("DropPoint", None);
        scene.set_local_pose(drop_point, Pose::from_xyz(0.0, 2.0, 0.0));

        let kinds = std::iter::repeat(Some(BEAM))
            .take(usize::from(self.registered))
            .chain(std::iter::repeat(Some(RAIL)).take(usize::from(self.unregistered)))
            .chain(std::iter::repeat(None).take(usize::from(self.anchors)));
        let mut pieces = Vec::new();
        for (x, kind) in (0_u16..).zip(kinds) {
            let pose = Pose::from_xyz(f32::from(x), 1.0, 0.0);
            let piece = match kind {
                Some(index) => prefabs
                    .spawn_build(&mut scene, index, Some(root), pose)
                    .expect("bridge prefabs are registered"),
                None => {
                    let anchor = scene.spawn("Anchor", Some(root));
                    scene.set_local_pose(anchor, pose);
                    scene.set_tags(anchor, PieceTags::fixture("Anchor"));
                    anchor
                }
            };
            pieces.push(piece);
        }

        Bridge {
            scene,
            root,
            drop_point,
            pieces,
            prefabs,
        }
    }
}

/// A built bridge and the handles tests need.
#[derive(Debug, Clone)]
pub struct Bridge {
    /// Scene holding the bridge.
    pub scene: SceneGraph,
    /// Structure root whose children are the pieces.
    pub root: NodeId,
    /// Node loads are dropped above.
    pub drop_point: NodeId,
    /// Build pieces in placement order.
    pub pieces: Vec<NodeId>,
    /// Catalogue the pieces were spawned from.
    pub prefabs: Arc<PrefabCatalog>,
}

impl Bridge {
    /// An orchestrator wired to this bridge with a recording injector.
    pub fn orchestrator(&self, config: SessionConfig) -> (TestOrchestrator, InjectionLog) {
        let injector = RecordingInjector::new(self.drop_point);
        let log = injector.log();
        let mut orchestrator = TestOrchestrator::new(config)
            .with_registry(Arc::clone(&self.prefabs))
            .with_injector(injector);
        orchestrator.set_structure_root(self.root);
        (orchestrator, log)
    }

    /// Moves the first `count` children of the root to `height`.
    pub fn drop_children_to(&mut self, count: usize, height: f32) {
        let children: Vec<_> = self.scene.children(self.root).iter().copied().take(count).collect();
        for child in children {
            self.scene.set_world_pose(child, Pose::from_xyz(0.0, height, 0.0));
        }
    }

    /// Destroys the first `count` children of the root.
    pub fn break_children(&mut self, count: usize) {
        let children: Vec<_> = self.scene.children(self.root).iter().copied().take(count).collect();
        for child in children {
            self.scene.destroy(child);
        }
    }
}
