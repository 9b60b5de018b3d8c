#![cfg_attr(docsrs, feature(doc_cfg))]
//! Library crate for assembling a structure from build pieces and testing how
//! it holds up under a load.
//!
//! Build pieces live in a [`SceneGraph`] under a structure root. When a test
//! starts, the [`TestOrchestrator`] swaps every registered piece for its
//! physics-enabled counterpart, waits for the structure to settle, drops a
//! load on it and grades how much of it is still standing.
pub mod constants;
pub mod load;
pub mod logging;
pub mod material;
pub mod numeric;
pub mod placement;
pub mod plugin;
pub mod registry;
pub mod scene;
pub mod session;
pub mod workbench;
pub use constants::*;

// Re-export commonly used items
pub use load::{LoadDropper, LoadHandle, LoadInjector};
pub use logging::init as init_logging;
pub use material::{MaterialCatalog, MaterialSettings};
pub use placement::{Cursor, GrabInput, GrabState, GrabUpdate, GrabbableBlock, PlacementError};
pub use plugin::{
    tick_test_bench, LastTestOutcome, StartStructureTest, StopStructureTest,
    StructureTestCompleted, TestBench, TestBenchError, TestBenchErrorContext, TestBenchPlugin,
    TestBenchStatus,
};
pub use registry::{PieceRegistry, Prefab, PrefabCatalog};
pub use scene::{Body, BodyKind, BuildIndex, NodeId, NodeTemplate, PieceTags, Pose, SceneGraph};
pub use session::{
    FailureRescan, SessionConfig, SessionError, SessionPhase, SessionStatus, SurvivalTier,
    TestOrchestrator, TestOutcome,
};
pub use workbench::{Workbench, WorkbenchError};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use trestle::prelude::*;
    //! ```

    pub use crate::LoadDropper;
    pub use crate::PrefabCatalog;
    pub use crate::SceneGraph;
    pub use crate::SessionConfig;
    pub use crate::SurvivalTier;
    pub use crate::TestBenchPlugin;
    pub use crate::TestOrchestrator;
    pub use crate::{NodeTemplate, Pose, Prefab};
}
