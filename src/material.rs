//! Material presets and their application to placed pieces.

use hashbrown::HashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::scene::{depth_first, NodeId, SceneGraph};
use crate::{DEFAULT_MATERIAL, MIN_PIECE_MASS};

/// Colour and structural properties of one material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialSettings {
    /// Linear RGBA base colour.
    pub color: [f32; 4],
    /// Density in kg/m³.
    pub density: f32,
    /// Load the material can carry before failing.
    pub capacity: f32,
}

const CONCRETE: MaterialSettings = MaterialSettings {
    color: [0.5, 0.5, 0.5, 1.0],
    density: 2400.0,
    capacity: 200_000.0,
};
const STEEL: MaterialSettings = MaterialSettings {
    color: [0.7, 0.7, 0.8, 1.0],
    density: 7850.0,
    capacity: 800_000.0,
};
const TIMBER: MaterialSettings = MaterialSettings {
    color: [0.6, 0.4, 0.2, 1.0],
    density: 600.0,
    capacity: 60_000.0,
};
const GHOST_ALPHA: f32 = 0.3;

/// Name of the translucent preview variant of `base`, e.g. `ghostSteel`.
#[must_use]
pub fn ghost_name(base: &str) -> String {
    let mut chars = base.chars();
    chars.next().map_or_else(
        || "ghost".to_owned(),
        |first| format!("ghost{}{}", first.to_uppercase(), chars.as_str()),
    )
}

/// Named material presets plus the user's current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialCatalog {
    settings: HashMap<String, MaterialSettings>,
    selected: String,
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        for (name, settings) in [("concrete", CONCRETE), ("steel", STEEL), ("timber", TIMBER)] {
            catalog.insert(name, settings);
        }
        for (name, base) in [("concrete", CONCRETE), ("steel", STEEL)] {
            let mut ghost = base;
            ghost.color[3] = GHOST_ALPHA;
            catalog.insert(&ghost_name(name), ghost);
        }
        catalog
    }
}

impl MaterialCatalog {
    /// A catalogue with no presets and the default selection.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            settings: HashMap::new(),
            selected: DEFAULT_MATERIAL.to_owned(),
        }
    }

    /// Adds or replaces the preset called `name`.
    pub fn insert(&mut self, name: &str, settings: MaterialSettings) {
        self.settings.insert(name.to_owned(), settings);
    }

    /// Preset called `name`, if registered.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MaterialSettings> {
        self.settings.get(name)
    }

    /// Material applied when no name is given.
    #[must_use]
    pub fn selected(&self) -> &str {
        &self.selected
    }

    /// Makes `name` the current selection; an empty name is ignored.
    pub fn select(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        name.clone_into(&mut self.selected);
        info!("material selected: {name}");
    }

    /// Settings for `base`, using its ghost variant when asked.
    ///
    /// Falls back to the base preset when there is no ghost variant, then to
    /// concrete.
    #[must_use]
    pub fn resolve(&self, base: &str, ghost: bool) -> Option<MaterialSettings> {
        let variant = ghost
            .then(|| self.settings.get(&ghost_name(base)))
            .flatten();
        variant
            .or_else(|| self.settings.get(base))
            .or_else(|| self.settings.get(DEFAULT_MATERIAL))
            .copied()
    }

    /// Applies material `name` (or the current selection) to the subtree at
    /// `root`.
    ///
    /// Every node in the subtree is recoloured. The root's tags record the
    /// base material name, and its body takes the material's density and
    /// capacity, with mass recomputed from the body's estimated volume when
    /// it has one. Returns the settings applied.
    pub fn apply_to_instance(
        &self,
        scene: &mut SceneGraph,
        root: NodeId,
        name: Option<&str>,
        ghost: bool,
    ) -> Option<MaterialSettings> {
        if !scene.is_alive(root) {
            return None;
        }
        let base = name.filter(|n| !n.is_empty()).unwrap_or(self.selected.as_str());
        let Some(settings) = self.resolve(base, ghost) else {
            warn!("no material preset for {base:?}");
            return None;
        };
        debug!("applying {base} (ghost: {ghost}) to {root:?}");

        for node in depth_first(&*scene, root) {
            scene.set_color(node, settings.color);
        }
        if let Some(tags) = scene.tags_mut(root) {
            tags.set_material(base, ghost);
        }
        if let Some(body) = scene.body_mut(root) {
            body.density = Some(settings.density);
            body.capacity = Some(settings.capacity);
            if let Some(volume) = body.estimated_volume {
                body.mass = (settings.density * volume).max(MIN_PIECE_MASS);
            }
        }
        Some(settings)
    }
}
