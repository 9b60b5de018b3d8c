//! Prefab descriptions that can be instantiated into a [`SceneGraph`](super::SceneGraph).

use serde::{Deserialize, Serialize};

use super::Pose;

/// How a node participates in the physics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moved by physics; build pieces and anchors.
    Static,
    /// Simulated rigid body; runtime pieces and loads.
    Dynamic,
}

/// Physical properties attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Whether the physics layer simulates the node.
    pub kind: BodyKind,
    /// Mass in kilograms.
    pub mass: f32,
    /// Volume used to derive mass from material density, when known.
    pub estimated_volume: Option<f32>,
    /// Density of the applied material in kg/m³.
    pub density: Option<f32>,
    /// Load the applied material can carry before failing.
    pub capacity: Option<f32>,
}

impl Body {
    /// A simulated body of `mass` kilograms.
    #[must_use]
    pub const fn dynamic(mass: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            mass,
            estimated_volume: None,
            density: None,
            capacity: None,
        }
    }

    /// A body the physics layer never moves.
    #[must_use]
    pub const fn fixed() -> Self {
        Self {
            kind: BodyKind::Static,
            mass: 0.0,
            estimated_volume: None,
            density: None,
            capacity: None,
        }
    }

    /// Returns this body with a known volume so mass can follow material.
    #[must_use]
    pub const fn with_volume(mut self, volume: f32) -> Self {
        self.estimated_volume = Some(volume);
        self
    }
}

/// Description of a node subtree that can be cloned into a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// Name given to the instantiated root node.
    pub name: String,
    /// Pose relative to whatever parent the instance is attached to.
    pub local: Pose,
    /// Base colour as linear RGBA, if the node renders anything.
    pub color: Option<[f32; 4]>,
    /// Physical properties, if the node takes part in physics.
    pub body: Option<Body>,
    /// Sub-nodes cloned beneath the instance, in order.
    pub children: Vec<NodeTemplate>,
}

impl NodeTemplate {
    /// An empty template named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Pose::IDENTITY,
            color: None,
            body: None,
            children: Vec::new(),
        }
    }

    /// Sets the base colour.
    #[must_use]
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = Some(color);
        self
    }

    /// Sets the physical body.
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the local pose.
    #[must_use]
    pub fn with_local(mut self, local: Pose) -> Self {
        self.local = local;
        self
    }

    /// Appends a sub-node.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }
}
