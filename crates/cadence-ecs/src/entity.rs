//! Entity information and metadata

use cadence_core::{EntityId, Vec3};
use serde::{Deserialize, Serialize};

/// Snapshot of an entity for summaries and debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInfo {
    /// The stable entity ID
    pub id: EntityId,
    /// Human-readable name
    pub name: String,
    /// Parent entity name (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Number of attached children
    pub children: usize,
    /// World-space position
    pub world_position: Vec3,
}

impl EntityInfo {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: 0,
            world_position: Vec3::ZERO,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_children(mut self, children: usize) -> Self {
        self.children = children;
        self
    }

    pub fn with_world_position(mut self, position: Vec3) -> Self {
        self.world_position = position;
        self
    }
}
