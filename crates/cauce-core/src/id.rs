//! Entity ID types for CAUCE river models
//!
//! Cross-sections, reaches and hydraulic structures all carry an opaque
//! unique id so that analysis results (system result maps, inherited
//! boundary conditions, structure records) can refer back to their source
//! entity without holding references. Ids are random v4 UUIDs: two models
//! built independently never collide, which matters when reaches from
//! different studies are combined into one river system.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for entities in a river model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Create a new unique ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for cross-sections
pub type SectionId = EntityId;

/// A unique identifier for river reaches
pub type ReachId = EntityId;
