//! Collaborator contracts the connection core depends on.
//!
//! The core never owns object data. It reaches the entity substrate, the
//! spatial index and the renderer only through these traits, which the host
//! application implements (see [`crate::world::GridWorld`] for an in-memory one).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::grid::{LayerIndex, Placement, Tile};

/// Opaque handle of an object in the entity substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A collaborator could not answer a query or apply a write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{collaborator}: {message}")]
pub struct CollaboratorError {
    pub collaborator: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self { collaborator, message: message.into() }
    }
}

/// Entity substrate queries.
pub trait Registry {
    /// Value deciding whether two objects belong to the same visual family.
    type Key: PartialEq;

    /// Whether `id` still resolves to a live object.
    fn is_valid(&self, id: ObjectId) -> bool;

    /// Whether `id` participates in adjacency recomputation.
    fn has_capability(&self, id: ObjectId) -> bool;

    fn group_key(&self, id: ObjectId) -> Result<Self::Key, CollaboratorError>;

    fn placement(&self, id: ObjectId) -> Result<Placement, CollaboratorError>;
}

/// Spatial index: which objects occupy a tile.
pub trait NeighborQuery {
    fn occupants(&self, tile: &Tile) -> Result<Vec<ObjectId>, CollaboratorError>;
}

/// Rendering side: the only output of a recompute.
pub trait LayerSink {
    fn set_layer_visible(
        &mut self,
        id: ObjectId,
        layer: LayerIndex,
        visible: bool,
    ) -> Result<(), CollaboratorError>;
}

/// Everything the connection core needs from its host.
pub trait ConnectWorld: Registry + NeighborQuery + LayerSink {}

impl<T: Registry + NeighborQuery + LayerSink> ConnectWorld for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_error_display() {
        let err = CollaboratorError::new("spatial index", "tile lookup timed out");
        assert_eq!(err.to_string(), "spatial index: tile lookup timed out");
    }

    #[test]
    fn test_object_id_display() {
        assert_eq!(ObjectId(42).to_string(), "#42");
    }
}
