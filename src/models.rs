//! Scene script objects.
//!
//! A scene script is a stream of JSON5 objects tagged by `type`, replayed in
//! order against a [`crate::world::GridWorld`].

use serde::{Deserialize, Serialize};

use crate::collab::ObjectId;
use crate::grid::GridId;

/// One scene script entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SceneObject {
    /// Declare a snap grid. `snap` falls back to the configured default.
    Grid {
        id: GridId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        snap: Option<u32>,
    },
    /// Forget a grid; objects anchored to it lose a valid location.
    RemoveGrid { id: GridId },
    /// Create an object, optionally anchored at `at` on `grid`.
    Spawn {
        id: ObjectId,
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<[i64; 2]>,
        #[serde(default)]
        grid: GridId,
        #[serde(default = "default_true")]
        connect: bool,
    },
    /// Relocate an object. Without `to` the object is un-anchored; without
    /// `grid` it stays on the grid it is anchored to.
    Move {
        id: ObjectId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<[i64; 2]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        grid: Option<GridId>,
    },
    Despawn { id: ObjectId },
    /// Grant the connect capability.
    Attach { id: ObjectId },
    /// Remove the connect capability.
    Detach { id: ObjectId },
    /// End of tick: run a recompute pass.
    Tick,
}

fn default_true() -> bool {
    true
}

impl SceneObject {
    /// Object id the entry refers to, if any.
    pub fn object(&self) -> Option<ObjectId> {
        match self {
            SceneObject::Spawn { id, .. }
            | SceneObject::Move { id, .. }
            | SceneObject::Despawn { id }
            | SceneObject::Attach { id }
            | SceneObject::Detach { id } => Some(*id),
            SceneObject::Grid { .. } | SceneObject::RemoveGrid { .. } | SceneObject::Tick => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SceneObject::Grid { .. } => "grid",
            SceneObject::RemoveGrid { .. } => "remove-grid",
            SceneObject::Spawn { .. } => "spawn",
            SceneObject::Move { .. } => "move",
            SceneObject::Despawn { .. } => "despawn",
            SceneObject::Attach { .. } => "attach",
            SceneObject::Detach { .. } => "detach",
            SceneObject::Tick => "tick",
        }
    }
}

/// A parsed entry with the line it started on.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntry {
    pub line: usize,
    pub object: SceneObject,
}

/// A warning message from parsing or replaying a scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warning {
    pub message: String,
    pub line: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_defaults() {
        let obj: SceneObject =
            serde_json::from_str(r#"{"type": "spawn", "id": 4, "key": "walls/solid"}"#).unwrap();
        match obj {
            SceneObject::Spawn { id, key, at, grid, connect } => {
                assert_eq!(id, ObjectId(4));
                assert_eq!(key, "walls/solid");
                assert_eq!(at, None);
                assert_eq!(grid, GridId(0));
                assert!(connect);
            }
            other => panic!("Expected spawn, got {:?}", other),
        }
    }

    #[test]
    fn test_tick_unit_variant() {
        let obj: SceneObject = serde_json::from_str(r#"{"type": "tick"}"#).unwrap();
        assert_eq!(obj, SceneObject::Tick);
        assert_eq!(obj.object(), None);
    }

    #[test]
    fn test_move_without_target() {
        let obj: SceneObject = serde_json::from_str(r#"{"type": "move", "id": 2}"#).unwrap();
        assert_eq!(obj, SceneObject::Move { id: ObjectId(2), to: None, grid: None });
        assert_eq!(obj.kind(), "move");
    }

    #[test]
    fn test_remove_grid_kebab_case() {
        let obj: SceneObject = serde_json::from_str(r#"{"type": "remove-grid", "id": 1}"#).unwrap();
        assert_eq!(obj, SceneObject::RemoveGrid { id: GridId(1) });
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let json = serde_json::to_string(&SceneObject::Grid { id: GridId(0), snap: None }).unwrap();
        assert_eq!(json, r#"{"type":"grid","id":0}"#);
    }
}
