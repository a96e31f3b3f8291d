//! In-memory host world: entity store, spatial index and sprite layers.
//!
//! `GridWorld` implements every collaborator contract so the connection core
//! can run standalone (CLI, tests, benches). Layer writes are recorded so
//! callers can inspect exactly what a pass touched.

use std::collections::{BTreeMap, HashMap};

use crate::collab::{CollaboratorError, LayerSink, NeighborQuery, ObjectId, Registry};
use crate::grid::{Direction, GridId, LayerIndex, Placement, Tile};
use crate::system::Connections;

/// A single `set_layer_visible` call observed by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerWrite {
    pub object: ObjectId,
    pub layer: LayerIndex,
    pub visible: bool,
}

#[derive(Debug, Clone)]
struct Entity {
    key: String,
    capable: bool,
    anchor: Option<(GridId, i64, i64)>,
    layers: BTreeMap<LayerIndex, bool>,
}

#[derive(Debug, Clone, Default)]
pub struct GridWorld {
    grids: HashMap<GridId, u32>,
    objects: HashMap<ObjectId, Entity>,
    occupancy: HashMap<(GridId, i64, i64), Vec<ObjectId>>,
    writes: Vec<LayerWrite>,
}

impl GridWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a grid. Re-adding an existing grid replaces its snap size.
    pub fn add_grid(&mut self, grid: GridId, snap: u32) {
        self.grids.insert(grid, snap);
    }

    /// Forget a grid. Objects anchored to it keep their anchor but their
    /// placement becomes [`Placement::Invalid`].
    pub fn remove_grid(&mut self, grid: GridId) -> bool {
        self.grids.remove(&grid).is_some()
    }

    pub fn snap_of(&self, grid: GridId) -> Option<u32> {
        self.grids.get(&grid).copied()
    }

    pub fn has_grid(&self, grid: GridId) -> bool {
        self.grids.contains_key(&grid)
    }

    /// Create an unplaced object. An existing object with the same id is replaced.
    pub fn spawn(&mut self, id: ObjectId, key: &str, capable: bool) {
        self.despawn(id);
        self.objects.insert(
            id,
            Entity { key: key.to_string(), capable, anchor: None, layers: BTreeMap::new() },
        );
    }

    pub fn despawn(&mut self, id: ObjectId) -> bool {
        self.unplace(id);
        self.objects.remove(&id).is_some()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn set_capability(&mut self, id: ObjectId, capable: bool) -> bool {
        match self.objects.get_mut(&id) {
            Some(entity) => {
                entity.capable = capable;
                true
            }
            None => false,
        }
    }

    /// Anchor `id` at `tile`, leaving its previous tile.
    pub fn place(&mut self, id: ObjectId, tile: Tile) -> bool {
        if !self.objects.contains_key(&id) {
            return false;
        }
        self.unplace(id);
        let cell = (tile.grid, tile.x, tile.y);
        self.occupancy.entry(cell).or_default().push(id);
        if let Some(entity) = self.objects.get_mut(&id) {
            entity.anchor = Some(cell);
        }
        true
    }

    /// Anchor `id` at world coordinates on `grid`, using the grid's snap size.
    pub fn place_at(&mut self, id: ObjectId, grid: GridId, x: i64, y: i64) -> bool {
        let snap = self.snap_of(grid).unwrap_or(1);
        self.place(id, Tile::new(grid, snap, x, y))
    }

    /// Detach `id` from any grid.
    pub fn unplace(&mut self, id: ObjectId) {
        let Some(cell) = self.objects.get_mut(&id).and_then(|e| e.anchor.take()) else {
            return;
        };
        if let Some(occupants) = self.occupancy.get_mut(&cell) {
            occupants.retain(|o| *o != id);
            if occupants.is_empty() {
                self.occupancy.remove(&cell);
            }
        }
    }

    pub fn tile_of(&self, id: ObjectId) -> Option<Tile> {
        self.placement(id).ok().and_then(|p| p.tile())
    }

    /// Grid `id` is anchored to, even when that grid no longer exists.
    pub fn anchor_grid(&self, id: ObjectId) -> Option<GridId> {
        self.objects.get(&id).and_then(|e| e.anchor).map(|(grid, _, _)| grid)
    }

    pub fn key_of(&self, id: ObjectId) -> Option<&str> {
        self.objects.get(&id).map(|e| e.key.as_str())
    }

    pub fn layer(&self, id: ObjectId, layer: LayerIndex) -> Option<bool> {
        self.objects.get(&id).and_then(|e| e.layers.get(&layer).copied())
    }

    /// Connection flags as last written to the object's layers.
    pub fn connections(&self, id: ObjectId) -> Option<Connections> {
        let entity = self.objects.get(&id)?;
        let mut connections = Connections::default();
        for dir in Direction::ALL {
            connections.set(dir, entity.layers.get(&dir.layer()).copied().unwrap_or(false));
        }
        Some(connections)
    }

    /// Icon-smoothing state name: the last path segment of the group key
    /// followed by the connection mask, e.g. `"solid5"`.
    pub fn state_name(&self, id: ObjectId) -> Option<String> {
        let base = self.key_of(id)?;
        let base = base.rsplit('/').next().unwrap_or(base);
        Some(format!("{}{}", base, self.connections(id)?.mask()))
    }

    /// All object ids, sorted.
    pub fn object_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Placed objects on `grid` with their tiles, sorted by id.
    pub fn objects_on(&self, grid: GridId) -> Vec<(ObjectId, Tile)> {
        self.object_ids()
            .into_iter()
            .filter_map(|id| self.tile_of(id).map(|t| (id, t)))
            .filter(|(_, t)| t.grid == grid)
            .collect()
    }

    pub fn writes(&self) -> &[LayerWrite] {
        &self.writes
    }

    pub fn writes_for(&self, id: ObjectId) -> impl Iterator<Item = &LayerWrite> + '_ {
        self.writes.iter().filter(move |w| w.object == id)
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl Registry for GridWorld {
    type Key = String;

    fn is_valid(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    fn has_capability(&self, id: ObjectId) -> bool {
        self.objects.get(&id).is_some_and(|e| e.capable)
    }

    fn group_key(&self, id: ObjectId) -> Result<String, CollaboratorError> {
        self.objects
            .get(&id)
            .map(|e| e.key.clone())
            .ok_or_else(|| CollaboratorError::new("registry", format!("unknown object {}", id)))
    }

    fn placement(&self, id: ObjectId) -> Result<Placement, CollaboratorError> {
        let entity = self
            .objects
            .get(&id)
            .ok_or_else(|| CollaboratorError::new("registry", format!("unknown object {}", id)))?;
        Ok(match entity.anchor {
            None => Placement::Unplaced,
            Some((grid, x, y)) => match self.grids.get(&grid) {
                Some(&snap) => Placement::At(Tile::new(grid, snap, x, y)),
                None => Placement::Invalid,
            },
        })
    }
}

impl NeighborQuery for GridWorld {
    fn occupants(&self, tile: &Tile) -> Result<Vec<ObjectId>, CollaboratorError> {
        Ok(self.occupancy.get(&(tile.grid, tile.x, tile.y)).cloned().unwrap_or_default())
    }
}

impl LayerSink for GridWorld {
    fn set_layer_visible(
        &mut self,
        id: ObjectId,
        layer: LayerIndex,
        visible: bool,
    ) -> Result<(), CollaboratorError> {
        let entity = self
            .objects
            .get_mut(&id)
            .ok_or_else(|| CollaboratorError::new("renderer", format!("no sprite for {}", id)))?;
        entity.layers.insert(layer, visible);
        self.writes.push(LayerWrite { object: id, layer, visible });
        Ok(())
    }
}
