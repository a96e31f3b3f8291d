//! Grid coordinates, cardinal directions and the direction-to-layer mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a snap grid that objects can be anchored to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GridId(pub u32);

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid#{}", self.0)
    }
}

/// Index of a sprite layer on the rendering side.
pub type LayerIndex = u8;

/// A snapped position on a specific grid.
///
/// Coordinates are world units; neighbors lie exactly one `snap` away along
/// each axis. Equality is exact on all fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub grid: GridId,
    pub snap: u32,
    pub x: i64,
    pub y: i64,
}

impl Tile {
    pub fn new(grid: GridId, snap: u32, x: i64, y: i64) -> Self {
        Self { grid, snap, x, y }
    }

    /// The tile one snap step away in `dir`, on the same grid.
    ///
    /// `None` when the step leaves the `i64` coordinate range.
    pub fn neighbor(&self, dir: Direction) -> Option<Tile> {
        let (dx, dy) = dir.unit();
        let step = i64::from(self.snap);
        let x = self.x.checked_add(dx.checked_mul(step)?)?;
        let y = self.y.checked_add(dy.checked_mul(step)?)?;
        Some(Tile { x, y, ..*self })
    }

    /// The four cardinal neighbors in [`Direction::ALL`] order.
    pub fn cardinal_neighbors(&self) -> [(Direction, Option<Tile>); 4] {
        Direction::ALL.map(|dir| (dir, self.neighbor(dir)))
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) on {}", self.x, self.y, self.grid)
    }
}

/// One of the four cardinal directions. Diagonals never participate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// +X
    East,
    /// -X
    West,
    /// +Y
    North,
    /// -Y
    South,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::East, Direction::West, Direction::North, Direction::South];

    /// Unit offset along the grid axes.
    pub fn unit(self) -> (i64, i64) {
        match self {
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::North => (0, 1),
            Direction::South => (0, -1),
        }
    }

    /// Sprite layer that shows the connection towards this direction.
    ///
    /// The mapping is fixed: +X -> 1, +Y -> 2, -X -> 3, -Y -> 4.
    pub fn layer(self) -> LayerIndex {
        match self {
            Direction::East => 1,
            Direction::North => 2,
            Direction::West => 3,
            Direction::South => 4,
        }
    }

    /// Inverse of [`Direction::layer`].
    pub fn from_layer(layer: LayerIndex) -> Option<Direction> {
        match layer {
            1 => Some(Direction::East),
            2 => Some(Direction::North),
            3 => Some(Direction::West),
            4 => Some(Direction::South),
            _ => None,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
        }
    }

    /// Bit used in the 4-bit connection mask (N=1, E=2, S=4, W=8).
    pub fn mask_bit(self) -> u8 {
        match self {
            Direction::North => 1,
            Direction::East => 2,
            Direction::South => 4,
            Direction::West => 8,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::East => "east",
            Direction::West => "west",
            Direction::North => "north",
            Direction::South => "south",
        };
        f.write_str(name)
    }
}

/// Where an object currently sits, as reported by the entity substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Never anchored to a grid. Not an error.
    Unplaced,
    /// Anchored, but the location cannot be resolved (e.g. its grid is gone).
    Invalid,
    /// Anchored at a tile.
    At(Tile),
}

impl Placement {
    pub fn tile(&self) -> Option<Tile> {
        match self {
            Placement::At(tile) => Some(*tile),
            _ => None,
        }
    }
}
