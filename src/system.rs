//! Connection core: invalidation fan-out and the deferred recompute pass.
//!
//! Events mark objects dirty through [`ConnectSystem::notify_changed`]; once
//! per tick [`ConnectSystem::recompute_pass`] drains the dirty set and writes
//! one layer-visibility flag per cardinal direction for every drained object.

use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::collab::{CollaboratorError, ConnectWorld, NeighborQuery, ObjectId, Registry};
use crate::dirty::DirtySet;
use crate::grid::{Direction, Placement, Tile};
use crate::rule::{MatchRule, SameGroup};

/// Tuning for the connection core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectOptions {
    /// Maximum objects recomputed per pass; `None` drains everything.
    pub budget: Option<usize>,
    /// Treat unresolvable positions as errors instead of warnings.
    pub strict: bool,
    /// Evaluate drained objects on the rayon pool (see [`ConnectSystem::tick`]).
    pub parallel: bool,
}

/// Which step produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Invalidate,
    Recompute,
}

/// Recoverable problem, reported in lenient mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectWarning {
    pub object: ObjectId,
    pub phase: Phase,
    pub message: String,
}

impl ConnectWarning {
    fn unresolved(object: ObjectId, phase: Phase) -> Self {
        Self { object, phase, message: format!("position of {} is not a valid location", object) }
    }
}

impl fmt::Display for ConnectWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Per-object failure. Never aborts a pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("object {object}: {source}")]
    Collaborator {
        object: ObjectId,
        #[source]
        source: CollaboratorError,
    },
    #[error("object {object}: position is not a valid location")]
    UnresolvedPosition { object: ObjectId },
}

impl ConnectError {
    pub fn object(&self) -> ObjectId {
        match self {
            ConnectError::Collaborator { object, .. } => *object,
            ConnectError::UnresolvedPosition { object } => *object,
        }
    }
}

/// Per-direction connection result of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Connections {
    pub east: bool,
    pub west: bool,
    pub north: bool,
    pub south: bool,
}

impl Connections {
    pub fn get(&self, dir: Direction) -> bool {
        match dir {
            Direction::East => self.east,
            Direction::West => self.west,
            Direction::North => self.north,
            Direction::South => self.south,
        }
    }

    pub fn set(&mut self, dir: Direction, value: bool) {
        match dir {
            Direction::East => self.east = value,
            Direction::West => self.west = value,
            Direction::North => self.north = value,
            Direction::South => self.south = value,
        }
    }

    /// 4-bit mask using [`Direction::mask_bit`].
    pub fn mask(&self) -> u8 {
        Direction::ALL.iter().filter(|d| self.get(**d)).map(|d| d.mask_bit()).sum()
    }
}

/// An object whose layers were written by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recomputed {
    pub object: ObjectId,
    pub connections: Connections,
}

/// Outcome of one recompute pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub recomputed: Vec<Recomputed>,
    /// Drained objects that were gone, incapable or unplaced.
    pub stale: usize,
    pub warnings: Vec<ConnectWarning>,
    #[serde(skip)]
    pub failures: Vec<ConnectError>,
    /// Objects still pending after the pass (non-zero only with a budget).
    pub remaining: usize,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.failures.is_empty()
    }

    pub fn connections_of(&self, object: ObjectId) -> Option<Connections> {
        self.recomputed.iter().find(|r| r.object == object).map(|r| r.connections)
    }
}

enum Evaluation {
    Ready(Connections),
    Stale,
    Unresolved,
}

/// Deferred connection recompute over a host world `W` using rule `M`.
///
/// The world handle is injected at construction and owned by the system; the
/// host mutates it through [`ConnectSystem::world_mut`] and reports every
/// relevant change through [`ConnectSystem::notify_changed`].
pub struct ConnectSystem<W, M = SameGroup> {
    world: W,
    rule: M,
    dirty: DirtySet,
    options: ConnectOptions,
}

impl<W: ConnectWorld> ConnectSystem<W, SameGroup> {
    pub fn new(world: W) -> Self {
        Self::with_rule(world, SameGroup)
    }
}

impl<W: ConnectWorld, M: MatchRule<W>> ConnectSystem<W, M> {
    pub fn with_rule(world: W, rule: M) -> Self {
        Self { world, rule, dirty: DirtySet::new(), options: ConnectOptions::default() }
    }

    pub fn with_options(mut self, options: ConnectOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ConnectOptions) {
        self.options = options;
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn into_world(self) -> W {
        self.world
    }

    pub fn pending(&self) -> usize {
        self.dirty.len()
    }

    pub fn is_pending(&self, id: ObjectId) -> bool {
        self.dirty.contains(id)
    }

    /// React to `id` being created, destroyed or moved.
    ///
    /// Marks `id` and every valid, capable occupant of its four cardinal
    /// neighbor tiles dirty. Objects that are gone or lack the capability are
    /// ignored. An unplaced object is marked but has no neighbors to fan out
    /// to; an unresolvable position yields a warning (or an error in strict
    /// mode) after the object itself has been marked.
    pub fn notify_changed(&mut self, id: ObjectId) -> Result<Option<ConnectWarning>, ConnectError> {
        if !self.world.is_valid(id) || !self.world.has_capability(id) {
            return Ok(None);
        }
        self.dirty.insert(id);

        let placement = self
            .world
            .placement(id)
            .map_err(|source| ConnectError::Collaborator { object: id, source })?;
        let tile = match placement {
            Placement::At(tile) => tile,
            Placement::Unplaced => return Ok(None),
            Placement::Invalid => return self.unresolved(id, Phase::Invalidate),
        };

        let mut marked = 0usize;
        for (_, neighbor) in tile.cardinal_neighbors() {
            let Some(neighbor) = neighbor else {
                continue;
            };
            let occupants = self
                .world
                .occupants(&neighbor)
                .map_err(|source| ConnectError::Collaborator { object: id, source })?;
            for other in occupants {
                if self.world.is_valid(other)
                    && self.world.has_capability(other)
                    && self.dirty.insert(other)
                {
                    marked += 1;
                }
            }
        }
        debug!(object = %id, %tile, neighbors_marked = marked, "invalidated");
        Ok(None)
    }

    fn unresolved(&self, id: ObjectId, phase: Phase) -> Result<Option<ConnectWarning>, ConnectError> {
        if self.options.strict {
            return Err(ConnectError::UnresolvedPosition { object: id });
        }
        warn!(object = %id, ?phase, "position is not a valid location");
        Ok(Some(ConnectWarning::unresolved(id, phase)))
    }

    /// Drain the dirty set (up to the budget) and recompute each object.
    pub fn recompute_pass(&mut self) -> PassReport {
        let batch = self.dirty.drain_up_to(self.options.budget);
        let evaluated: Vec<_> = batch
            .iter()
            .map(|&id| (id, evaluate(&self.world, &self.rule, id)))
            .collect();
        self.apply(evaluated)
    }

    fn apply(&mut self, evaluated: Vec<(ObjectId, Result<Evaluation, ConnectError>)>) -> PassReport {
        let mut report = PassReport::default();
        for (id, outcome) in evaluated {
            match outcome {
                Ok(Evaluation::Ready(connections)) => match self.write_layers(id, connections) {
                    Ok(()) => report.recomputed.push(Recomputed { object: id, connections }),
                    Err(err) => report.failures.push(err),
                },
                Ok(Evaluation::Stale) => {
                    trace!(object = %id, "skipping stale object");
                    report.stale += 1;
                }
                Ok(Evaluation::Unresolved) => match self.unresolved(id, Phase::Recompute) {
                    Ok(Some(warning)) => report.warnings.push(warning),
                    Ok(None) => {}
                    Err(err) => report.failures.push(err),
                },
                Err(err) => report.failures.push(err),
            }
        }
        report.remaining = self.dirty.len();
        debug!(
            recomputed = report.recomputed.len(),
            stale = report.stale,
            failures = report.failures.len(),
            remaining = report.remaining,
            "recompute pass finished"
        );
        report
    }

    fn write_layers(&mut self, id: ObjectId, connections: Connections) -> Result<(), ConnectError> {
        for dir in Direction::ALL {
            self.world
                .set_layer_visible(id, dir.layer(), connections.get(dir))
                .map_err(|source| ConnectError::Collaborator { object: id, source })?;
        }
        Ok(())
    }
}

impl<W, M> ConnectSystem<W, M>
where
    W: ConnectWorld + Sync,
    M: MatchRule<W> + Sync,
{
    /// Like [`ConnectSystem::recompute_pass`], but evaluates the batch on the
    /// rayon pool. Evaluation only reads the world; writes are applied
    /// afterwards in drain order.
    pub fn recompute_pass_parallel(&mut self) -> PassReport {
        let batch = self.dirty.drain_up_to(self.options.budget);
        let world = &self.world;
        let rule = &self.rule;
        let evaluated: Vec<_> =
            batch.par_iter().map(|&id| (id, evaluate(world, rule, id))).collect();
        self.apply(evaluated)
    }

    /// Run one pass, honoring [`ConnectOptions::parallel`].
    pub fn tick(&mut self) -> PassReport {
        if self.options.parallel {
            self.recompute_pass_parallel()
        } else {
            self.recompute_pass()
        }
    }
}

/// Re-validate `id` and derive its four connection flags.
///
/// Reads only the object itself and the occupants of its four neighbor tiles.
fn evaluate<W, M>(world: &W, rule: &M, id: ObjectId) -> Result<Evaluation, ConnectError>
where
    W: Registry + NeighborQuery + ?Sized,
    M: MatchRule<W> + ?Sized,
{
    if !world.is_valid(id) || !world.has_capability(id) {
        return Ok(Evaluation::Stale);
    }
    let wrap = |source| ConnectError::Collaborator { object: id, source };
    let tile: Tile = match world.placement(id).map_err(wrap)? {
        Placement::At(tile) => tile,
        Placement::Unplaced => return Ok(Evaluation::Stale),
        Placement::Invalid => return Ok(Evaluation::Unresolved),
    };
    let key = world.group_key(id).map_err(wrap)?;

    let mut connections = Connections::default();
    for (dir, neighbor) in tile.cardinal_neighbors() {
        // Off the coordinate range: nothing can sit there.
        let Some(neighbor) = neighbor else {
            continue;
        };
        let occupants = world.occupants(&neighbor).map_err(wrap)?;
        let hit = rule.matches(world, &key, &occupants).map_err(wrap)?;
        connections.set(dir, hit);
    }
    Ok(Evaluation::Ready(connections))
}
