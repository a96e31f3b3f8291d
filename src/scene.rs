//! Scene replay: drives a [`ConnectSystem`] over a [`GridWorld`] from a script.
//!
//! Every world mutation goes through the lifecycle hooks, so the dirty set is
//! maintained exactly as a host engine would maintain it. Each `tick` entry
//! runs one recompute pass and yields a [`TickOutput`].

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::collab::ObjectId;
use crate::grid::GridId;
use crate::models::{SceneEntry, SceneObject, Warning};
use crate::parser::parse_stream;
use crate::system::{
    ConnectError, ConnectOptions, ConnectSystem, ConnectWarning, Connections, PassReport,
};
use crate::world::GridWorld;

/// Scene replay failure (strict mode, or unreadable input).
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Cannot read scene '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: {source}")]
    Connect {
        line: usize,
        #[source]
        source: ConnectError,
    },
    #[error("line {line}: {message}")]
    Invalid { line: usize, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneOptions {
    pub connect: ConnectOptions,
    /// Snap size for grids declared without one.
    pub default_snap: u32,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self { connect: ConnectOptions::default(), default_snap: 1 }
    }
}

/// Connection state of one recomputed object after a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectState {
    pub id: ObjectId,
    pub key: String,
    pub grid: GridId,
    pub at: [i64; 2],
    pub connections: Connections,
    pub mask: u8,
    pub state: String,
}

/// What one recompute pass produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickOutput {
    pub tick: usize,
    /// Line of the `tick` entry; 0 for implied trailing ticks.
    pub line: usize,
    pub objects: Vec<ObjectState>,
    pub stale: usize,
    pub remaining: usize,
    pub warnings: Vec<Warning>,
}

/// Everything a full replay produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneOutcome {
    pub ticks: Vec<TickOutput>,
    /// Warnings raised outside recompute passes.
    pub warnings: Vec<Warning>,
}

impl SceneOutcome {
    pub fn warning_count(&self) -> usize {
        self.warnings.len() + self.ticks.iter().map(|t| t.warnings.len()).sum::<usize>()
    }
}

pub struct SceneRunner {
    system: ConnectSystem<GridWorld>,
    options: SceneOptions,
    outcome: SceneOutcome,
}

impl SceneRunner {
    pub fn new(options: SceneOptions) -> Self {
        let system = ConnectSystem::new(GridWorld::new()).with_options(options.connect);
        Self { system, options, outcome: SceneOutcome::default() }
    }

    pub fn world(&self) -> &GridWorld {
        self.system.world()
    }

    pub fn system(&self) -> &ConnectSystem<GridWorld> {
        &self.system
    }

    /// Parse and replay a scene file.
    pub fn run_file(path: &Path, options: SceneOptions) -> Result<(SceneOutcome, GridWorld), SceneError> {
        let file = std::fs::File::open(path)
            .map_err(|source| SceneError::Io { path: path.display().to_string(), source })?;
        let parsed = parse_stream(file);
        let mut runner = SceneRunner::new(options);
        for warning in parsed.warnings {
            runner.lenient(warning.line, warning.message)?;
        }
        runner.run(&parsed.entries)?;
        Ok(runner.finish())
    }

    /// Replay entries, then drain anything still pending with implied ticks.
    pub fn run(&mut self, entries: &[SceneEntry]) -> Result<(), SceneError> {
        for entry in entries {
            self.apply(entry)?;
        }
        while self.system.pending() > 0 {
            self.tick(0)?;
        }
        Ok(())
    }

    pub fn finish(self) -> (SceneOutcome, GridWorld) {
        (self.outcome, self.system.into_world())
    }

    /// Apply one entry. Returns the tick output for `tick` entries.
    pub fn apply(&mut self, entry: &SceneEntry) -> Result<Option<&TickOutput>, SceneError> {
        let line = entry.line;
        match &entry.object {
            SceneObject::Grid { id, snap } => self.declare_grid(line, *id, *snap)?,
            SceneObject::RemoveGrid { id } => self.remove_grid(line, *id)?,
            SceneObject::Spawn { id, key, at, grid, connect } => {
                self.spawn(line, *id, key, *at, *grid, *connect)?
            }
            SceneObject::Move { id, to, grid } => self.relocate(line, *id, *to, *grid)?,
            SceneObject::Despawn { id } => {
                if self.known(line, *id)? {
                    let id = *id;
                    let result = self.system.detach(id, |w| {
                        w.despawn(id);
                    });
                    self.connect_result(line, result.map(|w| w.into_iter().collect()))?;
                }
            }
            SceneObject::Attach { id } => {
                if self.known(line, *id)? {
                    let id = *id;
                    let result = self.system.attach(id, |w| {
                        w.set_capability(id, true);
                    });
                    self.connect_result(line, result.map(|w| w.into_iter().collect()))?;
                }
            }
            SceneObject::Detach { id } => {
                if self.known(line, *id)? {
                    let id = *id;
                    let result = self.system.detach(id, |w| {
                        w.set_capability(id, false);
                    });
                    self.connect_result(line, result.map(|w| w.into_iter().collect()))?;
                }
            }
            SceneObject::Tick => {
                self.tick(line)?;
                return Ok(self.outcome.ticks.last());
            }
        }
        Ok(None)
    }

    fn declare_grid(&mut self, line: usize, id: GridId, snap: Option<u32>) -> Result<(), SceneError> {
        let snap = snap.unwrap_or(self.options.default_snap);
        if snap == 0 {
            return self.lenient(line, format!("{} declared with snap size 0", id));
        }
        let existed = self.world().has_grid(id);
        self.system.world_mut().add_grid(id, snap);
        if existed {
            // Neighbor distances changed for everything on the grid.
            let ids: Vec<ObjectId> =
                self.world().objects_on(id).into_iter().map(|(o, _)| o).collect();
            for object in ids {
                let result = self.system.notify_changed(object);
                self.connect_result(line, result.map(|w| w.into_iter().collect()))?;
            }
        }
        Ok(())
    }

    fn remove_grid(&mut self, line: usize, id: GridId) -> Result<(), SceneError> {
        if !self.world().has_grid(id) {
            return self.lenient(line, format!("unknown {}", id));
        }
        let ids: Vec<ObjectId> = self.world().objects_on(id).into_iter().map(|(o, _)| o).collect();
        for object in ids {
            let result = self.system.notify_changed(object);
            self.connect_result(line, result.map(|w| w.into_iter().collect()))?;
        }
        self.system.world_mut().remove_grid(id);
        Ok(())
    }

    fn spawn(
        &mut self,
        line: usize,
        id: ObjectId,
        key: &str,
        at: Option<[i64; 2]>,
        grid: GridId,
        connect: bool,
    ) -> Result<(), SceneError> {
        if self.world().contains(id) {
            return self.lenient(line, format!("object {} already exists", id));
        }
        let at = match at {
            Some(_) if !self.world().has_grid(grid) => {
                self.lenient(line, format!("unknown {}; {} spawned unplaced", grid, id))?;
                None
            }
            other => other,
        };
        let result = self.system.attach(id, |w| {
            w.spawn(id, key, connect);
            if let Some([x, y]) = at {
                w.place_at(id, grid, x, y);
            }
        });
        self.connect_result(line, result.map(|w| w.into_iter().collect()))
    }

    fn relocate(
        &mut self,
        line: usize,
        id: ObjectId,
        to: Option<[i64; 2]>,
        grid: Option<GridId>,
    ) -> Result<(), SceneError> {
        if !self.known(line, id)? {
            return Ok(());
        }
        if let Some(to) = to {
            let Some(grid) = grid.or_else(|| self.world().anchor_grid(id)) else {
                return self.lenient(line, format!("{} is not on any grid; move ignored", id));
            };
            if !self.world().has_grid(grid) {
                return self.lenient(line, format!("unknown {}; move of {} ignored", grid, id));
            }
            let result = self.system.relocate(id, |w| {
                w.place_at(id, grid, to[0], to[1]);
            });
            return self.connect_result(line, result);
        }
        let result = self.system.relocate(id, |w| w.unplace(id));
        self.connect_result(line, result)
    }

    fn tick(&mut self, line: usize) -> Result<(), SceneError> {
        let report = self.system.tick();
        let output = self.tick_output(line, report)?;
        self.outcome.ticks.push(output);
        Ok(())
    }

    fn tick_output(&self, line: usize, report: PassReport) -> Result<TickOutput, SceneError> {
        let strict = self.options.connect.strict;
        let mut warnings: Vec<Warning> = report
            .warnings
            .iter()
            .map(|w| Warning { message: w.message.clone(), line })
            .collect();
        for failure in report.failures {
            if strict {
                return Err(SceneError::Connect { line, source: failure });
            }
            warnings.push(Warning { message: failure.to_string(), line });
        }

        let world = self.world();
        let objects = report
            .recomputed
            .iter()
            .filter_map(|r| {
                let tile = world.tile_of(r.object)?;
                Some(ObjectState {
                    id: r.object,
                    key: world.key_of(r.object)?.to_string(),
                    grid: tile.grid,
                    at: [tile.x, tile.y],
                    connections: r.connections,
                    mask: r.connections.mask(),
                    state: world.state_name(r.object)?,
                })
            })
            .collect();

        Ok(TickOutput {
            tick: self.outcome.ticks.len() + 1,
            line,
            objects,
            stale: report.stale,
            remaining: report.remaining,
            warnings,
        })
    }

    fn known(&mut self, line: usize, id: ObjectId) -> Result<bool, SceneError> {
        if self.world().contains(id) {
            Ok(true)
        } else {
            self.lenient(line, format!("unknown object {}", id))?;
            Ok(false)
        }
    }

    fn connect_result(
        &mut self,
        line: usize,
        result: Result<Vec<ConnectWarning>, ConnectError>,
    ) -> Result<(), SceneError> {
        match result {
            Ok(warnings) => {
                self.outcome
                    .warnings
                    .extend(warnings.into_iter().map(|w| Warning { message: w.message, line }));
                Ok(())
            }
            Err(source) => {
                if self.options.connect.strict {
                    Err(SceneError::Connect { line, source })
                } else {
                    self.outcome.warnings.push(Warning { message: source.to_string(), line });
                    Ok(())
                }
            }
        }
    }

    /// Record a warning, or fail in strict mode.
    fn lenient(&mut self, line: usize, message: String) -> Result<(), SceneError> {
        if self.options.connect.strict {
            return Err(SceneError::Invalid { line, message });
        }
        tracing::warn!(line, "{}", message);
        self.outcome.warnings.push(Warning { message, line });
        Ok(())
    }
}
