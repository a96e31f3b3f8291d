//! Spritelink - deferred sprite connection for grid-placed objects
//!
//! Objects that appear, disappear or move invalidate themselves and their four
//! cardinal neighbors; a batched pass once per tick re-derives one
//! layer-visibility flag per direction from neighbor occupancy.
//!
//! - [`system::ConnectSystem`] holds the dirty set and runs the recompute pass
//! - [`collab`] defines the host contracts (registry, spatial index, renderer)
//! - [`world::GridWorld`] is an in-memory host used by the CLI and tests

pub mod cli;
pub mod collab;
pub mod config;
pub mod dirty;
pub mod grid;
pub mod hooks;
pub mod models;
pub mod parser;
pub mod rule;
pub mod scene;
pub mod system;
pub mod terminal;
pub mod world;
