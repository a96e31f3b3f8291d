//! `spl show`: draw the final connection state of one grid.

use std::path::Path;
use std::process::ExitCode;

use crate::config::load_config;
use crate::grid::GridId;
use crate::scene::SceneRunner;
use crate::terminal::render_grid;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the show command
pub fn run_show(input: &Path, grid: u32, config: Option<&Path>) -> ExitCode {
    let config = match load_config(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let (outcome, world) = match SceneRunner::run_file(input, config.scene_options()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let warnings = outcome.warning_count();
    if warnings > 0 {
        eprintln!("{} warning(s) while replaying '{}'", warnings, input.display());
    }

    match render_grid(&world, GridId(grid)) {
        Ok(rendered) => {
            print!("{}", rendered);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {} in '{}'", e, input.display());
            ExitCode::from(EXIT_ERROR)
        }
    }
}
