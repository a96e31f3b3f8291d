//! `spl run`: replay a scene and report each recompute pass.

use std::path::Path;
use std::process::ExitCode;

use crate::config::{load_config, merge_cli_overrides, CliOverrides};
use crate::scene::{SceneOutcome, SceneRunner, TickOutput};

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the run command
pub fn run_scene(input: &Path, config: Option<&Path>, overrides: &CliOverrides) -> ExitCode {
    let mut config = match load_config(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    merge_cli_overrides(&mut config, overrides);

    let (outcome, _) = match SceneRunner::run_file(input, config.scene_options()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if config.json_output() {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        print!("{}", format_outcome_text(&outcome));
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn format_tick(tick: &TickOutput) -> String {
    let mut out = String::new();
    let origin = if tick.line == 0 { "end".to_string() } else { format!("line {}", tick.line) };
    out.push_str(&format!(
        "tick {} ({}): {} recomputed, {} stale, {} pending\n",
        tick.tick,
        origin,
        tick.objects.len(),
        tick.stale,
        tick.remaining
    ));
    for obj in &tick.objects {
        let c = obj.connections;
        out.push_str(&format!(
            "  {} {} ({}, {}) E:{} W:{} N:{} S:{} mask={} state={}\n",
            obj.id,
            obj.key,
            obj.at[0],
            obj.at[1],
            flag(c.east),
            flag(c.west),
            flag(c.north),
            flag(c.south),
            obj.mask,
            obj.state
        ));
    }
    for w in &tick.warnings {
        out.push_str(&format!("  warning: {}\n", w.message));
    }
    out
}

/// Plain-text report of a replay.
pub(crate) fn format_outcome_text(outcome: &SceneOutcome) -> String {
    let mut out = String::new();
    for w in &outcome.warnings {
        out.push_str(&format!("warning: line {}: {}\n", w.line, w.message));
    }
    for tick in &outcome.ticks {
        out.push_str(&format_tick(tick));
    }
    out
}
