//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod run;
mod show;
mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use glob::glob;
use tracing_subscriber::EnvFilter;

use crate::config::CliOverrides;

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Check if a path has a scene script extension (.spl or .jsonl).
pub fn is_scene_file(path: &std::path::Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("spl") | Some("jsonl"))
}

/// Find all scene scripts in a directory (recursively), sorted.
pub fn find_scene_files(dir: &std::path::Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let dir_str = dir.display().to_string();

    for ext in ["spl", "jsonl"] {
        if let Ok(paths) = glob(&format!("{}/**/*.{}", dir_str, ext)) {
            files.extend(paths.filter_map(Result::ok));
        }
    }

    files.sort();
    files
}

/// Spritelink - replay grid scenes through the deferred sprite-connect core
#[derive(Parser)]
#[command(name = "spl")]
#[command(about = "Spritelink - cardinal-neighbor sprite connection for grid scenes (.spl, .jsonl)")]
#[command(version)]
pub struct Cli {
    /// Log debug output from the connection core (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scene and report every recompute pass
    Run {
        /// Scene script (.spl or .jsonl)
        input: PathBuf,

        /// Path to spl.toml (default: discovered from the working directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Strict mode: treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Max objects recomputed per tick (0 = drain everything)
        #[arg(long)]
        budget: Option<usize>,

        /// Evaluate recompute batches in parallel
        #[arg(long)]
        parallel: bool,
    },
    /// Check scene scripts for syntax errors and dangling references
    Validate {
        /// Scene scripts to check
        files: Vec<PathBuf>,

        /// Also check every scene script under this directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Path to spl.toml (default: discovered from the working directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Strict mode: treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a scene and draw the final connection state of a grid
    Show {
        /// Scene script (.spl or .jsonl)
        input: PathBuf,

        /// Grid to draw
        #[arg(long, default_value = "0")]
        grid: u32,

        /// Path to spl.toml (default: discovered from the working directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { input, config, json, strict, budget, parallel } => {
            let overrides = CliOverrides {
                budget,
                strict: strict.then_some(true),
                parallel: parallel.then_some(true),
                json: json.then_some(true),
            };
            run::run_scene(&input, config.as_deref(), &overrides)
        }
        Commands::Validate { files, dir, config, strict, json } => {
            validate::run_validate(&files, dir.as_deref(), config.as_deref(), strict, json)
        }
        Commands::Show { input, grid, config } => show::run_show(&input, grid, config.as_deref()),
    }
}
