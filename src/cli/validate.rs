//! `spl validate`: syntax and reference checks for scene scripts

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{load_config, merge_cli_overrides, CliOverrides};
use crate::parser::parse_stream;
use crate::scene::{SceneOptions, SceneRunner};

use super::{find_scene_files, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Problems found in one file.
#[derive(Debug, Default)]
struct FileReport {
    path: PathBuf,
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn check_file(path: &Path, options: SceneOptions, strict: bool) -> FileReport {
    let mut report = FileReport { path: path.to_path_buf(), ..Default::default() };

    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            report.errors.push(format!("cannot read: {}", e));
            return report;
        }
    };
    let parsed = parse_stream(file);
    for w in &parsed.warnings {
        report.errors.push(format!("line {}: {}", w.line, w.message));
    }

    // Replay leniently to surface dangling references without stopping early.
    let mut lenient = options;
    lenient.connect.strict = false;
    let mut runner = SceneRunner::new(lenient);
    if let Err(e) = runner.run(&parsed.entries) {
        report.errors.push(e.to_string());
    }
    let (outcome, _) = runner.finish();
    let mut messages: Vec<String> = outcome
        .warnings
        .iter()
        .map(|w| format!("line {}: {}", w.line, w.message))
        .collect();
    for tick in &outcome.ticks {
        messages.extend(tick.warnings.iter().map(|w| format!("tick {}: {}", tick.tick, w.message)));
    }

    if strict {
        report.errors.extend(messages);
    } else {
        report.warnings.extend(messages);
    }
    report
}

/// Execute the validate command
pub fn run_validate(
    files: &[PathBuf],
    dir: Option<&Path>,
    config: Option<&Path>,
    strict: bool,
    json: bool,
) -> ExitCode {
    let mut config = match load_config(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    let overrides = CliOverrides { strict: strict.then_some(true), ..Default::default() };
    merge_cli_overrides(&mut config, &overrides);
    let options = config.scene_options();
    let strict = config.connect.strict;

    let mut all_files: Vec<PathBuf> = files.to_vec();
    if let Some(dir) = dir {
        all_files.extend(find_scene_files(dir));
    }

    if all_files.is_empty() {
        eprintln!("Error: No scene files to validate");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let reports: Vec<FileReport> = all_files.iter().map(|f| check_file(f, options, strict)).collect();
    let failed = reports.iter().any(|r| !r.errors.is_empty());

    if json {
        let value = serde_json::json!({
            "valid": !failed,
            "files": reports.iter().map(|r| serde_json::json!({
                "path": r.path.display().to_string(),
                "errors": r.errors,
                "warnings": r.warnings,
            })).collect::<Vec<_>>(),
        });
        println!("{}", value);
    } else {
        for r in &reports {
            if r.errors.is_empty() && r.warnings.is_empty() {
                println!("{}: ok", r.path.display());
                continue;
            }
            for e in &r.errors {
                println!("{}: error: {}", r.path.display(), e);
            }
            for w in &r.warnings {
                println!("{}: warning: {}", r.path.display(), w);
            }
        }
    }

    if failed {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
