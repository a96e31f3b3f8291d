//! CLI integration tests for the `spl` binary.
//!
//! Replays the scene fixtures under `tests/scenes/` through `spl run`,
//! `spl validate` and `spl show`, checking text output, JSON output and
//! exit codes.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run spl with the given arguments and return (stdout, stderr, exit code).
///
/// The working directory and XDG config home point at an empty temp dir so
/// no stray `spl.toml` is discovered.
fn run_spl(args: &[&str]) -> (String, String, i32) {
    let isolated = TempDir::new().unwrap();
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    let args: Vec<String> = args
        .iter()
        .map(|a| {
            if a.starts_with("tests/") {
                manifest.join(a).display().to_string()
            } else {
                a.to_string()
            }
        })
        .collect();
    let output = Command::new(env!("CARGO_BIN_EXE_spl"))
        .args(&args)
        .current_dir(isolated.path())
        .env("XDG_CONFIG_HOME", isolated.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute spl");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code().unwrap_or(-1))
}

// ============================================================================
// spl run
// ============================================================================

#[test]
fn test_run_wall_pair_text() {
    let (stdout, _, code) = run_spl(&["run", "tests/scenes/wall_pair.spl"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("tick 1 (line 5): 2 recomputed, 0 stale, 0 pending"), "{}", stdout);
    assert!(stdout.contains("#1 walls/solid (0, 0) E:1 W:0 N:0 S:0 mask=2 state=solid2"));
    assert!(stdout.contains("#2 walls/solid (32, 0) E:0 W:1 N:0 S:0 mask=8 state=solid8"));
}

#[test]
fn test_run_moving_wall_json() {
    let (stdout, _, code) = run_spl(&["run", "tests/scenes/moving_wall.spl", "--json"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let ticks = json["ticks"].as_array().expect("ticks array");
    assert_eq!(ticks.len(), 3);

    let state_of = |tick: &serde_json::Value, id: u64| -> String {
        tick["objects"]
            .as_array()
            .unwrap()
            .iter()
            .find(|o| o["id"] == id)
            .map(|o| o["state"].as_str().unwrap().to_string())
            .unwrap_or_default()
    };

    // Corner piece joined east and north.
    assert_eq!(state_of(&ticks[0], 1), "solid3");

    // After the move the old neighbors lose their link and glass stays apart.
    assert_eq!(ticks[1]["line"], 14);
    assert_eq!(state_of(&ticks[1], 1), "solid1");
    assert_eq!(state_of(&ticks[1], 2), "solid0");
    assert_eq!(state_of(&ticks[1], 3), "solid0");
    assert_eq!(state_of(&ticks[1], 5), "glass0");

    // The despawned column piece is skipped as stale.
    assert_eq!(ticks[2]["stale"], 1);
    assert_eq!(state_of(&ticks[2], 1), "solid0");
}

#[test]
fn test_run_budget_adds_trailing_ticks() {
    let (stdout, _, code) = run_spl(&["run", "tests/scenes/plus.jsonl", "--budget", "2", "--json"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let ticks = json["ticks"].as_array().unwrap();
    assert_eq!(ticks.len(), 3);
    assert_eq!(ticks[0]["remaining"], 3);
    assert_eq!(ticks[2]["line"], 0);
    assert_eq!(ticks[2]["remaining"], 0);
}

#[test]
fn test_run_budget_from_config() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("spl.toml");
    fs::write(&config, "[connect]\nbudget = 4\n\n[output]\nformat = \"json\"\n").unwrap();

    let (stdout, _, code) =
        run_spl(&["run", "tests/scenes/plus.jsonl", "--config", config.to_str().unwrap()]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["ticks"].as_array().unwrap().len(), 2);
}

#[test]
fn test_run_invalid_config() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("spl.toml");
    fs::write(&config, "[output]\nformat = \"yaml\"\n").unwrap();

    let (_, stderr, code) =
        run_spl(&["run", "tests/scenes/plus.jsonl", "--config", config.to_str().unwrap()]);
    assert_eq!(code, 2);
    assert!(stderr.contains("format"), "{}", stderr);
}

#[test]
fn test_run_dangling_lenient_and_strict() {
    let (stdout, _, code) = run_spl(&["run", "tests/scenes/dangling.spl"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("warning: line 3: unknown object #7"), "{}", stdout);

    let (_, stderr, code) = run_spl(&["run", "tests/scenes/dangling.spl", "--strict"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("line 3"), "{}", stderr);
}

#[test]
fn test_run_parallel_matches_serial() {
    let (serial, _, _) = run_spl(&["run", "tests/scenes/moving_wall.spl", "--json"]);
    let (parallel, _, code) =
        run_spl(&["run", "tests/scenes/moving_wall.spl", "--json", "--parallel"]);
    assert_eq!(code, 0);
    assert_eq!(serial, parallel);
}

#[test]
fn test_run_missing_file() {
    let (_, stderr, code) = run_spl(&["run", "tests/scenes/does_not_exist.spl"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Cannot read scene"), "{}", stderr);
}

// ============================================================================
// spl validate
// ============================================================================

#[test]
fn test_validate_clean_files() {
    let (stdout, _, code) =
        run_spl(&["validate", "tests/scenes/wall_pair.spl", "tests/scenes/plus.jsonl"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.matches(": ok").count(), 2, "{}", stdout);
}

#[test]
fn test_validate_dangling_strict_fails() {
    let (stdout, _, code) = run_spl(&["validate", "tests/scenes/dangling.spl"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("warning: line 3: unknown object #7"));

    let (stdout, _, code) = run_spl(&["validate", "tests/scenes/dangling.spl", "--strict", "--json"]);
    assert_eq!(code, 1);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["files"][0]["errors"].as_array().unwrap().len(), 1);
}

#[test]
fn test_validate_dir() {
    let (stdout, _, code) = run_spl(&["validate", "--dir", "tests/scenes", "--json"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["files"].as_array().unwrap().len(), 4);
}

#[test]
fn test_validate_syntax_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.spl");
    fs::write(&path, "{\"type\": \"grid\", \"id\": 0}\n{\"type\": \"spawn\", \"id\": }\n").unwrap();

    let (stdout, _, code) = run_spl(&["validate", path.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stdout.contains("error: line 2:"), "{}", stdout);
}

#[test]
fn test_validate_nothing_to_check() {
    let temp = TempDir::new().unwrap();
    let (_, stderr, code) = run_spl(&["validate", "--dir", temp.path().to_str().unwrap()]);
    assert_eq!(code, 2);
    assert!(stderr.contains("No scene files"));
}

// ============================================================================
// spl show
// ============================================================================

#[test]
fn test_show_plus() {
    let (stdout, _, code) = run_spl(&["show", "tests/scenes/plus.jsonl"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, ".╷.\n╶┼╴\n.╵.\n");
}

#[test]
fn test_show_scaled_grid() {
    let (stdout, _, code) = run_spl(&["show", "tests/scenes/wall_pair.spl"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "╶╴\n");
}

#[test]
fn test_show_empty_grid() {
    let (_, stderr, code) = run_spl(&["show", "tests/scenes/plus.jsonl", "--grid", "3"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nothing placed on grid#3"), "{}", stderr);
}

#[test]
fn test_show_refuses_huge_span() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("far.spl");
    fs::write(
        &path,
        "{\"type\": \"grid\", \"id\": 0}\n\
         {\"type\": \"spawn\", \"id\": 1, \"key\": \"wall\", \"at\": [0, 0]}\n\
         {\"type\": \"spawn\", \"id\": 2, \"key\": \"wall\", \"at\": [2000000, 2000]}\n",
    )
    .unwrap();

    let (stdout, stderr, code) = run_spl(&["show", path.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("spans 2000001x2001 tiles"), "{}", stderr);
}

#[test]
fn test_run_at_coordinate_limit() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("edge.spl");
    fs::write(
        &path,
        "{\"type\": \"grid\", \"id\": 0}\n\
         {\"type\": \"spawn\", \"id\": 1, \"key\": \"wall\", \"at\": [9223372036854775807, 0]}\n\
         {\"type\": \"spawn\", \"id\": 2, \"key\": \"wall\", \"at\": [9223372036854775806, 0]}\n",
    )
    .unwrap();

    let (stdout, stderr, code) = run_spl(&["run", path.to_str().unwrap()]);
    assert_eq!(code, 0, "{}", stderr);
    assert!(stdout.contains("#1 wall (9223372036854775807, 0) E:0 W:1"), "{}", stdout);
}

#[test]
fn test_validate_reads_config() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("spl.toml");
    fs::write(&config, "[connect]\nstrict = true\n").unwrap();

    let (stdout, _, code) = run_spl(&[
        "validate",
        "tests/scenes/dangling.spl",
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(code, 1);
    assert!(stdout.contains("error: line 3: unknown object #7"), "{}", stdout);
}
