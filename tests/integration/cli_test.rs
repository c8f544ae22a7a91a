//! Integration tests for the pcdseq binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

use crate::helpers::{fixtures_dir, write_frames};

/// pcdseq command isolated from the user's config file.
fn pcdseq(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pcdseq").expect("binary should be built");
    cmd.arg("--config")
        .arg(config_dir.path().join("config.toml"))
        .env("NO_COLOR", "1");
    cmd
}

fn dir_arg(dir: &Path) -> String {
    dir.display().to_string()
}

// ============================================================================
// Help
// ============================================================================

#[test]
fn help_shows_about() {
    let config = TempDir::new().unwrap();
    pcdseq(&config)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("PCD point cloud frames"));
}

#[test]
fn play_help_lists_interactive_commands() {
    let config = TempDir::new().unwrap();
    pcdseq(&config)
        .args(["play", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("INTERACTIVE COMMANDS"))
        .stdout(predicate::str::contains("--loop"));
}

// ============================================================================
// list
// ============================================================================

#[test]
fn list_shows_sorted_frames() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();
    write_frames(frames.path(), 3);

    pcdseq(&config)
        .args(["list", &dir_arg(frames.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sequence: 3 frames"))
        .stdout(
            predicate::str::is_match(r"(?s)frame_000\.pcd.*frame_001\.pcd.*frame_002\.pcd")
                .unwrap(),
        );
}

#[test]
fn list_empty_directory_says_so() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();

    pcdseq(&config)
        .args(["list", &dir_arg(frames.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("No files matching"));
}

#[test]
fn list_missing_directory_fails() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();

    pcdseq(&config)
        .args(["list", &dir_arg(&frames.path().join("missing"))])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to list sequence"));
}

// ============================================================================
// play
// ============================================================================

#[test]
fn play_runs_through_once_and_stops() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();
    write_frames(frames.path(), 3);

    pcdseq(&config)
        .args(["play", &dir_arg(frames.path()), "--interval-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("pcdseq\n"))
        .stdout(predicate::str::contains(
            "[1] frame 1/3 frame_000.pcd: loaded 1 record(s)",
        ))
        .stdout(predicate::str::contains("show coordinate system"))
        .stdout(predicate::str::contains("show xyz cloud (1 points)"))
        .stdout(predicate::str::contains("update xyz cloud (3 points)"))
        .stdout(predicate::str::contains(
            "[4] end of sequence (end, frame 3/3 frame_002.pcd)",
        ))
        .stdout(predicate::str::contains("[5]").not());
}

#[test]
fn play_loop_wraps_for_the_requested_ticks() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();
    write_frames(frames.path(), 3);

    pcdseq(&config)
        .args([
            "play",
            &dir_arg(frames.path()),
            "--loop",
            "--ticks",
            "5",
            "--interval-ms",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[4] end of sequence, looping"))
        .stdout(predicate::str::contains(
            "[4] frame 1/3 frame_000.pcd: loaded 1 record(s)",
        ))
        .stdout(predicate::str::contains("[5] frame 2/3"))
        .stdout(predicate::str::contains("[6]").not());
}

#[test]
fn play_reverse_starts_at_first_frame_and_ends_at_start() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();
    write_frames(frames.path(), 2);

    pcdseq(&config)
        .args(["play", &dir_arg(frames.path()), "--reverse", "--interval-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1] frame 1/2"))
        .stdout(predicate::str::contains("[2] end of sequence (start, frame 1/2"));
}

#[test]
fn play_json_emits_one_object_per_tick() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();
    write_frames(frames.path(), 3);

    let output = pcdseq(&config)
        .args([
            "play",
            &dir_arg(frames.path()),
            "--json",
            "--ticks",
            "2",
            "--interval-ms",
            "0",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let ticks: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(ticks.len(), 2);
    assert_eq!(ticks[0]["outcome"], "loaded");
    assert_eq!(ticks[0]["index"], 0);
    assert_eq!(ticks[0]["frames"], 3);
    assert_eq!(ticks[0]["clouds"][0]["kind"], "xyz");
    assert_eq!(ticks[0]["clouds"][0]["points"], 1);
    assert_eq!(ticks[1]["index"], 1);
    assert_eq!(ticks[1]["clouds"][0]["action"], "update");
    assert_eq!(ticks[1]["end_of_sequence"], false);
}

#[test]
fn play_color_kind_from_rgb_frames() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();
    fs::copy(
        fixtures_dir().join("frame_xyzrgb.pcd"),
        frames.path().join("frame_000.pcd"),
    )
    .unwrap();

    pcdseq(&config)
        .args([
            "play",
            &dir_arg(frames.path()),
            "--kinds",
            "xyz,xyzrgb",
            "--interval-ms",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded 2 record(s)"))
        .stdout(predicate::str::contains("show xyzrgb cloud (2 points)"));
}

#[test]
fn play_reports_undecodable_kind_without_failing() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();
    write_frames(frames.path(), 1);

    pcdseq(&config)
        .args([
            "play",
            &dir_arg(frames.path()),
            "--kinds",
            "xyzrgb",
            "--interval-ms",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded 0 record(s), 1 failed"))
        .stderr(predicate::str::contains("Cannot read cloud"));
}

#[test]
fn play_empty_directory_exits_cleanly() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();

    pcdseq(&config)
        .args(["play", &dir_arg(frames.path()), "--interval-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1] no frames matching"))
        .stderr(predicate::str::contains("Empty sequence!"));
}

#[test]
fn play_hold_publishes_nothing() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();
    write_frames(frames.path(), 2);

    pcdseq(&config)
        .args(["play", &dir_arg(frames.path()), "--hold", "--interval-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1] frame 1/2 frame_000.pcd: held"))
        .stdout(predicate::str::contains("show xyz cloud").not());
}

#[test]
fn play_interactive_quits_on_q() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();
    write_frames(frames.path(), 2);

    pcdseq(&config)
        .args([
            "play",
            &dir_arg(frames.path()),
            "--interactive",
            "--manual",
            "--interval-ms",
            "5",
        ])
        .write_stdin("q\n")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("pcdseq\n"));
}

#[test]
fn play_quiet_suppresses_info_logs() {
    let config = TempDir::new().unwrap();
    let frames = TempDir::new().unwrap();

    pcdseq(&config)
        .args(["play", &dir_arg(frames.path()), "-q", "--interval-ms", "0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Empty sequence!").not());
}

// ============================================================================
// inspect
// ============================================================================

#[test]
fn inspect_prints_header_summary() {
    let config = TempDir::new().unwrap();
    pcdseq(&config)
        .arg("inspect")
        .arg(fixtures_dir().join("frame_xyzrgb.pcd"))
        .assert()
        .success()
        .stdout(predicate::str::contains("2 x 1 (2 points)"))
        .stdout(predicate::str::contains("Kinds:     xyz, xyzrgb"))
        .stdout(predicate::str::contains("rgb"));
}

#[test]
fn inspect_json_has_header_and_kinds() {
    let config = TempDir::new().unwrap();
    let output = pcdseq(&config)
        .arg("inspect")
        .arg(fixtures_dir().join("frame_xyz.pcd"))
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["header"]["points"], 3);
    assert_eq!(value["header"]["data"], "ascii");
    assert_eq!(value["header"]["fields"][0]["type"], "F");
    assert_eq!(value["kinds"], serde_json::json!(["xyz"]));
    assert_eq!(value["bounds"]["max"][1], 3.0);
}

#[test]
fn inspect_broken_file_fails() {
    let config = TempDir::new().unwrap();
    pcdseq(&config)
        .arg("inspect")
        .arg(fixtures_dir().join("broken.pcd"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse PCD file"));
}

// ============================================================================
// config and completions
// ============================================================================

#[test]
fn config_path_uses_explicit_file() {
    let config = TempDir::new().unwrap();
    pcdseq(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let config = TempDir::new().unwrap();
    pcdseq(&config)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));
    assert!(config.path().join("config.toml").exists());

    pcdseq(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    pcdseq(&config)
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn config_show_reflects_file() {
    let config = TempDir::new().unwrap();
    fs::write(
        config.path().join("config.toml"),
        "[mode]\nloop = true\n\n[viewer]\ntitle = \"bench\"\n",
    )
    .unwrap();

    pcdseq(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("loop = true"))
        .stdout(predicate::str::contains("title = \"bench\""));
}

#[test]
fn invalid_config_is_rejected() {
    let config = TempDir::new().unwrap();
    fs::write(
        config.path().join("config.toml"),
        "[logging]\nlevel = \"loud\"\n",
    )
    .unwrap();

    pcdseq(&config)
        .args(["list", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config"));
}

#[test]
fn completions_generate_script() {
    let config = TempDir::new().unwrap();
    pcdseq(&config)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pcdseq"));
}
