// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors
//
// medialink CLI - Discovery Command Tests
//
// TESTING LAYERS:
//
// Layer 1 (Unit Tests - No hardware required):
//   - Help text and command structure
//   - Invalid argument handling
//   - Empty and inaccessible device directories via --root
//
// Layer 3 (Hardware Integration - Requires V4L2 devices):
//   - Device listing against /dev
//   - End-to-end pairing
//
// RUN LAYER 1:
//   cargo test --test cli
//
// RUN LAYER 3 (on hardware):
//   cargo test --test cli -- --ignored --nocapture

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;

/// Helper to create a Command for the medialink binary
fn medialink_cmd() -> Command {
    Command::cargo_bin("medialink").expect("binary built")
}

/// Empty scratch directory standing in for a device namespace
fn empty_root(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("medialink-cli-{}-{}", tag, std::process::id()));
    let _ = fs::remove_dir_all(&path);
    fs::create_dir_all(&path).expect("scratch dir");
    path
}

// =============================================================================
// Layer 1: Basic Command Tests (No Hardware Required)
// =============================================================================

#[test]
fn test_devices_help() {
    medialink_cmd()
        .args(["devices", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--root"))
        .stdout(predicate::str::contains("--m2m"))
        .stdout(predicate::str::contains("--capture"))
        .stdout(predicate::str::contains("--long"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_pair_help() {
    medialink_cmd()
        .args(["pair", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--root"))
        .stdout(predicate::str::contains("--m2m"))
        .stdout(predicate::str::contains("--capture"))
        .stdout(predicate::str::contains("--output"));
}

#[test]
fn test_unknown_subcommand_fails() {
    medialink_cmd()
        .arg("frobnicate")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_devices_empty_root() {
    let root = empty_root("devices-empty");
    medialink_cmd()
        .args(["devices", "--root"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Video Devices (0 found)"));
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn test_devices_empty_root_json() {
    let root = empty_root("devices-json");
    let output = medialink_cmd()
        .args(["--json", "devices", "--root"])
        .arg(&root)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON output");
    assert_eq!(parsed["total"], 0);
    assert!(parsed["devices"].as_array().unwrap().is_empty());
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn test_devices_missing_root_exit_code() {
    medialink_cmd()
        .args(["devices", "--root", "/nonexistent-medialink-cli"])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("inaccessible"));
}

#[test]
fn test_pair_empty_root_exit_code() {
    let root = empty_root("pair-empty");
    medialink_cmd()
        .args(["pair", "--root"])
        .arg(&root)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("No device found"));
    let _ = fs::remove_dir_all(&root);
}

// =============================================================================
// Layer 3: Hardware Tests (Requires V4L2 Devices)
// =============================================================================

#[test]
#[serial]
#[ignore = "requires V4L2 devices (run with --ignored on hardware)"]
fn test_devices_list() {
    medialink_cmd()
        .arg("devices")
        .assert()
        .success()
        .stdout(predicate::str::contains("Video Devices"));
}

#[test]
#[serial]
#[ignore = "requires V4L2 devices (run with --ignored on hardware)"]
fn test_devices_list_json() {
    let output = medialink_cmd()
        .args(["--json", "devices"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON output");
    assert!(parsed["total"].is_number());
}

#[test]
#[serial]
#[ignore = "requires an M2M device with a media controller (run with --ignored on hardware)"]
fn test_pair_m2m() {
    medialink_cmd()
        .args(["pair", "--m2m"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Video: /dev/video"));
}
