// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the `companion` binary against temp files.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::json;

fn companion(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_companion"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run companion")
}

fn write_dataset(path: &Path, examples: usize) {
    let lines: Vec<String> = (0..examples)
        .map(|i| {
            json!({"messages": [
                {"role": "system", "content": "You are a warm companion."},
                {"role": "user", "content": format!("How was day {i}?")},
                {"role": "assistant", "content": "It was lovely, thanks for asking."},
            ]})
            .to_string()
        })
        .collect();
    std::fs::write(path, lines.join("\n") + "\n").unwrap();
}

#[test]
fn config_init_then_validate_dataset() {
    let dir = tempfile::tempdir().unwrap();

    let init = companion(dir.path(), &["config", "init", "custom.toml"]);
    assert!(init.status.success(), "{}", String::from_utf8_lossy(&init.stderr));
    assert!(dir.path().join("custom.toml").exists());

    write_dataset(&dir.path().join("train.jsonl"), 12);
    let output = companion(
        dir.path(),
        &["--config", "custom.toml", "dataset", "validate", "train.jsonl"],
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("valid: 12 examples"), "got: {stdout}");
}

#[test]
fn small_dataset_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("train.jsonl"), 3);

    let output = companion(dir.path(), &["dataset", "validate", "train.jsonl"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("must have at least 10 examples"), "got: {stderr}");
}

#[test]
fn cost_estimate_is_printed() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(&dir.path().join("train.jsonl"), 10);

    let output = companion(dir.path(), &["dataset", "cost", "train.jsonl"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("estimated cost: $"), "got: {stdout}");
    assert!(stdout.contains("x 10 epochs"), "got: {stdout}");
}

#[test]
fn window_prints_kept_messages() {
    let dir = tempfile::tempdir().unwrap();
    let conversation = json!([
        {"role": "system", "content": "You are a warm companion."},
        {"role": "user", "content": "Tell me about your day in great detail please."},
        {"role": "assistant", "content": "It was lovely."},
        {"role": "user", "content": "Nice!"},
    ]);
    std::fs::write(dir.path().join("conversation.json"), conversation.to_string()).unwrap();

    let output = companion(
        dir.path(),
        &["window", "conversation.json", "--limit", "30"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let kept: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(!kept.is_empty() && kept.len() < 4, "kept {kept:?}");
    assert_eq!(kept.last().unwrap()["content"], "Nice!");
}

#[test]
fn empty_window_reports_zero_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let conversation = json!([{"role": "user", "content": "Hello there"}]);
    std::fs::write(dir.path().join("conversation.json"), conversation.to_string()).unwrap();

    let output = companion(dir.path(), &["window", "conversation.json", "--limit", "0"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    assert!(stderr.contains("kept 0 of 1 messages (0 of 0 tokens)"), "got: {stderr}");
}

#[test]
fn config_typo_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("companion.toml"),
        "[chat]\nendpiont = \"http://localhost\"\n",
    )
    .unwrap();

    let output = companion(dir.path(), &["dataset", "cost", "train.jsonl"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("endpoint"), "got: {stderr}");
}
