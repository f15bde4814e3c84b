//! End-to-end tests driving the `casebook` binary.

use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn casebook(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_casebook"))
        .args(args)
        .env("USER_NAME", "field_worker")
        .env("USER_ORG", "UNICEF")
        .env("CASEBOOK_PRETTY", "false")
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path_str(&path)
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn new_then_short_id() {
    let dir = TempDir::new().unwrap();
    let content = write(&dir, "content.json", r#"{"enquirer_name": "Kato", "notes": "   "}"#);

    let created = stdout_json(&casebook(&["new", &content]));
    assert_eq!(created["enquirer_name"], "Kato");
    assert!(created.get("notes").is_none());
    assert_eq!(created["created_by"], "field_worker");
    assert_eq!(created["synced"], false);

    let unique_id = created["unique_identifier"].as_str().unwrap().to_string();
    let record = write(&dir, "record.json", &created.to_string());
    let short = stdout_json(&casebook(&["short-id", &record]));
    assert_eq!(short["unique_identifier"], unique_id.as_str());
    assert!(unique_id.ends_with(short["short_id"].as_str().unwrap()));
    assert_eq!(short["short_id"].as_str().unwrap().chars().count(), 7);
}

#[test]
fn reconcile_attributes_to_configured_user() {
    let dir = TempDir::new().unwrap();
    let current = write(
        &dir,
        "current.json",
        r#"{"name": "Amy K.", "age": 7,
            "histories": [{"datetime": "2000-01-01 00:00:00", "changes": {}},
                          {"datetime": "2099-01-01 00:00:00", "changes": {}}]}"#,
    );
    let previous = write(
        &dir,
        "previous.json",
        r#"{"name": "Amy", "age": 7, "last_synced_at": "2024-06-01 11:00:00"}"#,
    );

    let histories = stdout_json(&casebook(&["reconcile", &current, &previous]));
    let entries = histories.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["changes"], serde_json::json!({}));
    assert_eq!(entries[1]["changes"]["name"]["from"], "Amy");
    assert_eq!(entries[1]["changes"]["name"]["to"], "Amy K.");
    assert!(entries[1]["changes"].get("age").is_none());
    assert_eq!(entries[1]["user_name"], "field_worker");
    assert_eq!(entries[1]["user_organisation"], "UNICEF");
}

#[test]
fn values_for_child_kind() {
    let dir = TempDir::new().unwrap();
    let record = write(
        &dir,
        "child.json",
        r#"{"_id": "c-1", "_rev": "2-a", "name": "Tom", "histories": []}"#,
    );

    let values = stdout_json(&casebook(&["values", "child", &record]));
    assert_eq!(values, serde_json::json!({"name": "Tom"}));
}

#[test]
fn usage_errors_exit_with_two() {
    let output = casebook(&["frobnicate"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("casebook new"));
}

#[test]
fn corrupt_input_fails() {
    let dir = TempDir::new().unwrap();
    let record = write(&dir, "bad.json", "[1, 2, 3]");

    let output = casebook(&["short-id", &record]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
