use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn paddock(workspace: &Path) -> Command {
    let mut cmd = Command::cargo_bin("paddock").unwrap();
    cmd.current_dir(workspace)
        .env("PADDOCK_HEADLESS", "1")
        .env_remove("RUST_LOG")
        .env_remove("PADDOCK_STORAGE_BUCKET")
        .env_remove("PADDOCK_MAX_UPLOAD_BYTES")
        .env_remove("PADDOCK_ORPHAN_TTL_HOURS")
        .env_remove("PADDOCK_LOG_DIR")
        .env_remove("PADDOCK_LOG_LEVEL");
    cmd
}

fn write_script(dir: &Path, script: Value) -> std::path::PathBuf {
    let path = dir.join("session.json");
    fs::write(&path, serde_json::to_string_pretty(&script).unwrap()).unwrap();
    path
}

fn committing_script() -> Value {
    json!({
        "tenant_id": "00000000-0000-0000-0000-000000000001",
        "existing_horses": [
            {"tenant_id": "00000000-0000-0000-0000-000000000001", "name": "Comet"}
        ],
        "actions": [
            {"action": "next"},
            {"action": "patch", "patch": {"field": "name", "value": "comet "}},
            {"action": "find_duplicates"},
            {"action": "patch", "patch": {"field": "name", "value": "Comet II"}},
            {"action": "patch", "patch": {"field": "category", "value": "sport"}},
            {"action": "next"},
            {"action": "next"},
            {"action": "next"},
            {"action": "next"},
            {"action": "add_owner", "holder_id": "00000000-0000-0000-0000-00000000000a"},
            {"action": "add_owner", "holder_id": "00000000-0000-0000-0000-00000000000b"},
            {"action": "next"},
            {"action": "upload", "files": [
                {"filename": "front.jpg", "mime_type": "image/jpeg", "content": "jpeg"}
            ]},
            {"action": "next"},
            {"action": "commit"}
        ]
    })
}

#[test]
fn test_replay_commits_session() {
    let workspace = TempDir::new().unwrap();
    let script = write_script(workspace.path(), committing_script());

    let output = paddock(workspace.path())
        .arg("replay")
        .arg(&script)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["outcome"]["status"], json!("committed"));
    assert_eq!(report["tables"]["horses"], json!(2));
    assert_eq!(report["tables"]["horse_owners"], json!(2));
    assert_eq!(report["tables"]["media_assets"], json!(1));
    assert_eq!(report["objects"], json!(1));
    assert_eq!(report["events"][2]["detail"][0]["name"], json!("Comet"));
    assert!(report["events"]
        .as_array()
        .unwrap()
        .iter()
        .all(|event| event["ok"] == json!(true)));
}

#[test]
fn test_replay_failure_exits_non_zero_with_report() {
    let workspace = TempDir::new().unwrap();
    let script = write_script(
        workspace.path(),
        json!({
            "tenant_id": "00000000-0000-0000-0000-000000000001",
            "actions": [
                {"action": "commit"},
                {"action": "back"}
            ]
        }),
    );

    paddock(workspace.path())
        .arg("replay")
        .arg(&script)
        .arg("--pretty")
        .assert()
        .failure()
        .stdout(predicate::str::contains("WIZ-COMMIT-001"))
        .stdout(predicate::str::contains("WIZ-NAV-002"))
        .stderr(predicate::str::contains("2 replay action(s) failed"));
}

#[test]
fn test_replay_injected_fault_degrades_commit() {
    let workspace = TempDir::new().unwrap();
    let mut script = committing_script();
    script["faults"] = json!([{"op": "create", "target": "horse_owners", "after": 1}]);
    let script = write_script(workspace.path(), script);

    let output = paddock(workspace.path())
        .arg("replay")
        .arg(&script)
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["outcome"]["status"], json!("committed_with_warnings"));
    assert_eq!(
        report["outcome"]["warnings"][0]["kind"],
        json!("ownership_insert_failed")
    );
    assert_eq!(report["tables"]["horse_owners"], json!(1));
}

#[test]
fn test_replay_rejects_unreadable_script() {
    let workspace = TempDir::new().unwrap();
    paddock(workspace.path())
        .arg("replay")
        .arg(workspace.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read replay script"));
}

#[test]
fn test_replay_uses_workspace_config() {
    let workspace = TempDir::new().unwrap();
    fs::write(
        workspace.path().join("paddock.toml"),
        "[tables]\nhorses = \"patients\"\n",
    )
    .unwrap();
    let script = write_script(workspace.path(), committing_script());

    let output = paddock(workspace.path())
        .arg("replay")
        .arg(&script)
        .arg("--workspace")
        .arg(workspace.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["tables"]["patients"], json!(2));
    assert_eq!(report["outcome"]["entity"]["table"], json!("patients"));
}

#[test]
fn test_check_config_prints_effective_config() {
    let workspace = TempDir::new().unwrap();
    paddock(workspace.path())
        .arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("bucket = \"horse-media\""))
        .stdout(predicate::str::contains("PADDOCK_ORPHAN_TTL_HOURS"));
}

#[test]
fn test_check_config_rejects_invalid_file() {
    let workspace = TempDir::new().unwrap();
    let config = workspace.path().join("paddock.toml");
    fs::write(&config, "[storage]\norphan_ttl_hours = 0\n").unwrap();
    paddock(workspace.path())
        .arg("check-config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("WIZ-CFG-002"));
}

#[test]
fn test_help_lists_commands() {
    let workspace = TempDir::new().unwrap();
    paddock(workspace.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("check-config"));
}
