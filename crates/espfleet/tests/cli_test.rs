//! Integration tests for the `espfleet` CLI binary.
//!
//! These tests validate argument parsing, catalog and metric output,
//! config management, and a full `run` against a mock tracker.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `espfleet` binary with env isolation.
///
/// Clears all `ESPFLEET_*` env vars and points config directories into
/// `home` so tests never touch the user's real configuration.
fn espfleet_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("espfleet");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("ESPFLEET_CONFIG")
        .env_remove("ESPFLEET_MANIFEST")
        .env_remove("ESPFLEET_OUTPUT")
        .env_remove("ESPFLEET_NO_TELEMETRY")
        .env_remove("ESPFLEET_TELEMETRY__HOST")
        .env_remove("ESPFLEET_TELEMETRY__ENABLED")
        .env_remove("ESPFLEET_FLEET__LANGUAGE");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

const MANIFEST: &str = r#"{
    "id": "nl.joolee.homey.espeasy",
    "capabilities": {
        "measure_signal_strength": { "title": { "en": "Signal strength" }, "type": "number", "setable": false }
    },
    "drivers": [
        { "id": "switch", "taskTypes": [ { "plugin": 1, "name": "Switch input - Switch" } ] },
        { "id": "temp", "taskTypes": [
            { "plugin": 30, "name": "Environment - BMP280" },
            { "plugin": 4, "name": "Environment - DS18b20" }
        ] },
        { "id": "unit" }
    ]
}"#;

const FLEET: &str = r#"{
    "units": [
        {
            "name": "kitchen",
            "tasks": [
                { "index": 1, "pluginId": 4, "name": "Environment - DS18b20" },
                { "index": 2, "pluginId": 26, "name": "Generic - System Info" }
            ],
            "sensors": [ { "taskIndex": 1, "name": "Kitchen temperature" } ],
            "gpios": [ { "pin": 4 } ]
        },
        {
            "name": "garage",
            "tasks": [ { "index": 1, "pluginId": 1, "name": "Switch input - Switch", "isSensor": true } ],
            "sensors": [ { "taskIndex": 1, "name": "Garage door" } ],
            "gpios": [ { "pin": 12 }, { "pin": 13 }, { "pin": 14 } ]
        },
        {
            "name": "attic",
            "online": false,
            "tasks": [ { "index": 1, "pluginId": 4, "name": "Environment - DS18b20" } ],
            "gpios": [ { "pin": 2 } ]
        }
    ]
}"#;

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = espfleet_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    espfleet_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("ESPEasy")
                .and(predicate::str::contains("capabilities"))
                .and(predicate::str::contains("tasks"))
                .and(predicate::str::contains("run")),
        );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    espfleet_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("espfleet"));
}

#[test]
fn test_completions_zsh() {
    let home = TempDir::new().unwrap();
    espfleet_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_subcommand() {
    let home = TempDir::new().unwrap();
    let output = espfleet_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("foobar"));
}

// ── Catalogs ────────────────────────────────────────────────────────

#[test]
fn test_tasks_sorted_with_system_info_first() {
    let home = TempDir::new().unwrap();
    let manifest = write(&home, "app.json", MANIFEST);

    let output = espfleet_cmd(home.path())
        .arg("--manifest")
        .arg(&manifest)
        .args(["tasks", "-o", "plain"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).lines().collect::<Vec<_>>(),
        [
            "26 - Generic - System Info",
            "1 - Switch input - Switch",
            "4 - Environment - DS18b20",
            "30 - Environment - BMP280",
        ]
    );
}

#[test]
fn test_tasks_without_manifest_lists_only_system_info() {
    let home = TempDir::new().unwrap();
    espfleet_cmd(home.path())
        .args(["tasks", "-o", "plain"])
        .assert()
        .success()
        .stdout("26 - Generic - System Info\n");
}

#[test]
fn test_capabilities_list_includes_manifest_overrides() {
    let home = TempDir::new().unwrap();
    let manifest = write(&home, "app.json", MANIFEST);

    espfleet_cmd(home.path())
        .arg("--manifest")
        .arg(&manifest)
        .args(["capabilities", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("measure_signal_strength")
                .and(predicate::str::contains("measure_temperature"))
                .and(predicate::str::contains("onoff")),
        );
}

#[test]
fn test_capability_get_json() {
    let home = TempDir::new().unwrap();
    espfleet_cmd(home.path())
        .args(["capabilities", "get", "onoff", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""id":"onoff""#)
                .and(predicate::str::contains(r#""type":"boolean""#)),
        );
}

#[test]
fn test_capability_get_table_shows_type() {
    let home = TempDir::new().unwrap();
    espfleet_cmd(home.path())
        .args(["capabilities", "get", "onoff"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Type:     boolean"));
}

#[test]
fn test_capability_title_follows_configured_language() {
    let home = TempDir::new().unwrap();
    let config = write(&home, "config.toml", "[fleet]\nlanguage = \"nl\"\n");

    espfleet_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .args(["capabilities", "get", "dim", "-o", "plain"])
        .assert()
        .success()
        .stdout("Dim niveau\n");
}

#[test]
fn test_unknown_capability_is_not_found() {
    let home = TempDir::new().unwrap();
    let output = espfleet_cmd(home.path())
        .args(["capabilities", "get", "measure_flux"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("measure_flux"));
}

#[test]
fn test_broken_manifest_is_usage_error() {
    let home = TempDir::new().unwrap();
    let manifest = write(&home, "app.json", "{ not json");
    let output = espfleet_cmd(home.path())
        .arg("--manifest")
        .arg(&manifest)
        .arg("tasks")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("app manifest"));
}

// ── Metrics ─────────────────────────────────────────────────────────

#[test]
fn test_metrics_reduce_over_online_units() {
    let home = TempDir::new().unwrap();
    let fleet = write(&home, "fleet.json", FLEET);

    espfleet_cmd(home.path())
        .args(["metrics", "-o", "json-compact", "--fleet"])
        .arg(&fleet)
        .assert()
        .success()
        .stdout(
            r#"{"Total tasks":3,"Total tasks in use":3,"Total units":3,"Total GPIO used":4}
"#,
        );
}

#[test]
fn test_metrics_plain_keeps_transport_order() {
    let home = TempDir::new().unwrap();
    let fleet = write(&home, "fleet.json", FLEET);

    espfleet_cmd(home.path())
        .args(["metrics", "-o", "plain", "--fleet"])
        .arg(&fleet)
        .assert()
        .success()
        .stdout("Total tasks\t3\nTotal tasks in use\t3\nTotal units\t3\nTotal GPIO used\t4\n");
}

#[test]
fn test_metrics_missing_fleet_file() {
    let home = TempDir::new().unwrap();
    let output = espfleet_cmd(home.path())
        .args(["metrics", "--fleet", "/nonexistent/fleet.json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("fleet"));
}

#[test]
fn test_metrics_duplicate_unit_is_conflict() {
    let home = TempDir::new().unwrap();
    let fleet = write(
        &home,
        "fleet.json",
        r#"{ "units": [ { "name": "a" }, { "name": "a" } ] }"#,
    );
    let output = espfleet_cmd(home.path())
        .args(["metrics", "--fleet"])
        .arg(&fleet)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("custom.toml");
    espfleet_cmd(home.path())
        .arg("--config")
        .arg(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("espfleet").join("config.toml");

    espfleet_cmd(home.path())
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    let output = espfleet_cmd(home.path())
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));

    espfleet_cmd(home.path())
        .arg("--config")
        .arg(&path)
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_config_show_applies_env_overrides() {
    let home = TempDir::new().unwrap();
    let path = write(&home, "config.toml", "[telemetry]\nsite_id = 5\n");

    espfleet_cmd(home.path())
        .env("ESPFLEET_FLEET__LANGUAGE", "de")
        .arg("--config")
        .arg(&path)
        .args(["config", "show", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""site_id":5"#)
                .and(predicate::str::contains(r#""language":"de""#)),
        );
}

#[test]
fn test_invalid_config_is_usage_error() {
    let home = TempDir::new().unwrap();
    let path = write(&home, "config.toml", "[telemetry]\nsite_id = 0\n");
    let output = espfleet_cmd(home.path())
        .arg("--config")
        .arg(&path)
        .arg("tasks")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("site_id"));
}

#[test]
fn test_config_show_rejects_broken_config() {
    let home = TempDir::new().unwrap();
    let path = write(&home, "config.toml", "[telemetry\nsite_id = ");
    let output = espfleet_cmd(home.path())
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

// ── Run ─────────────────────────────────────────────────────────────

#[test]
fn test_run_without_telemetry_initializes_fleet() {
    let home = TempDir::new().unwrap();
    let fleet = write(&home, "fleet.json", FLEET);

    espfleet_cmd(home.path())
        .args(["--no-telemetry", "run", "--duration", "0", "-o", "json-compact", "--fleet"])
        .arg(&fleet)
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""state":"Initialized""#)
                .and(predicate::str::contains(r#""units":3"#))
                .and(predicate::str::contains(r#""online":2"#)),
        );
}

#[test]
fn test_run_accepts_huge_update_interval() {
    let home = TempDir::new().unwrap();
    let fleet = write(&home, "fleet.json", FLEET);

    espfleet_cmd(home.path())
        .args(["--no-telemetry", "run", "--duration", "0"])
        .args(["--update-interval", &u64::MAX.to_string(), "--fleet"])
        .arg(&fleet)
        .assert()
        .success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_reports_initialized_and_uninit_to_tracker() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/matomo.php"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let fleet = write(&home, "fleet.json", FLEET);
    let manifest = write(&home, "app.json", MANIFEST);
    let config = write(
        &home,
        "config.toml",
        &format!("[telemetry]\nhost = \"{}\"\nsite_id = 2\n", server.uri()),
    );

    let mut cmd = espfleet_cmd(home.path());
    cmd.arg("--config")
        .arg(&config)
        .arg("--manifest")
        .arg(&manifest)
        .args(["run", "--duration", "0", "-q", "--fleet"])
        .arg(&fleet);
    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .unwrap()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let requests = server.received_requests().await.unwrap();
    let actions: Vec<String> = requests
        .iter()
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "action_name")
                .map(|(_, v)| v.into_owned())
        })
        .collect();
    assert!(actions.contains(&"App/Initialized".to_owned()), "{actions:?}");
    assert!(actions.contains(&"App/Uninit".to_owned()), "{actions:?}");
    assert_eq!(actions.len(), 2, "{actions:?}");

    let initialized = requests
        .iter()
        .find(|r| r.url.query().unwrap_or_default().contains("Initialized"))
        .unwrap();
    let url = initialized
        .url
        .query_pairs()
        .find(|(k, _)| k == "url")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert_eq!(url, "app://nl.joolee.homey.espeasy/app/initialized");
}
