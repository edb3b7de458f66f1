//! Integration tests for the `topomap` CLI binary.
//!
//! Argument parsing, offline commands and config handling run without a
//! backend; data commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `topomap` binary with env isolation.
///
/// Clears all `TOPOMAP_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn topomap_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("topomap");
    cmd.env("HOME", "/tmp/topomap-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/topomap-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TOPOMAP_PROFILE")
        .env_remove("TOPOMAP_BACKEND")
        .env_remove("TOPOMAP_API_TOKEN")
        .env_remove("TOPOMAP_CONFIG")
        .env_remove("TOPOMAP_OUTPUT")
        .env_remove("TOPOMAP_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run a prepared command off the async runtime so the mock server keeps
/// serving while the binary blocks.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

async fn mock_backend() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "a", "name": "POP A", "type": "pop", "status": "active",
                  "lat": 0.2, "lng": 0.2 },
                { "id": "b", "name": "OLT B", "type": "olt", "status": "active",
                  "lat": 0.8, "lng": 0.8 }
            ],
            "total": 2
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/links"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "l1", "name": "A-B", "type": "fiber", "status": "up",
                "from_node": "a", "to_node": "b", "priority": 1,
                "utilization_pct": 95.0, "latency_ms": 10.0, "loss_db": 0.1,
                "geometry": { "type": "LineString", "coordinates": [[0.2, 0.2], [0.8, 0.8]] }
            }],
            "total": 1
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [], "total": 0 })))
        .mount(&server)
        .await;

    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = topomap_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    topomap_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("topology")
            .and(predicate::str::contains("nodes"))
            .and(predicate::str::contains("links"))
            .and(predicate::str::contains("geometry")),
    );
}

#[test]
fn test_version_flag() {
    topomap_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("topomap"));
}

#[test]
fn test_completions_zsh() {
    topomap_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_subcommand() {
    let output = topomap_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("foobar"), "Expected the bad subcommand named:\n{text}");
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_health_scores_from_flags() {
    topomap_cmd()
        .args(["health", "--status", "up", "-u", "95", "-l", "10", "--loss", "0.1"])
        .args(["-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::diff("60\n"));
}

#[test]
fn test_health_json_has_tone() {
    let output = topomap_cmd()
        .args(["health", "-u", "95", "-l", "10", "--loss", "0.1", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["value"], 60);
    assert_eq!(body["tone"], "warn");
    assert_eq!(body["status"], "up");
}

#[test]
fn test_health_rejects_unknown_status() {
    topomap_cmd()
        .args(["health", "--status", "sideways"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("sideways"));
}

#[test]
fn test_geometry_validate_line() {
    topomap_cmd()
        .args([
            "geometry",
            "validate",
            r#"{"type":"LineString","coordinates":[[106.8,-6.2],[106.9,-6.1]]}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid LineString with 2 positions"));
}

#[test]
fn test_geometry_validate_from_stdin() {
    topomap_cmd()
        .args(["geometry", "validate", "-", "--expect", "area"])
        .write_stdin(r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid Polygon with 4 positions"));
}

#[test]
fn test_geometry_wrong_shape_is_a_usage_error() {
    topomap_cmd()
        .args([
            "geometry",
            "validate",
            r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#,
            "--expect",
            "line",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("expected LineString geometry, got Polygon"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_data_command_without_backend() {
    topomap_cmd()
        .args(["nodes", "list", "--bbox", "0,0,1,1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No backend configured"));
}

#[test]
fn test_config_init_show_and_use() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");
    let cfg = cfg.to_str().unwrap();

    topomap_cmd()
        .args(["--config", cfg, "config", "init", "--name", "lab"])
        .args(["--url", "https://noc.lab.example", "--token-env", "LAB_TOKEN"])
        .assert()
        .success();
    topomap_cmd()
        .args(["--config", cfg, "config", "init", "--name", "prod"])
        .args(["--url", "https://noc.example.net"])
        .assert()
        .success();

    let output = topomap_cmd()
        .args(["--config", cfg, "-o", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["default_profile"], "lab");
    assert_eq!(shown["profiles"]["lab"]["api_token_env"], "LAB_TOKEN");
    assert_eq!(shown["profiles"]["prod"]["backend"], "https://noc.example.net");

    topomap_cmd()
        .args(["--config", cfg, "config", "use", "prod"])
        .assert()
        .success();
    topomap_cmd()
        .args(["--config", cfg, "config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* prod"));

    topomap_cmd()
        .args(["--config", cfg, "config", "use", "staging"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("staging"));
}

#[test]
fn test_config_init_rejects_bad_url() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");

    topomap_cmd()
        .arg("--config")
        .arg(&cfg)
        .args(["config", "init", "--url", "not a url"])
        .assert()
        .code(2);
    assert!(!cfg.exists());
}

#[test]
fn test_invalid_bbox_is_a_usage_error() {
    topomap_cmd()
        .args(["--backend", "http://127.0.0.1:9", "sync", "--bbox", "1,2,3"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("bbox"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_summarizes_viewport() {
    let server = mock_backend().await;

    let mut cmd = topomap_cmd();
    cmd.args(["--backend", &server.uri(), "-o", "plain"])
        .args(["sync", "--bbox", "0,0,1,1"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "2 1 0\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_links_list_includes_health() {
    let server = mock_backend().await;

    let mut cmd = topomap_cmd();
    cmd.args(["--backend", &server.uri(), "-o", "json"])
        .args(["links", "list", "--bbox", "0,0,1,1"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let links: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(links[0]["id"], "l1");
    assert_eq!(links[0]["health"]["value"], 60);
    assert_eq!(links[0]["health"]["tone"], "warn");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_links_create_rejects_existing_pair_before_posting() {
    let server = mock_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/links"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut cmd = topomap_cmd();
    cmd.args(["--backend", &server.uri()])
        .args(["links", "create", "--from", "b", "--to", "a", "--bbox", "0,0,1,1"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(6), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("A-B"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_backend_maps_to_connection_exit_code() {
    let mut cmd = topomap_cmd();
    cmd.args(["--backend", "http://127.0.0.1:1", "--timeout", "5"])
        .args(["sync", "--bbox", "0,0,1,1"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}
