//! Integration tests for the `pse-grid` CLI binary.
//!
//! Argument parsing, config inspection, and the `status` command against a
//! wiremock endpoint. Nothing here talks to the real PSE service.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const MISSING_CONFIG: &str = "/tmp/pse-grid-cli-test-nonexistent/config.toml";

/// Build a [`Command`] for the `pse-grid` binary with env isolation.
///
/// Clears all `PSEGRID_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn pse_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("pse-grid");
    cmd.env("HOME", "/tmp/pse-grid-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/pse-grid-cli-test-nonexistent")
        .env("PSEGRID_CONFIG", MISSING_CONFIG)
        .env_remove("PSEGRID_ENDPOINT")
        .env_remove("PSEGRID_TIMEOUT")
        .env_remove("PSEGRID_OUTPUT")
        .env_remove("PSEGRID_COLOR")
        .env_remove("PSEGRID_HTTP_ENDPOINT")
        .env_remove("PSEGRID_HTTP_TIMEOUT")
        .env_remove("PSEGRID_POLL_INTERVAL")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn sample_map() -> serde_json::Value {
    json!({
        "data": {
            "podsumowanie": {
                "zapotrzebowanie": 4800, "generacja": 5000,
                "wodne": 150, "wiatrowe": 2000, "PV": 900, "cieplne": 9000, "inne": 120
            },
            "przesyly": [
                { "id": "SE", "wartosc": 100, "wartosc_plan": 120, "rownolegly": 5 },
                { "id": "DE", "wartosc": -250, "wartosc_plan": -200, "rownolegly": 0 },
                { "id": "CZ", "wartosc": 30, "wartosc_plan": 40, "rownolegly": 0 },
                { "id": "SK", "wartosc": 60, "wartosc_plan": 60, "rownolegly": 0 },
                { "id": "UA", "wartosc": 0, "wartosc_plan": 0, "rownolegly": 0 },
                { "id": "LT", "wartosc": -90, "wartosc_plan": -100, "rownolegly": 1 }
            ]
        }
    })
}

async fn mock_endpoint(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transmissionMapService"))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

fn endpoint_of(server: &MockServer) -> String {
    format!("{}/transmissionMapService", server.uri())
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = pse_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    pse_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("PSE")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    pse_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pse-grid"));
}

#[test]
fn test_completions_bash() {
    pse_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_output_format_is_usage_error() {
    pse_cmd()
        .args(["--output", "xml", "status"])
        .assert()
        .code(2);
}

#[test]
fn test_watch_rejects_zero_interval() {
    pse_cmd()
        .args(["watch", "--interval", "0"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_env_override() {
    pse_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(MISSING_CONFIG));
}

#[test]
fn test_config_show_defaults() {
    pse_cmd()
        .args(["config", "show", "--output", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("poll.interval=60")
                .and(predicate::str::contains("http.timeout=30"))
                .and(predicate::str::contains(
                    "http.endpoint=https://www.pse.pl/transmissionMapService",
                )),
        );
}

#[test]
fn test_config_show_reads_file_and_env() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[poll]\ninterval = 15\n\n[http]\ntimeout = 5").unwrap();

    pse_cmd()
        .env("PSEGRID_CONFIG", file.path())
        .env("PSEGRID_HTTP_TIMEOUT", "9")
        .args(["config", "show", "--output", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""interval": 15"#)
                .and(predicate::str::contains(r#""timeout": 9"#)),
        );
}

#[test]
fn test_config_zero_interval_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[poll]\ninterval = 0").unwrap();

    let output = pse_cmd()
        .env("PSEGRID_CONFIG", file.path())
        .args(["config", "show"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("poll.interval"));
}

// ── Status ──────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json_lists_every_sensor() {
    let server =
        mock_endpoint(ResponseTemplate::new(200).set_body_json(sample_map())).await;

    let output = pse_cmd()
        .args(["--endpoint", &endpoint_of(&server), "--output", "json", "status"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 16);

    let difference = reports
        .iter()
        .find(|r| r["unique_id"] == "pse-power-difference")
        .unwrap();
    assert_eq!(difference["state"], 200);
    assert_eq!(difference["unit"], "MW");

    let link = reports
        .iter()
        .find(|r| r["unique_id"] == "pse-link-se")
        .unwrap();
    assert_eq!(link["attributes"]["plan"], 120);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_plain_reports_exporting_state() {
    let server =
        mock_endpoint(ResponseTemplate::new(200).set_body_json(sample_map())).await;

    pse_cmd()
        .env("PSEGRID_ENDPOINT", endpoint_of(&server))
        .args(["status", "--output", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("pse-power-state-binary=on")
                .and(predicate::str::contains("pse-power-state-description=Exporting"))
                .and(predicate::str::contains("pse-link-de=-250")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_table_has_headers() {
    let server =
        mock_endpoint(ResponseTemplate::new(200).set_body_json(sample_map())).await;

    pse_cmd()
        .args(["--endpoint", &endpoint_of(&server), "--color", "never", "status"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Sensor")
                .and(predicate::str::contains("PSE Grid Link with SE"))
                .and(predicate::str::contains("Fetched")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_upstream_error_exits_with_connection_code() {
    let server = mock_endpoint(ResponseTemplate::new(503)).await;

    let output = pse_cmd()
        .args(["--endpoint", &endpoint_of(&server), "status"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(7));
    assert!(combined_output(&output).contains("Could not refresh grid data"));
}

// ── Watch ───────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_prints_first_refresh() {
    let server =
        mock_endpoint(ResponseTemplate::new(200).set_body_json(sample_map())).await;

    // `watch` runs until interrupted; the timeout kills it after the first print.
    let output = pse_cmd()
        .args([
            "--endpoint",
            &endpoint_of(&server),
            "--output",
            "plain",
            "watch",
            "--interval",
            "5",
        ])
        .timeout(std::time::Duration::from_secs(3))
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.matches("pse-link-se=100").count(),
        1,
        "{}",
        combined_output(&output)
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[test]
fn test_status_rejects_non_http_endpoint() {
    let output = pse_cmd()
        .args(["--endpoint", "ftp://example.com/map", "status"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("unsupported scheme"));
}
