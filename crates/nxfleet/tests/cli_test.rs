//! Integration tests for the report binaries.
//!
//! Argument handling and startup failures run without any network; the
//! end-to-end cases point vault, inventory and switch at one mock server.
#![allow(clippy::unwrap_used)]

use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for `bin` with env isolation: no user config, no
/// inherited secrets, no `NXFLEET_*` overrides.
fn nxfleet_cmd(bin: &str) -> assert_cmd::Command {
    let mut cmd = match bin {
        "switch-version" => cargo_bin_cmd!("switch-version"),
        "interface-errors" => cargo_bin_cmd!("interface-errors"),
        "dir-listing" => cargo_bin_cmd!("dir-listing"),
        "arp-table" => cargo_bin_cmd!("arp-table"),
        other => panic!("unknown binary {other}"),
    };
    cmd.env("HOME", "/tmp/nxfleet-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/nxfleet-cli-test-nonexistent")
        .env_remove("RUST_LOG")
        .env_remove("VAULT_ADDR")
        .env_remove("VAULT_TOKEN")
        .env_remove("ANSIBLE_VAULT_PATH")
        .env_remove("NXFLEET_DEFAULTS__VAULT")
        .env_remove("NXFLEET_DEFAULTS__VRF")
        .env_remove("NXFLEET_DEFAULTS__MAX_WORKERS")
        .env_remove("NXFLEET_NXAPI__SCHEME")
        .env_remove("NXFLEET_NXAPI__PORT")
        .env_remove("NXFLEET_VAULT__ENDPOINT");
    cmd
}

/// Same as [`nxfleet_cmd`], wired to `server` for vault, inventory and NX-API.
fn wired_cmd(bin: &str, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = nxfleet_cmd(bin);
    cmd.env("VAULT_ADDR", server.uri())
        .env("VAULT_TOKEN", "t0ken")
        .env("NXFLEET_NXAPI__SCHEME", "http")
        .env("NXFLEET_NXAPI__PORT", server.address().port().to_string());
    cmd
}

async fn run(mut cmd: assert_cmd::Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap()).await.unwrap()
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout).lines().map(str::to_owned).collect()
}

fn secrets(server: &MockServer) -> Value {
    json!({
        "netbox_url": server.uri(),
        "netbox_token": "nb-token",
        "nxos_username": "admin",
        "nxos_password": "hunter2"
    })
}

async fn mount_vault(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/kv/nxapi"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": secrets(server) })))
        .mount(server)
        .await;
}

async fn mount_device(server: &MockServer, name: &str) {
    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/"))
        .and(query_param("name", name))
        .and(header("authorization", "Token nb-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "results": [{ "name": name, "primary_ip4": { "address": "127.0.0.1/8" } }]
        })))
        .mount(server)
        .await;
}

async fn mount_switch(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/ins"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "result": { "body": body }, "id": 1 })),
        )
        .mount(server)
        .await;
}

// ── Arguments ───────────────────────────────────────────────────────

#[test]
fn test_version_flag() {
    for bin in ["switch-version", "interface-errors", "dir-listing", "arp-table"] {
        nxfleet_cmd(bin)
            .arg("--version")
            .assert()
            .code(0)
            .stdout(predicate::str::contains(bin));
    }
}

#[test]
fn test_help_lists_shared_flags() {
    nxfleet_cmd("switch-version").arg("--help").assert().success().stdout(
        predicate::str::contains("--devices")
            .and(predicate::str::contains("--save_cookies"))
            .and(predicate::str::contains("--process_cookies"))
            .and(predicate::str::contains("--cookie_file"))
            .and(predicate::str::contains("--disable_urllib_warnings")),
    );
}

#[test]
fn test_dir_listing_help_shows_path() {
    nxfleet_cmd("dir-listing")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--path").and(predicate::str::contains("bootflash:")));
}

#[test]
fn test_missing_devices_exits_one() {
    nxfleet_cmd("switch-version")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--devices"));
}

#[test]
fn test_unknown_flag_exits_one() {
    nxfleet_cmd("arp-table")
        .args(["--devices", "a", "--bogus"])
        .assert()
        .code(1);
}

#[test]
fn test_unknown_vault_exits_one() {
    nxfleet_cmd("switch-version")
        .args(["--devices", "a", "--vault", "keepass"])
        .assert()
        .code(1);
}

#[test]
fn test_command_separators_in_inputs_exit_one() {
    nxfleet_cmd("arp-table")
        .args(["--devices", "a", "--vrf", "default ; reload"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--vrf"));

    nxfleet_cmd("dir-listing")
        .args(["--devices", "a", "--path", "bootflash:;show run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--path"));

    nxfleet_cmd("arp-table")
        .args(["--devices", "a"])
        .env("NXFLEET_DEFAULTS__VRF", "a|b")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_empty_device_list_exits_one() {
    nxfleet_cmd("switch-version")
        .args(["--devices", ","])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no device names"));
}

// ── Startup failures ────────────────────────────────────────────────

#[test]
fn test_hashicorp_without_env_exits_one() {
    nxfleet_cmd("switch-version")
        .args(["--devices", "a"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("hashicorp").and(predicate::str::contains("VAULT_ADDR")));
}

#[test]
fn test_ansible_without_env_exits_one() {
    nxfleet_cmd("switch-version")
        .args(["--devices", "a", "--vault", "ansible"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ANSIBLE_VAULT_PATH"));
}

#[test]
fn test_ansible_missing_key_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = dir.path().join("secrets.yml");
    std::fs::write(&secrets, "netbox_url: http://127.0.0.1:9\nnetbox_token: t\nnxos_username: admin\n").unwrap();

    nxfleet_cmd("switch-version")
        .args(["--devices", "a", "--vault", "ansible"])
        .env("ANSIBLE_VAULT_PATH", &secrets)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nxos_password"));
}

#[test]
fn test_bad_config_env_exits_one() {
    nxfleet_cmd("switch-version")
        .args(["--devices", "a"])
        .env("NXFLEET_NXAPI__SCHEME", "gopher")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid configuration"));
}

// ── End to end ──────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_switch_version_end_to_end() {
    let server = MockServer::start().await;
    mount_vault(&server).await;
    mount_device(&server, "a").await;
    mount_switch(&server, json!({ "host_name": "leaf-a", "bios_ver_str": "v1", "nxos_ver_str": "9.3(1)" })).await;

    let mut cmd = wired_cmd("switch-version", &server);
    cmd.args(["--devices", "a,b,"]);
    let output = run(cmd).await;

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "stderr:\n{stderr}");
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines[0].starts_with("ip "));
    let cols: Vec<&str> = lines[1].split_whitespace().collect();
    assert_eq!(cols, vec!["127.0.0.1", "leaf-a", "v1", "9.3(1)"]);
    assert!(stderr.contains("device=b"), "device b should be named in diagnostics:\n{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_all_devices_failing_exits_two() {
    let server = MockServer::start().await;
    mount_vault(&server).await;
    mount_device(&server, "a").await;
    Mock::given(method("POST"))
        .and(path("/ins"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut cmd = wired_cmd("switch-version", &server);
    cmd.args(["--devices", "a"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout_lines(&output).len(), 1, "only the header is printed");
    assert!(String::from_utf8_lossy(&output.stderr).contains("auth"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ansible_backend_end_to_end() {
    let server = MockServer::start().await;
    mount_device(&server, "a").await;
    mount_switch(
        &server,
        json!({
            "TABLE_dir": { "ROW_dir": [
                { "fname": "nxos.bin", "fsize": 1024, "timestamp": "Jan 01 00:00:00 2024" }
            ] }
        }),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let secrets_file = dir.path().join("secrets.yml");
    std::fs::write(&secrets_file, yaml_doc(&secrets(&server))).unwrap();

    let mut cmd = nxfleet_cmd("dir-listing");
    cmd.args(["--devices", "a", "--vault", "ansible", "--path", "bootflash:"])
        .env("ANSIBLE_VAULT_PATH", &secrets_file)
        .env("NXFLEET_NXAPI__SCHEME", "http")
        .env("NXFLEET_NXAPI__PORT", server.address().port().to_string());
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].split_whitespace().last(), Some("nxos.bin"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_arp_table_honours_vrf_flag() {
    let server = MockServer::start().await;
    mount_vault(&server).await;
    mount_device(&server, "a").await;
    mount_switch(
        &server,
        json!({
            "TABLE_vrf": { "ROW_vrf": {
                "vrf-name-out": "management",
                "TABLE_adj": { "ROW_adj": { "intf-out": "mgmt0", "ip-addr-out": "192.0.2.1", "mac": "0050.56a1.0001" } }
            } }
        }),
    )
    .await;

    let mut cmd = wired_cmd("arp-table", &server);
    cmd.args(["--devices", "a", "--vrf", "management"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let posted: Vec<Value> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/ins")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0][0]["params"]["cmd"], "show ip arp vrf management");
}

/// Flat string map as YAML. JSON strings are valid YAML scalars.
fn yaml_doc(map: &Value) -> String {
    map.as_object()
        .unwrap()
        .iter()
        .map(|(key, value)| format!("{key}: {value}\n"))
        .collect()
}
