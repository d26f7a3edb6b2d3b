//! CLI subprocess integration tests.
//!
//! These tests invoke the `dockenv` binary as a subprocess against the mock
//! runtime and verify exit codes, stdout content, and JSON output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn dockenv_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dockenv"));
    cmd.env("DOCKENV_SKIP_PREREQS", "1")
        .env("HOME", home)
        .env_remove("DOCKENV_LOG");
    cmd
}

fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const ENVIRONMENT: &str = r#"
label = "staging"

[web]
image = "nginx"
image-tag = "1.27"
priority = 2
ports = ["0.0.0.0:80:8080"]
links = ["db:db"]

[db]
image = "postgres"
image-tag = "16"
priority = 1
"#;

#[test]
fn cli_version_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = dockenv_bin(home.path()).arg("--version").output().unwrap();
    assert!(output.status.success(), "dockenv --version must exit 0");
    assert!(stdout(&output).contains("dockenv"));
}

#[test]
fn cli_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    let output = dockenv_bin(home.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let out = stdout(&output);
    for command in ["install", "check", "show", "completions", "man-pages"] {
        assert!(out.contains(command), "help must list '{command}'");
    }
}

#[test]
fn cli_unknown_runtime_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let output = dockenv_bin(home.path())
        .args(["--runtime", "podman", "check", "env.toml"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn cli_install_with_mock_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "env.toml", ENVIRONMENT);
    let output = dockenv_bin(dir.path())
        .args(["--runtime", "mock", "--json", "install"])
        .arg(&config)
        .args(["--settle-delay-ms", "0"])
        .output()
        .unwrap();
    assert!(output.status.success(), "install failed: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["installed"], serde_json::json!(["db", "web"]));
    assert_eq!(
        report["pulled"],
        serde_json::json!(["postgres:16", "nginx:1.27"])
    );
}

#[test]
fn cli_check_prints_plan() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "env.toml", ENVIRONMENT);
    let output = dockenv_bin(dir.path())
        .args(["--json", "check"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success(), "check failed: {}", stderr(&output));

    let payload: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(payload["status"], "ok");
    let steps = payload["plan"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["remove"], "db");
    assert_eq!(steps[1]["start"]["links"], serde_json::json!(["db:db"]));
}

#[test]
fn cli_check_reports_validation_errors() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "env.toml", "[web]\nimage = \"nginx\"\n");
    let output = dockenv_bin(dir.path())
        .arg("check")
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("image-tag"));
}

#[test]
fn cli_preflight_failure_exits_with_config_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "env.toml",
        "[web]\nimage = \"nginx\"\nimage-tag = \"1\"\nlinks = [\"ghost:ghost\"]\n",
    );
    let output = dockenv_bin(dir.path())
        .args(["--runtime", "mock", "install"])
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("ghost"));
}

#[test]
fn cli_array_of_tables_exits_with_config_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "env.toml",
        "[[web]]\nimage = \"nginx\"\nimage-tag = \"1\"\n",
    );
    let output = dockenv_bin(dir.path())
        .args(["--runtime", "mock", "--json", "install"])
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("array of tables"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn cli_missing_config_exits_with_config_code() {
    let dir = tempfile::tempdir().unwrap();
    let output = dockenv_bin(dir.path())
        .arg("show")
        .arg(dir.path().join("missing.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("does not exist"));
}

#[test]
fn cli_show_merges_local_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        ".dockenv.toml",
        "registry-domain = \"registry.local\"\n[web]\nrun-options = [\"--restart=always\"]\n",
    );
    let config = write_config(
        dir.path(),
        "env.toml",
        "[web]\nimage = \"nginx\"\nimage-tag = \"1\"\nrun-options = [\"--init\"]\n",
    );
    let output = dockenv_bin(dir.path())
        .arg("show")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success(), "show failed: {}", stderr(&output));

    let tree: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(tree["registry-domain"], "registry.local");
    assert_eq!(
        tree["web"]["run-options"],
        serde_json::json!(["--restart=always", "--init"])
    );
}

#[test]
fn cli_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    let output = dockenv_bin(home.path())
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("dockenv"));
}

#[test]
fn cli_man_pages_written() {
    let dir = tempfile::tempdir().unwrap();
    let man = dir.path().join("man");
    let output = dockenv_bin(dir.path())
        .arg("man-pages")
        .arg(&man)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(man.join("dockenv.1").is_file());
    assert!(man.join("dockenv-install.1").is_file());
}
