//! Full install runs against the recording mock runtime: configuration files
//! on disk, loaded and verified the way the command line does it.

use dockenv_core::{
    default_schema, verify_config, CoreError, InstallOptions, InstallPhase, Orchestrator,
    PreflightIssue,
};
use dockenv_runtime::{MockRuntime, RunSpec, RuntimeCall, RuntimeError};
use dockenv_schema::{ConfigError, ConfigMap, Loader};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn write_config(dir: &Path, file: &str, content: &str) -> PathBuf {
    let path = dir.join(file);
    fs::write(&path, content).unwrap();
    path
}

fn load(paths: &[PathBuf]) -> ConfigMap {
    let mut loader = Loader::new();
    for path in paths {
        loader.load(path).unwrap();
    }
    let mut tree = loader.into_inner();
    verify_config(&mut tree, &default_schema()).unwrap();
    tree
}

fn no_pause() -> InstallOptions {
    InstallOptions {
        settle_delay: Some(Duration::ZERO),
    }
}

fn pull(image_ref: &str, tag: &str) -> RuntimeCall {
    RuntimeCall::Pull {
        image_ref: image_ref.to_owned(),
        tag: tag.to_owned(),
    }
}

fn remove(name: &str) -> RuntimeCall {
    RuntimeCall::Remove {
        name: name.to_owned(),
    }
}

const TWO_CONTAINERS: &str = r#"
[app]
image = "image2"
image-tag = "2.0"
priority = 2
links = ["store:store"]

[store]
image = "image1"
image-tag = "1.0"
priority = 1
"#;

#[test]
fn linked_pair_installs_in_priority_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "env.toml", TWO_CONTAINERS);
    let runtime = MockRuntime::new();

    let mut orchestrator = Orchestrator::new(load(&[config]), &runtime, no_pause());
    let report = orchestrator.install().unwrap();

    assert_eq!(orchestrator.phase(), InstallPhase::Done);
    assert_eq!(report.installed, ["store", "app"]);

    let store = RunSpec {
        name: "store".to_owned(),
        image_ref: "image1".to_owned(),
        tag: "1.0".to_owned(),
        ports: Vec::new(),
        links: Vec::new(),
        volumes: Vec::new(),
        options: String::new(),
    };
    let app = RunSpec {
        name: "app".to_owned(),
        image_ref: "image2".to_owned(),
        tag: "2.0".to_owned(),
        links: vec!["store:store".to_owned()],
        ..store.clone()
    };
    assert_eq!(
        runtime.calls(),
        [
            pull("image1", "1.0"),
            pull("image2", "2.0"),
            remove("store"),
            RuntimeCall::Settle { delay_ms: 0 },
            RuntimeCall::Run(store),
            remove("app"),
            RuntimeCall::Settle { delay_ms: 0 },
            RuntimeCall::Run(app),
        ]
    );
}

#[test]
fn layered_sources_merge_before_install() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_config(
        dir.path(),
        "base.toml",
        "registry-domain = \"registry.local\"\n[web]\nimage = \"nginx\"\nimage-tag = \"1.25\"\nports = [\"0.0.0.0:80:8080\"]\n",
    );
    let local = write_config(
        dir.path(),
        "local.toml",
        "[WEB]\nimage-tag = \"1.27\"\nports = [\"127.0.0.1:9000\"]\nrun-options = [\"--restart=always\"]\n",
    );
    let runtime = MockRuntime::new();

    let mut orchestrator = Orchestrator::new(load(&[base, local]), &runtime, no_pause());
    orchestrator.install().unwrap();

    let run = runtime
        .calls()
        .into_iter()
        .find_map(|c| match c {
            RuntimeCall::Run(spec) => Some(spec),
            _ => None,
        })
        .unwrap();
    assert_eq!(run.image(), "registry.local/nginx:1.27");
    assert_eq!(run.ports, ["0.0.0.0:80:8080", "127.0.0.1:9000"]);
    assert_eq!(run.options, "--restart=always");
}

#[test]
fn registry_login_precedes_pulls() {
    let runtime = MockRuntime::new();
    let mut loader = Loader::new();
    loader
        .load_str("registry-domain = \"registry.local\"\nregistry-user = \"ci\"\n[web]\nimage = \"nginx\"\nimage-tag = \"1\"\n")
        .unwrap();

    Orchestrator::new(loader.into_inner(), &runtime, no_pause())
        .install()
        .unwrap();

    assert_eq!(
        runtime.calls()[..2],
        [
            RuntimeCall::Login {
                user: "ci".to_owned(),
                domain: "registry.local".to_owned()
            },
            pull("registry.local/nginx", "1"),
        ]
    );
}

#[test]
fn failed_login_stops_before_pulling() {
    let runtime = MockRuntime::new().failing_login();
    let mut loader = Loader::new();
    loader
        .load_str("registry-domain = \"r\"\nregistry-user = \"ci\"\n[web]\nimage = \"nginx\"\nimage-tag = \"1\"\n")
        .unwrap();

    let err = Orchestrator::new(loader.into_inner(), &runtime, no_pause())
        .install()
        .unwrap_err();
    assert!(matches!(err, CoreError::Registry(RuntimeError::LoginFailed { .. })));
    assert!(runtime.mutating_calls().is_empty());
}

#[test]
fn missing_mac_address_blocks_every_runtime_call() {
    let runtime = MockRuntime::new();
    let mut loader = Loader::new();
    loader
        .load_str(
            "exposing-containers-must-have-mac-address = \"true\"\n\
             [web]\nimage = \"nginx\"\nimage-tag = \"1\"\nports = [\"0.0.0.0:80\"]\n",
        )
        .unwrap();
    let mut tree = loader.into_inner();
    verify_config(&mut tree, &default_schema()).unwrap();

    let mut orchestrator = Orchestrator::new(tree, &runtime, no_pause());
    match orchestrator.install().unwrap_err() {
        CoreError::Preflight(issues) => {
            assert_eq!(issues.len(), 1);
            assert!(issues[0].to_string().contains("web"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(orchestrator.phase(), InstallPhase::Aborted);
    assert!(runtime.calls().is_empty());
}

#[test]
fn unknown_link_target_blocks_every_runtime_call() {
    let runtime = MockRuntime::new();
    let mut loader = Loader::new();
    loader
        .load_str("[web]\nimage = \"nginx\"\nimage-tag = \"1\"\nlinks = [\"ghost:db\"]\n")
        .unwrap();

    let err = Orchestrator::new(loader.into_inner(), &runtime, no_pause())
        .install()
        .unwrap_err();
    assert!(err.is_configuration_problem());
    match err {
        CoreError::Preflight(issues) => assert_eq!(
            issues,
            [PreflightIssue::UnknownLinkTarget {
                container: "web".to_owned(),
                target: "ghost".to_owned()
            }]
        ),
        other => panic!("unexpected error: {other}"),
    }
    assert!(runtime.calls().is_empty());
}

#[test]
fn malformed_descriptor_makes_no_runtime_calls() {
    let runtime = MockRuntime::new();
    let mut loader = Loader::new();
    loader
        .load_str("[web]\nimage = \"nginx\"\nimage-tag = \"1\"\nvolumes = [\"a:b:c\"]\n")
        .unwrap();

    let err = Orchestrator::new(loader.into_inner(), &runtime, no_pause())
        .install()
        .unwrap_err();
    assert!(matches!(err, CoreError::Descriptor { .. }));
    assert!(runtime.calls().is_empty());
}

#[test]
fn start_failure_stops_remaining_containers() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "env.toml",
        r#"
[a]
image = "a"
image-tag = "1"

[b]
image = "b"
image-tag = "1"

[c]
image = "c"
image-tag = "1"
"#,
    );
    let runtime = MockRuntime::new().with_running(&["a", "b", "c"]).failing_run("b");

    let mut orchestrator = Orchestrator::new(load(&[config]), &runtime, no_pause());
    let err = orchestrator.install().unwrap_err();
    assert!(!err.is_configuration_problem());
    match err {
        CoreError::Install {
            container,
            started,
            source,
        } => {
            assert_eq!(container, "b");
            assert_eq!(started, ["a"]);
            assert!(matches!(source, RuntimeError::ExecFailed(_)));
        }
        other => panic!("unexpected error: {other}"),
    }

    // nothing is rolled back and c is never touched
    assert!(runtime.is_running("a"));
    assert!(!runtime.is_running("b"));
    assert!(runtime.is_running("c"));
    assert!(!runtime.calls().contains(&remove("c")));
}

#[test]
fn pull_failure_aborts_before_any_container_change() {
    let runtime = MockRuntime::new().failing_pull("b");
    let mut loader = Loader::new();
    loader
        .load_str("[a]\nimage = \"a\"\nimage-tag = \"1\"\n[b]\nimage = \"b\"\nimage-tag = \"1\"\n")
        .unwrap();

    let err = Orchestrator::new(loader.into_inner(), &runtime, no_pause())
        .install()
        .unwrap_err();
    assert!(matches!(err, CoreError::Pull(_)));
    assert_eq!(runtime.mutating_calls(), [pull("a", "1"), pull("b", "1")]);
}

#[test]
fn autocreated_mountpoint_is_mounted() {
    let dir = tempfile::tempdir().unwrap();
    let mount = dir.path().join("srv/www");
    let config = write_config(
        dir.path(),
        "env.toml",
        &format!(
            "autocreate-volumes-mountpoints = \"yes\"\n[web]\nimage = \"nginx\"\nimage-tag = \"1\"\nvolumes = [\"{}:/var/www\"]\n",
            mount.display()
        ),
    );
    let runtime = MockRuntime::new();

    Orchestrator::new(load(&[config]), &runtime, no_pause())
        .install()
        .unwrap();

    assert!(mount.is_dir());
    let volumes: Vec<String> = runtime
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            RuntimeCall::Run(spec) => Some(spec.volumes),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(volumes, [format!("{}:/var/www", mount.display())]);
}

#[test]
fn array_of_tables_never_reaches_the_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "env.toml",
        "[[web]]\nimage = \"nginx\"\nimage-tag = \"1\"\n",
    );

    let mut loader = Loader::new();
    let err = CoreError::from(loader.load(&config).unwrap_err());
    assert!(matches!(err, CoreError::Config(ConfigError::TableArray(ref key)) if key == "web"));
    assert!(err.is_configuration_problem());
    assert!(loader.get().is_empty());
    assert!(loader.sources().is_empty());
}

#[test]
fn report_serializes_for_json_output() {
    let runtime = MockRuntime::new();
    let mut loader = Loader::new();
    loader
        .load_str("[web]\nimage = \"nginx\"\nimage-tag = \"1\"\n")
        .unwrap();
    let report = Orchestrator::new(loader.into_inner(), &runtime, no_pause())
        .install()
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["installed"], serde_json::json!(["web"]));
    assert_eq!(json["not_found"], serde_json::json!(["web"]));
    assert_eq!(json["pulled"], serde_json::json!(["nginx:1"]));
}
