use super::{
    colorize_status, json_pretty, load_config, spin_fail, spin_ok, spinner, CommandError,
    EXIT_SUCCESS,
};
use dockenv_core::{default_schema, verify_config, InstallOptions, Orchestrator};
use dockenv_runtime::ContainerRuntime;
use std::path::Path;

/// The registry login runs the runtime's own prompt on the terminal, which a
/// ticking spinner would overwrite.
fn wants_spinner(orchestrator: &Orchestrator<'_>, json: bool) -> bool {
    !json && orchestrator.settings().registry_login().is_none()
}

pub fn run(
    runtime: &dyn ContainerRuntime,
    config: &Path,
    options: InstallOptions,
    json: bool,
) -> Result<u8, CommandError> {
    let mut tree = load_config(config)?;
    verify_config(&mut tree, &default_schema())?;

    let mut orchestrator = Orchestrator::new(tree, runtime, options);
    if !json {
        if let Some(label) = &orchestrator.settings().label {
            println!("environment: {label}");
        }
    }
    let pb = if wants_spinner(&orchestrator, json) {
        Some(spinner(&format!(
            "installing containers with {}...",
            runtime.name()
        )))
    } else {
        None
    };

    let report = match orchestrator.install() {
        Ok(report) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, &format!("installed {} container(s)", report.installed.len()));
            }
            report
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "installation failed");
            }
            return Err(e.into());
        }
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        if pb.is_none() {
            println!("installed {} container(s)", report.installed.len());
        }
        for name in &report.installed {
            let status = if report.not_found.contains(name) {
                "created"
            } else {
                "replaced"
            };
            println!("  {name}: {}", colorize_status(status));
        }
    }
    Ok(EXIT_SUCCESS)
}
