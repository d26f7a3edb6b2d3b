use super::{colorize_status, json_pretty, load_config, CommandError, EXIT_SUCCESS};
use dockenv_core::{default_schema, verify_config, InstallOptions, Orchestrator};
use dockenv_runtime::ContainerRuntime;
use std::path::Path;

/// Validate and pre-flight `config` and print the resulting install plan.
pub fn run(
    runtime: &dyn ContainerRuntime,
    config: &Path,
    options: InstallOptions,
    json: bool,
) -> Result<u8, CommandError> {
    let mut tree = load_config(config)?;
    let report = verify_config(&mut tree, &default_schema())?;
    let orchestrator = Orchestrator::new(tree, runtime, options);
    let plan = orchestrator.plan()?;
    let label = orchestrator.settings().label.as_deref();

    if json {
        let payload = serde_json::json!({
            "status": "ok",
            "label": label,
            "warnings": report.warning_messages(),
            "plan": plan,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        if let Some(label) = label {
            println!("environment: {label}");
        }
        println!(
            "{}: {} container(s), {} warning(s)",
            colorize_status("ok"),
            plan.steps.len(),
            report.warnings.len()
        );
        for (i, step) in plan.steps.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, step.start.name, step.start.image());
        }
    }
    Ok(EXIT_SUCCESS)
}
