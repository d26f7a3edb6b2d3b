use crate::container::{build_definitions, ContainerDefinition};
use crate::lifecycle::{validate_transition, InstallPhase};
use crate::plan::{InstallPlan, InstallStep};
use crate::preflight::run_preflight;
use crate::settings::GlobalSettings;
use crate::CoreError;
use dockenv_runtime::{ContainerRuntime, RuntimeError};
use dockenv_schema::{CheckReport, ConfigMap, ConstraintSchema, Validator};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Validate `tree` against `schema`, coercing values in place.
///
/// Warnings are logged and returned; any error turns the report into
/// [`CoreError::Validation`].
pub fn verify_config(
    tree: &mut ConfigMap,
    schema: &ConstraintSchema,
) -> Result<CheckReport, CoreError> {
    let report = Validator::new(schema).verify_map(tree);
    for warning in &report.warnings {
        warn!("{warning}");
    }
    if report.is_ok() {
        Ok(report)
    } else {
        Err(CoreError::Validation(report))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Overrides the `settle-delay-ms` setting.
    pub settle_delay: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub pulled: Vec<String>,
    /// Started containers, in start order.
    pub installed: Vec<String>,
    /// Containers that had no previous instance to remove.
    pub not_found: Vec<String>,
}

/// Drives one install of a merged, validated configuration tree.
///
/// An orchestrator is single use: once `install` has finished, successfully
/// or not, a new one has to be built for the next run.
pub struct Orchestrator<'r> {
    tree: ConfigMap,
    settings: GlobalSettings,
    runtime: &'r dyn ContainerRuntime,
    options: InstallOptions,
    phase: InstallPhase,
}

impl<'r> Orchestrator<'r> {
    pub fn new(
        tree: ConfigMap,
        runtime: &'r dyn ContainerRuntime,
        options: InstallOptions,
    ) -> Self {
        let settings = GlobalSettings::from_tree(&tree);
        Self {
            tree,
            settings,
            runtime,
            options,
            phase: InstallPhase::Idle,
        }
    }

    pub fn phase(&self) -> InstallPhase {
        self.phase
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn settle_delay(&self) -> Duration {
        self.options
            .settle_delay
            .unwrap_or_else(|| self.settings.settle_delay())
    }

    /// Build the definitions and run the pre-flight checks without touching
    /// the runtime or the filesystem.
    pub fn check(&self) -> Result<Vec<ContainerDefinition>, CoreError> {
        let definitions = build_definitions(&self.tree)?;
        let issues = run_preflight(&definitions, &self.settings, false);
        if issues.is_empty() {
            Ok(definitions)
        } else {
            Err(CoreError::Preflight(issues))
        }
    }

    /// What `install` would do, without doing it.
    pub fn plan(&self) -> Result<InstallPlan, CoreError> {
        let definitions = self.check()?;
        Ok(InstallPlan::build(
            &definitions,
            &self.settings,
            self.settle_delay(),
        ))
    }

    pub fn install(&mut self) -> Result<InstallReport, CoreError> {
        self.advance(InstallPhase::Building)?;
        if let Some(label) = &self.settings.label {
            info!("installing environment {label}");
        }
        let definitions = match build_definitions(&self.tree) {
            Ok(definitions) => definitions,
            Err(e) => return Err(self.abort(e)),
        };

        self.advance(InstallPhase::PreflightChecking)?;
        let issues = run_preflight(&definitions, &self.settings, true);
        if !issues.is_empty() {
            for issue in &issues {
                error!("{issue}");
            }
            return Err(self.abort(CoreError::Preflight(issues)));
        }
        let plan = InstallPlan::build(&definitions, &self.settings, self.settle_delay());

        self.advance(InstallPhase::Pulling)?;
        let mut report = InstallReport::default();
        if let Err(e) = self.pull_images(&plan, &mut report) {
            return Err(self.abort(e));
        }

        self.advance(InstallPhase::InstallingContainers)?;
        for step in &plan.steps {
            if let Err(source) = self.execute_step(step, &mut report) {
                error!("installation of [{}] failed: {source}", step.container);
                return Err(self.abort(CoreError::Install {
                    container: step.container.clone(),
                    started: report.installed.clone(),
                    source,
                }));
            }
        }

        self.advance(InstallPhase::Done)?;
        info!("installed {} container(s)", report.installed.len());
        Ok(report)
    }

    fn pull_images(
        &self,
        plan: &InstallPlan,
        report: &mut InstallReport,
    ) -> Result<(), CoreError> {
        if let Some((user, domain)) = self.settings.registry_login() {
            info!("logging in to {domain} as {user}");
            self.runtime.login(user, domain).map_err(CoreError::Registry)?;
        }
        for pull in &plan.pulls {
            info!("pulling image {}:{}", pull.image_ref, pull.tag);
            self.runtime
                .pull(&pull.image_ref, &pull.tag)
                .map_err(CoreError::Pull)?;
            report.pulled.push(format!("{}:{}", pull.image_ref, pull.tag));
        }
        Ok(())
    }

    fn execute_step(
        &self,
        step: &InstallStep,
        report: &mut InstallReport,
    ) -> Result<(), RuntimeError> {
        debug!("removing previous instance of {}", step.remove);
        match self.runtime.remove_container(&step.remove) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                warn!("container {} could not be removed (does it exist?)", step.remove);
                report.not_found.push(step.remove.clone());
            }
            Err(e) => return Err(e),
        }

        self.runtime.settle(step.pause());

        info!("starting container {} from {}", step.start.name, step.start.image());
        self.runtime.run_daemon(&step.start)?;
        report.installed.push(step.start.name.clone());
        Ok(())
    }

    fn advance(&mut self, to: InstallPhase) -> Result<(), CoreError> {
        validate_transition(self.phase, to)?;
        debug!("install phase: {} -> {to}", self.phase);
        self.phase = to;
        Ok(())
    }

    fn abort(&mut self, err: CoreError) -> CoreError {
        self.phase = InstallPhase::Aborted;
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::default_schema;
    use dockenv_runtime::{MockRuntime, RuntimeCall};
    use dockenv_schema::Loader;

    fn tree(text: &str) -> ConfigMap {
        let mut loader = Loader::new();
        loader.load_str(text).unwrap();
        loader.into_inner()
    }

    const PAIR: &str = r#"
settle-delay-ms = "5"

[web]
image = "nginx"
image-tag = "1.27"
priority = "2"
links = ["db:db"]

[db]
image = "postgres"
image-tag = "16"
priority = "1"
"#;

    #[test]
    fn verify_config_rejects_errors_and_keeps_warnings() {
        let mut ok = tree("[web]\nimage = \"nginx\"\nimage-tag = \"1\"\ncolour = \"red\"\n");
        let report = verify_config(&mut ok, &default_schema()).unwrap();
        assert_eq!(report.warnings.len(), 1);

        let mut bad = tree("[web]\nimage = \"nginx\"\n");
        let err = verify_config(&mut bad, &default_schema()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref r) if r.errors.len() == 1));
        assert!(err.is_configuration_problem());
    }

    #[test]
    fn settle_delay_precedence() {
        let runtime = MockRuntime::new();
        let orchestrator = Orchestrator::new(tree(PAIR), &runtime, InstallOptions::default());
        assert_eq!(orchestrator.settle_delay(), Duration::from_millis(5));

        let orchestrator = Orchestrator::new(
            tree(PAIR),
            &runtime,
            InstallOptions {
                settle_delay: Some(Duration::ZERO),
            },
        );
        assert_eq!(orchestrator.settle_delay(), Duration::ZERO);
    }

    #[test]
    fn plan_makes_no_runtime_calls() {
        let runtime = MockRuntime::new();
        let orchestrator = Orchestrator::new(tree(PAIR), &runtime, InstallOptions::default());
        let plan = orchestrator.plan().unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].remove, "db");
        assert!(runtime.calls().is_empty());
        assert_eq!(orchestrator.phase(), InstallPhase::Idle);
    }

    #[test]
    fn install_runs_phases_to_done() {
        let runtime = MockRuntime::new().with_running(&["db"]);
        let mut orchestrator =
            Orchestrator::new(tree(PAIR), &runtime, InstallOptions::default());
        let report = orchestrator.install().unwrap();
        assert_eq!(orchestrator.phase(), InstallPhase::Done);
        assert_eq!(report.installed, ["db", "web"]);
        assert_eq!(report.not_found, ["web"]);
        assert_eq!(report.pulled, ["postgres:16", "nginx:1.27"]);
        assert!(runtime
            .calls()
            .iter()
            .any(|c| *c == RuntimeCall::Settle { delay_ms: 5 }));
    }

    #[test]
    fn orchestrator_is_single_use() {
        let runtime = MockRuntime::new();
        let mut orchestrator =
            Orchestrator::new(tree(PAIR), &runtime, InstallOptions::default());
        orchestrator.install().unwrap();
        let calls = runtime.calls().len();
        assert!(matches!(
            orchestrator.install(),
            Err(CoreError::InvalidTransition { .. })
        ));
        assert_eq!(runtime.calls().len(), calls);
    }

    #[test]
    fn removal_failure_other_than_not_found_aborts() {
        let runtime = MockRuntime::new().failing_remove("web");
        let mut orchestrator =
            Orchestrator::new(tree(PAIR), &runtime, InstallOptions::default());
        match orchestrator.install().unwrap_err() {
            CoreError::Install {
                container, started, ..
            } => {
                assert_eq!(container, "web");
                assert_eq!(started, ["db"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(orchestrator.phase(), InstallPhase::Aborted);
        assert!(runtime.is_running("db"));
    }
}
