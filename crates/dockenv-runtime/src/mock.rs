use crate::backend::{ContainerRuntime, RunSpec};
use crate::RuntimeError;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// One call received by [`MockRuntime`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum RuntimeCall {
    Login { user: String, domain: String },
    Pull { image_ref: String, tag: String },
    Remove { name: String },
    Settle { delay_ms: u64 },
    Run(RunSpec),
}

#[derive(Default)]
struct MockState {
    calls: Vec<RuntimeCall>,
    running: HashSet<String>,
}

/// In-memory runtime that records every call and never sleeps.
///
/// Containers started through it are tracked so a later removal succeeds;
/// removing an unknown name reports `ContainerNotFound` like a real runtime.
#[derive(Default)]
pub struct MockRuntime {
    state: Mutex<MockState>,
    fail_login: bool,
    fail_pull: HashSet<String>,
    fail_remove: HashSet<String>,
    fail_run: HashSet<String>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend these containers are already running.
    #[must_use]
    pub fn with_running(self, names: &[&str]) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.running.extend(names.iter().map(|n| (*n).to_owned()));
        }
        self
    }

    #[must_use]
    pub fn failing_login(mut self) -> Self {
        self.fail_login = true;
        self
    }

    #[must_use]
    pub fn failing_pull(mut self, image_ref: &str) -> Self {
        self.fail_pull.insert(image_ref.to_owned());
        self
    }

    #[must_use]
    pub fn failing_remove(mut self, name: &str) -> Self {
        self.fail_remove.insert(name.to_owned());
        self
    }

    #[must_use]
    pub fn failing_run(mut self, name: &str) -> Self {
        self.fail_run.insert(name.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    /// Pulls, removals and runs, without logins and settle pauses.
    pub fn mutating_calls(&self) -> Vec<RuntimeCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, RuntimeCall::Settle { .. } | RuntimeCall::Login { .. }))
            .collect()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.running.contains(name))
            .unwrap_or(false)
    }

    fn state(&self) -> Result<MutexGuard<'_, MockState>, RuntimeError> {
        self.state
            .lock()
            .map_err(|e| RuntimeError::ExecFailed(format!("mutex poisoned: {e}")))
    }
}

impl ContainerRuntime for MockRuntime {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn login(&self, user: &str, domain: &str) -> Result<(), RuntimeError> {
        self.state()?.calls.push(RuntimeCall::Login {
            user: user.to_owned(),
            domain: domain.to_owned(),
        });
        if self.fail_login {
            return Err(RuntimeError::LoginFailed {
                user: user.to_owned(),
                domain: domain.to_owned(),
                message: "mock login failure".to_owned(),
            });
        }
        Ok(())
    }

    fn pull(&self, image_ref: &str, tag: &str) -> Result<(), RuntimeError> {
        self.state()?.calls.push(RuntimeCall::Pull {
            image_ref: image_ref.to_owned(),
            tag: tag.to_owned(),
        });
        if self.fail_pull.contains(image_ref) {
            return Err(RuntimeError::PullFailed {
                image: image_ref.to_owned(),
                tag: tag.to_owned(),
                message: "mock pull failure".to_owned(),
            });
        }
        Ok(())
    }

    fn remove_container(&self, name: &str) -> Result<(), RuntimeError> {
        let mut state = self.state()?;
        state.calls.push(RuntimeCall::Remove {
            name: name.to_owned(),
        });
        if self.fail_remove.contains(name) {
            return Err(RuntimeError::ExecFailed(format!(
                "mock remove failure for {name}"
            )));
        }
        if state.running.remove(name) {
            Ok(())
        } else {
            Err(RuntimeError::ContainerNotFound(name.to_owned()))
        }
    }

    fn run_daemon(&self, spec: &RunSpec) -> Result<(), RuntimeError> {
        let mut state = self.state()?;
        state.calls.push(RuntimeCall::Run(spec.clone()));
        if self.fail_run.contains(&spec.name) {
            return Err(RuntimeError::ExecFailed(format!(
                "mock run failure for {}",
                spec.name
            )));
        }
        if !state.running.insert(spec.name.clone()) {
            return Err(RuntimeError::ExecFailed(format!(
                "container name {} is already in use",
                spec.name
            )));
        }
        Ok(())
    }

    fn settle(&self, delay: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.calls.push(RuntimeCall::Settle {
                delay_ms: delay.as_millis() as u64,
            });
        }
    }
}
