use crate::CoreError;
use serde::Serialize;
use std::fmt;

/// Where an orchestrator run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPhase {
    Idle,
    Building,
    PreflightChecking,
    Pulling,
    InstallingContainers,
    Done,
    Aborted,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Building => "building",
            Self::PreflightChecking => "preflight_checking",
            Self::Pulling => "pulling",
            Self::InstallingContainers => "installing_containers",
            Self::Done => "done",
            Self::Aborted => "aborted",
        })
    }
}

impl InstallPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

pub fn validate_transition(from: InstallPhase, to: InstallPhase) -> Result<(), CoreError> {
    use InstallPhase::{
        Aborted, Building, Done, Idle, InstallingContainers, PreflightChecking, Pulling,
    };

    let valid = matches!(
        (from, to),
        (Idle, Building)
            | (Building, PreflightChecking)
            | (PreflightChecking, Pulling)
            | (Pulling, InstallingContainers)
            | (InstallingContainers, Done)
    ) || (to == Aborted && !from.is_terminal() && from != Idle);

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}
