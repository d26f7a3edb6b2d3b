//! Install orchestration for dockenv.
//!
//! This crate turns a merged, validated configuration tree into container
//! definitions, runs the cross-container pre-flight checks, and drives the
//! `Orchestrator`: pull every image, then remove, settle and start each
//! container strictly one after another in priority order, stopping at the
//! first runtime failure.

pub mod container;
pub mod lifecycle;
pub mod orchestrator;
pub mod plan;
pub mod preflight;
pub mod settings;

pub use container::{build_definitions, ContainerDefinition};
pub use lifecycle::{validate_transition, InstallPhase};
pub use orchestrator::{verify_config, InstallOptions, InstallReport, Orchestrator};
pub use plan::{ImagePull, InstallPlan, InstallStep};
pub use preflight::{is_valid_mac_address, run_preflight, PreflightIssue};
pub use settings::{default_schema, GlobalSettings, DEFAULT_SETTLE_DELAY};

use dockenv_runtime::RuntimeError;
use dockenv_schema::{CheckReport, ConfigError, DescriptorError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{} configuration error(s) were found", .0.errors.len())]
    Validation(CheckReport),
    #[error("container [{container}]: {source}")]
    Descriptor {
        container: String,
        source: DescriptorError,
    },
    #[error("container [{container}]: {key} is not set")]
    MissingSetting { container: String, key: String },
    #[error("container [{container}]: invalid value '{value}' for {key}")]
    InvalidSetting {
        container: String,
        key: String,
        value: String,
    },
    #[error("{} configuration error(s) were found", .0.len())]
    Preflight(Vec<PreflightIssue>),
    #[error("failed to log in to the registry: {0}")]
    Registry(#[source] RuntimeError),
    #[error("image pull failed: {0}")]
    Pull(#[source] RuntimeError),
    #[error("installation of [{container}] failed: {source}")]
    Install {
        container: String,
        /// Containers already started before the failure.
        started: Vec<String>,
        source: RuntimeError,
    },
    #[error("invalid install phase transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl CoreError {
    /// True when the failure was detected before any runtime call was made.
    pub fn is_configuration_problem(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Validation(_)
                | Self::Descriptor { .. }
                | Self::MissingSetting { .. }
                | Self::InvalidSetting { .. }
                | Self::Preflight(_)
        )
    }
}
