//! Container runtime layer for dockenv.
//!
//! This crate defines the `ContainerRuntime` trait the install orchestrator
//! drives (pull, remove, run, registry login, settle delay), a backend that
//! shells out to the `docker` CLI, a recording mock backend for tests and dry
//! runs, and host prerequisite checks.

pub mod backend;
pub mod docker;
pub mod mock;
pub mod prereq;

pub use backend::{select_runtime, ContainerRuntime, RunSpec};
pub use docker::DockerRuntime;
pub use mock::{MockRuntime, RuntimeCall};
pub use prereq::{check_docker_prereqs, format_missing, MissingPrereq};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("runtime '{0}' is not available on this system")]
    BackendUnavailable(String),
    #[error("container '{0}' not found")]
    ContainerNotFound(String),
    #[error("failed to pull image {image}:{tag}: {message}")]
    PullFailed {
        image: String,
        tag: String,
        message: String,
    },
    #[error("login to registry {domain} as {user} failed: {message}")]
    LoginFailed {
        user: String,
        domain: String,
        message: String,
    },
    #[error("runtime execution failed: {0}")]
    ExecFailed(String),
}

impl RuntimeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ContainerNotFound(_))
    }
}
