use crate::RuntimeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything needed to start one detached container.
///
/// Port, link and volume entries are serialized descriptors; `options` holds
/// the extra run options as a single space-separated string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSpec {
    pub name: String,
    pub image_ref: String,
    pub tag: String,
    pub ports: Vec<String>,
    pub links: Vec<String>,
    pub volumes: Vec<String>,
    pub options: String,
}

impl RunSpec {
    /// `image_ref:tag`
    pub fn image(&self) -> String {
        format!("{}:{}", self.image_ref, self.tag)
    }
}

/// Calls are synchronous from the caller's point of view; failures surface as
/// [`RuntimeError`].
pub trait ContainerRuntime: Send + Sync {
    fn name(&self) -> &str;

    fn login(&self, user: &str, domain: &str) -> Result<(), RuntimeError>;

    fn pull(&self, image_ref: &str, tag: &str) -> Result<(), RuntimeError>;

    /// Remove a container by name. Returns
    /// [`RuntimeError::ContainerNotFound`] when there is nothing to remove.
    fn remove_container(&self, name: &str) -> Result<(), RuntimeError>;

    fn run_daemon(&self, spec: &RunSpec) -> Result<(), RuntimeError>;

    /// Wait between removing a container and starting its replacement.
    fn settle(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

pub fn select_runtime(name: &str) -> Result<Box<dyn ContainerRuntime>, RuntimeError> {
    match name {
        "docker" => Ok(Box::new(crate::docker::DockerRuntime::new())),
        "mock" => Ok(Box::new(crate::mock::MockRuntime::new())),
        other => Err(RuntimeError::BackendUnavailable(other.to_owned())),
    }
}
