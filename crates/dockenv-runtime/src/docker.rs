use crate::backend::{ContainerRuntime, RunSpec};
use crate::RuntimeError;
use std::process::{Command, Output};
use tracing::debug;

/// Drives the `docker` command-line client.
pub struct DockerRuntime {
    binary: String,
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self {
            binary: "docker".to_owned(),
        }
    }
}

impl DockerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command(&self, args: &[String]) -> Result<Output, RuntimeError> {
        debug!("{} {}", self.binary, args.join(" "));
        Ok(Command::new(&self.binary).args(args).output()?)
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_owned()
}

/// Render a port descriptor as a `-p` value. Without a host port the runtime
/// picks one: `ip:containerPort` becomes `ip::containerPort`.
pub fn publish_arg(port: &str) -> String {
    let parts: Vec<&str> = port.split(':').collect();
    match parts.as_slice() {
        [ip, container_port] => format!("{ip}::{container_port}"),
        _ => port.to_owned(),
    }
}

/// Arguments for `docker run` (without the binary itself).
pub fn run_args(spec: &RunSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_owned(),
        "-d".to_owned(),
        "--name".to_owned(),
        spec.name.clone(),
    ];
    for port in &spec.ports {
        args.push("-p".to_owned());
        args.push(publish_arg(port));
    }
    for link in &spec.links {
        args.push("--link".to_owned());
        args.push(link.clone());
    }
    for volume in &spec.volumes {
        args.push("-v".to_owned());
        args.push(volume.clone());
    }
    args.extend(spec.options.split_whitespace().map(str::to_owned));
    args.push(spec.image());
    args
}

impl ContainerRuntime for DockerRuntime {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn login(&self, user: &str, domain: &str) -> Result<(), RuntimeError> {
        // inherit stdio so the client can prompt for a password
        let status = Command::new(&self.binary)
            .args(["login", "--username", user, domain])
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(RuntimeError::LoginFailed {
                user: user.to_owned(),
                domain: domain.to_owned(),
                message: format!("docker login exited with {status}"),
            })
        }
    }

    fn pull(&self, image_ref: &str, tag: &str) -> Result<(), RuntimeError> {
        let output = self.command(&["pull".to_owned(), format!("{image_ref}:{tag}")])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(RuntimeError::PullFailed {
                image: image_ref.to_owned(),
                tag: tag.to_owned(),
                message: stderr_of(&output),
            })
        }
    }

    fn remove_container(&self, name: &str) -> Result<(), RuntimeError> {
        let output = self.command(&["rm".to_owned(), "-f".to_owned(), name.to_owned()])?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = stderr_of(&output);
        if stderr.contains("No such container") {
            Err(RuntimeError::ContainerNotFound(name.to_owned()))
        } else {
            Err(RuntimeError::ExecFailed(format!(
                "docker rm {name} failed: {stderr}"
            )))
        }
    }

    fn run_daemon(&self, spec: &RunSpec) -> Result<(), RuntimeError> {
        let output = self.command(&run_args(spec))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(RuntimeError::ExecFailed(format!(
                "docker run {} failed: {}",
                spec.name,
                stderr_of(&output)
            )))
        }
    }
}
