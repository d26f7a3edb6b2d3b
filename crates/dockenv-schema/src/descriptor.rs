//! Compact `a:b[:c]` descriptors for links, port mappings, and volumes.

use crate::paths::{expand_home_with, home_dir};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("invalid link descriptor '{0}', expected '<container>:<alias>'")]
    Link(String),
    #[error("invalid port descriptor '{0}', expected '<ip>:<container-port>' or '<ip>:<host-port>:<container-port>'")]
    Port(String),
    #[error("invalid volume descriptor '{0}', expected '<volume-path>' or '<host-path>:<volume-path>'")]
    Volume(String),
}

/// Split on `:` and reject empty fields.
fn fields(descriptor: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = descriptor.split(':').collect();
    if parts.iter().any(|p| p.is_empty()) {
        None
    } else {
        Some(parts)
    }
}

/// `container:alias`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub container: String,
    pub alias: String,
}

impl FromStr for Link {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fields(s).as_deref() {
            Some([container, alias]) => Ok(Self {
                container: (*container).to_owned(),
                alias: (*alias).to_owned(),
            }),
            _ => Err(DescriptorError::Link(s.to_owned())),
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.container, self.alias)
    }
}

/// `ip:containerPort` or `ip:hostPort:containerPort`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    pub ip: String,
    pub host_port: Option<String>,
    pub container_port: String,
}

impl FromStr for Port {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fields(s).as_deref() {
            Some([ip, container_port]) => Ok(Self {
                ip: (*ip).to_owned(),
                host_port: None,
                container_port: (*container_port).to_owned(),
            }),
            Some([ip, host_port, container_port]) => Ok(Self {
                ip: (*ip).to_owned(),
                host_port: Some((*host_port).to_owned()),
                container_port: (*container_port).to_owned(),
            }),
            _ => Err(DescriptorError::Port(s.to_owned())),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host_port {
            Some(host_port) => write!(f, "{}:{}:{}", self.ip, host_port, self.container_port),
            None => write!(f, "{}:{}", self.ip, self.container_port),
        }
    }
}

/// `volumePath` or `hostMountPoint:volumePath`
///
/// The host mount point is expanded for `~` and `$HOME` at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Volume {
    pub host_mount_point: Option<String>,
    pub volume_path: String,
}

impl Volume {
    pub fn parse_with_home(s: &str, home: Option<&str>) -> Result<Self, DescriptorError> {
        match fields(s).as_deref() {
            Some([volume_path]) => Ok(Self {
                host_mount_point: None,
                volume_path: (*volume_path).to_owned(),
            }),
            Some([host, volume_path]) => Ok(Self {
                host_mount_point: Some(expand_home_with(host, home)),
                volume_path: (*volume_path).to_owned(),
            }),
            _ => Err(DescriptorError::Volume(s.to_owned())),
        }
    }
}

impl FromStr for Volume {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_home(s, home_dir().as_deref())
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host_mount_point {
            Some(host) => write!(f, "{}:{}", host, self.volume_path),
            None => f.write_str(&self.volume_path),
        }
    }
}
