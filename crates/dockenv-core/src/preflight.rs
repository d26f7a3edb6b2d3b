//! Cross-container checks run before any runtime call.
//!
//! Every problem found is collected; a non-empty list blocks the install.

use crate::container::ContainerDefinition;
use crate::settings::GlobalSettings;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum PreflightIssue {
    MissingMountPoint { container: String, path: String },
    MountPointCreationFailed { container: String, path: String, reason: String },
    MissingMacAddress { container: String },
    InvalidMacAddress { container: String, value: String },
    UnknownLinkTarget { container: String, target: String },
    LinkToHostNetwork { container: String, target: String },
    MacAddressWithHostNetwork { container: String },
    DuplicateName { name: String, sections: Vec<String> },
}

impl fmt::Display for PreflightIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMountPoint { container, path } => write!(
                f,
                "container [{container}]: volume mount point {path} does not exist"
            ),
            Self::MountPointCreationFailed {
                container,
                path,
                reason,
            } => write!(
                f,
                "container [{container}]: cannot create volume mount point {path}: {reason}"
            ),
            Self::MissingMacAddress { container } => write!(
                f,
                "container [{container}] exposes ports and must declare a mac address"
            ),
            Self::InvalidMacAddress { container, value } => write!(
                f,
                "container [{container}]: '{value}' is not a valid mac address"
            ),
            Self::UnknownLinkTarget { container, target } => write!(
                f,
                "container [{container}] links to unknown container '{target}'"
            ),
            Self::LinkToHostNetwork { container, target } => write!(
                f,
                "container [{container}] cannot link to '{target}', which uses the host network"
            ),
            Self::MacAddressWithHostNetwork { container } => write!(
                f,
                "container [{container}] cannot set a mac address in host network mode"
            ),
            Self::DuplicateName { name, sections } => write!(
                f,
                "container name '{name}' is used by more than one section ({})",
                sections.join(", ")
            ),
        }
    }
}

/// Six hex pairs separated by the same `:` or `-` throughout.
pub fn is_valid_mac_address(value: &str) -> bool {
    let separator = match value.chars().nth(2) {
        Some(c @ (':' | '-')) => c,
        _ => return false,
    };
    let groups: Vec<&str> = value.split(separator).collect();
    groups.len() == 6
        && groups
            .iter()
            .all(|g| g.len() == 2 && g.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Run every check against `definitions`.
///
/// With `create_mountpoints` set and auto-creation enabled in `settings`,
/// missing host mount points are created on the spot; without it they are
/// assumed creatable and not reported.
pub fn run_preflight(
    definitions: &[ContainerDefinition],
    settings: &GlobalSettings,
    create_mountpoints: bool,
) -> Vec<PreflightIssue> {
    let mut issues = Vec::new();
    let by_name: HashMap<&str, &ContainerDefinition> =
        definitions.iter().map(|d| (d.name.as_str(), d)).collect();

    for def in definitions {
        check_mountpoints(&mut issues, def, settings, create_mountpoints);

        if settings.exposed_ports_require_mac && !def.ports.is_empty() {
            match &def.mac_address {
                None => issues.push(PreflightIssue::MissingMacAddress {
                    container: def.name.clone(),
                }),
                Some(mac) if !is_valid_mac_address(mac) => {
                    issues.push(PreflightIssue::InvalidMacAddress {
                        container: def.name.clone(),
                        value: mac.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        for link in &def.links {
            match by_name.get(link.container.as_str()) {
                None => issues.push(PreflightIssue::UnknownLinkTarget {
                    container: def.name.clone(),
                    target: link.container.clone(),
                }),
                Some(target) if target.uses_host_network() => {
                    issues.push(PreflightIssue::LinkToHostNetwork {
                        container: def.name.clone(),
                        target: link.container.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        if def.mac_address.is_some() && def.uses_host_network() {
            issues.push(PreflightIssue::MacAddressWithHostNetwork {
                container: def.name.clone(),
            });
        }
    }

    check_unique_names(&mut issues, definitions);
    debug!("pre-flight checks found {} issue(s)", issues.len());
    issues
}

fn check_mountpoints(
    issues: &mut Vec<PreflightIssue>,
    def: &ContainerDefinition,
    settings: &GlobalSettings,
    create: bool,
) {
    for path in def.volumes.iter().filter_map(|v| v.host_mount_point.as_deref()) {
        if Path::new(path).exists() {
            continue;
        }
        if !settings.autocreate_mountpoints {
            issues.push(PreflightIssue::MissingMountPoint {
                container: def.name.clone(),
                path: path.to_owned(),
            });
        } else if create {
            match std::fs::create_dir_all(path) {
                Ok(()) => info!("created volume mount point {path}"),
                Err(e) => issues.push(PreflightIssue::MountPointCreationFailed {
                    container: def.name.clone(),
                    path: path.to_owned(),
                    reason: e.to_string(),
                }),
            }
        }
    }
}

fn check_unique_names(issues: &mut Vec<PreflightIssue>, definitions: &[ContainerDefinition]) {
    let mut seen: Vec<(&str, Vec<String>)> = Vec::new();
    for def in definitions {
        match seen.iter_mut().find(|(name, _)| *name == def.name) {
            Some((_, sections)) => sections.push(def.section.clone()),
            None => seen.push((def.name.as_str(), vec![def.section.clone()])),
        }
    }
    for (name, sections) in seen {
        if sections.len() > 1 {
            issues.push(PreflightIssue::DuplicateName {
                name: name.to_owned(),
                sections,
            });
        }
    }
}
