//! Well-known configuration keys and the schema that describes them.

use dockenv_schema::{ConfigMap, ConfigValue, Constraint, ConstraintSchema, ValueType};
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

pub const LABEL: &str = "label";
pub const EXPOSED_PORTS_REQUIRE_MAC: &str = "exposing-containers-must-have-mac-address";
pub const REGISTRY_URL: &str = "registry-url";
pub const AUTOCREATE_MOUNTPOINTS: &str = "autocreate-volumes-mountpoints";
pub const REGISTRY_DOMAIN: &str = "registry-domain";
pub const REGISTRY_USER: &str = "registry-user";
pub const SETTLE_DELAY_MS: &str = "settle-delay-ms";

pub const IMAGE: &str = "image";
pub const IMAGE_TAG: &str = "image-tag";
pub const NAME: &str = "name";
pub const PORTS: &str = "ports";
pub const LINKS: &str = "links";
pub const VOLUMES: &str = "volumes";
pub const MAC_ADDRESS: &str = "mac-address";
pub const RUN_OPTIONS: &str = "run-options";
pub const PRIORITY: &str = "priority";

/// Pause between removing a container and starting its replacement.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Schema for every key dockenv understands.
pub fn default_schema() -> ConstraintSchema {
    use Constraint::{Mandatory, Optional, Type};

    let mut schema = ConstraintSchema::new();
    schema
        .add_global(LABEL, &[Optional])
        .add_global(EXPOSED_PORTS_REQUIRE_MAC, &[Optional, Type(ValueType::Boolean)])
        .add_global(REGISTRY_URL, &[Optional, Type(ValueType::String)])
        .add_global(AUTOCREATE_MOUNTPOINTS, &[Optional, Type(ValueType::Boolean)])
        .add_global(REGISTRY_DOMAIN, &[Optional, Type(ValueType::String)])
        .add_global(REGISTRY_USER, &[Optional, Type(ValueType::String)])
        .add_global(SETTLE_DELAY_MS, &[Optional, Type(ValueType::Integer)]);
    schema
        .add_subsections(IMAGE, &[Mandatory, Type(ValueType::String)])
        .add_subsections(IMAGE_TAG, &[Mandatory, Type(ValueType::String)])
        .add_subsections(NAME, &[Optional, Type(ValueType::String)])
        .add_subsections(PORTS, &[Optional, Type(ValueType::Array)])
        .add_subsections(LINKS, &[Optional, Type(ValueType::Array)])
        .add_subsections(VOLUMES, &[Optional, Type(ValueType::Array)])
        .add_subsections(MAC_ADDRESS, &[Optional, Type(ValueType::String)])
        .add_subsections(RUN_OPTIONS, &[Optional, Type(ValueType::Array)])
        .add_subsections(PRIORITY, &[Optional, Type(ValueType::Integer)]);
    schema
}

/// Typed view of the global (non-section) entries of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalSettings {
    pub label: Option<String>,
    pub exposed_ports_require_mac: bool,
    pub autocreate_mountpoints: bool,
    pub registry_domain: Option<String>,
    pub registry_user: Option<String>,
    pub settle_delay_ms: Option<u64>,
}

fn global<'a>(root: &'a ConfigMap, key: &str) -> Option<&'a ConfigValue> {
    root.get(key).filter(|v| !v.is_map())
}

fn non_empty_text(root: &ConfigMap, key: &str) -> Option<String> {
    global(root, key)
        .and_then(ConfigValue::scalar_text)
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

impl GlobalSettings {
    pub fn from_tree(root: &ConfigMap) -> Self {
        let settle_delay_ms = global(root, SETTLE_DELAY_MS).and_then(|value| {
            match value.as_int().map(u64::try_from) {
                Some(Ok(ms)) => Some(ms),
                _ => {
                    warn!("ignoring invalid {SETTLE_DELAY_MS} value '{value}'");
                    None
                }
            }
        });

        Self {
            label: non_empty_text(root, LABEL),
            exposed_ports_require_mac: global(root, EXPOSED_PORTS_REQUIRE_MAC)
                .is_some_and(ConfigValue::as_flag),
            autocreate_mountpoints: global(root, AUTOCREATE_MOUNTPOINTS)
                .is_some_and(ConfigValue::as_flag),
            registry_domain: non_empty_text(root, REGISTRY_DOMAIN),
            registry_user: non_empty_text(root, REGISTRY_USER),
            settle_delay_ms,
        }
    }

    /// Prefix `image` with the registry domain, joined by exactly one `/`.
    pub fn image_reference(&self, image: &str) -> String {
        match &self.registry_domain {
            Some(domain) => format!("{}/{}", domain.trim_end_matches('/'), image),
            None => image.to_owned(),
        }
    }

    /// `(user, domain)` when both are configured.
    pub fn registry_login(&self) -> Option<(&str, &str)> {
        match (&self.registry_user, &self.registry_domain) {
            (Some(user), Some(domain)) => Some((user, domain)),
            _ => None,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay_ms
            .map_or(DEFAULT_SETTLE_DELAY, Duration::from_millis)
    }
}
