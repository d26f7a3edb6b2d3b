use crate::settings::{
    IMAGE, IMAGE_TAG, LINKS, MAC_ADDRESS, NAME, PORTS, PRIORITY, RUN_OPTIONS, VOLUMES,
};
use crate::CoreError;
use dockenv_schema::{
    home_dir, section_names, ConfigMap, ConfigValue, DescriptorError, Link, Port, Volume,
};
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

/// One container to install, built from a configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerDefinition {
    /// Key of the section this definition was built from.
    pub section: String,
    pub name: String,
    pub image: String,
    pub image_tag: String,
    pub links: Vec<Link>,
    pub ports: Vec<Port>,
    pub volumes: Vec<Volume>,
    pub mac_address: Option<String>,
    pub run_options: Vec<String>,
    pub priority: Option<i64>,
    /// Position of the section in the configuration tree.
    pub index: usize,
}

fn required_text(container: &str, section: &ConfigMap, key: &str) -> Result<String, CoreError> {
    section
        .get(key)
        .and_then(ConfigValue::scalar_text)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| CoreError::MissingSetting {
            container: container.to_owned(),
            key: key.to_owned(),
        })
}

fn optional_text(section: &ConfigMap, key: &str) -> Option<String> {
    section
        .get(key)
        .and_then(ConfigValue::scalar_text)
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn list(section: &ConfigMap, key: &str) -> Vec<String> {
    section.get(key).map(ConfigValue::to_list).unwrap_or_default()
}

fn descriptors<T>(
    container: &str,
    entries: &[String],
    parse: impl Fn(&str) -> Result<T, DescriptorError>,
) -> Result<Vec<T>, CoreError> {
    entries
        .iter()
        .map(|entry| {
            parse(entry.trim()).map_err(|source| CoreError::Descriptor {
                container: container.to_owned(),
                source,
            })
        })
        .collect()
}

impl ContainerDefinition {
    /// Build a definition from the section `key` found at position `index`.
    pub fn from_section(key: &str, index: usize, section: &ConfigMap) -> Result<Self, CoreError> {
        let home = home_dir();

        let priority = match section.get(PRIORITY) {
            None => None,
            Some(value) => Some(value.as_int().ok_or_else(|| CoreError::InvalidSetting {
                container: key.to_owned(),
                key: PRIORITY.to_owned(),
                value: value.to_string(),
            })?),
        };

        let definition = Self {
            section: key.to_owned(),
            name: optional_text(section, NAME).unwrap_or_else(|| key.to_owned()),
            image: required_text(key, section, IMAGE)?,
            image_tag: required_text(key, section, IMAGE_TAG)?,
            links: descriptors(key, &list(section, LINKS), Link::from_str)?,
            ports: descriptors(key, &list(section, PORTS), Port::from_str)?,
            volumes: descriptors(key, &list(section, VOLUMES), |s| {
                Volume::parse_with_home(s, home.as_deref())
            })?,
            mac_address: optional_text(section, MAC_ADDRESS),
            run_options: list(section, RUN_OPTIONS),
            priority,
            index,
        };
        debug!(
            "container [{}] -> {} ({}:{})",
            definition.section, definition.name, definition.image, definition.image_tag
        );
        Ok(definition)
    }

    /// Value of `--net`/`--network` among the run options, if any.
    pub fn network_mode(&self) -> Option<&str> {
        let tokens: Vec<&str> = self
            .run_options
            .iter()
            .flat_map(|option| option.split_whitespace())
            .collect();
        for (i, token) in tokens.iter().enumerate() {
            for flag in ["--net", "--network"] {
                if let Some(value) = token.strip_prefix(flag).and_then(|r| r.strip_prefix('=')) {
                    return Some(value);
                }
                if *token == flag {
                    return tokens.get(i + 1).copied();
                }
            }
        }
        None
    }

    pub fn uses_host_network(&self) -> bool {
        self.network_mode() == Some("host")
    }

    /// Prioritized containers first by ascending priority, then the rest;
    /// ties keep configuration order.
    pub fn sort_key(&self) -> (u8, i64, usize) {
        match self.priority {
            Some(priority) => (0, priority, self.index),
            None => (1, 0, self.index),
        }
    }

    /// Run options joined with spaces, plus `--mac-address` when set.
    pub fn options_line(&self) -> String {
        let mut options: Vec<String> = self
            .run_options
            .iter()
            .map(|o| o.trim().to_owned())
            .filter(|o| !o.is_empty())
            .collect();
        if let Some(mac) = &self.mac_address {
            options.push(format!("--mac-address={mac}"));
        }
        options.join(" ")
    }
}

/// Build one definition per section, sorted into install order.
pub fn build_definitions(root: &ConfigMap) -> Result<Vec<ContainerDefinition>, CoreError> {
    let mut definitions = Vec::new();
    for (index, key) in section_names(root).into_iter().enumerate() {
        if let Some(ConfigValue::Map(section)) = root.get(&key) {
            definitions.push(ContainerDefinition::from_section(&key, index, section)?);
        }
    }
    definitions.sort_by_key(ContainerDefinition::sort_key);
    Ok(definitions)
}
