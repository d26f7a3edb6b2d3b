//! Multi-source configuration loading.
//!
//! Each [`Loader::load`] parses one source, lower-cases every key, and merges
//! the result over what was loaded before:
//!
//! 1. a key missing from the accumulated tree is copied verbatim;
//! 2. if either side is a sequence the two are concatenated, earlier first
//!    (a scalar counts as a one-element sequence);
//! 3. two scalars: the later value wins;
//! 4. two maps: merged recursively, never replaced wholesale.
//!
//! Any other pairing (a map meeting a scalar or sequence) is resolved in favour
//! of the later source.

use crate::parser::{ConfigParser, TomlParser};
use crate::paths::expand_home;
use crate::tree::{ConfigMap, ConfigValue};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid file path: file {} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("failed to parse configuration: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("duplicate key '{0}' (keys are case-insensitive)")]
    DuplicateKey(String),
    #[error("'{0}' is an array of tables; declare each container as its own [section]")]
    TableArray(String),
}

/// Accumulates configuration from successive sources.
#[derive(Debug, Default)]
pub struct Loader<P = TomlParser> {
    parser: P,
    config: ConfigMap,
    sources: Vec<PathBuf>,
}

impl Loader<TomlParser> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: ConfigParser> Loader<P> {
    pub fn with_parser(parser: P) -> Self {
        Self {
            parser,
            config: ConfigMap::new(),
            sources: Vec::new(),
        }
    }

    /// Load `path` and merge it over the current state.
    ///
    /// `~`, `$HOME` and `${HOME}` are expanded before the existence check. On
    /// error the accumulated state is left unchanged.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&ConfigMap, ConfigError> {
        let resolved = PathBuf::from(expand_home(&path.as_ref().to_string_lossy()));
        if !resolved.exists() {
            return Err(ConfigError::NotFound(resolved));
        }
        debug!("loading configuration from {}", resolved.display());
        let text = std::fs::read_to_string(&resolved)?;
        self.merge_source(&text)?;
        self.sources.push(resolved);
        Ok(&self.config)
    }

    /// Merge an in-memory source over the current state.
    pub fn load_str(&mut self, text: &str) -> Result<&ConfigMap, ConfigError> {
        self.merge_source(text)?;
        Ok(&self.config)
    }

    pub fn get(&self) -> &ConfigMap {
        &self.config
    }

    /// Resolved paths of every file loaded so far, in load order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn into_inner(self) -> ConfigMap {
        self.config
    }

    fn merge_source(&mut self, text: &str) -> Result<(), ConfigError> {
        let incoming = normalize_keys(self.parser.parse(text)?)?;
        merge_into(&mut self.config, incoming);
        Ok(())
    }
}

/// Lower-case every key at every level, failing on case collisions.
pub fn normalize_keys(map: ConfigMap) -> Result<ConfigMap, ConfigError> {
    normalize_level(map, None)
}

fn normalize_level(map: ConfigMap, parent: Option<&str>) -> Result<ConfigMap, ConfigError> {
    let mut out = ConfigMap::with_capacity(map.len());
    for (key, value) in map {
        let lowered = key.to_lowercase();
        let path = match parent {
            Some(parent) => format!("{parent}.{lowered}"),
            None => lowered.clone(),
        };
        let value = match value {
            ConfigValue::Map(inner) => ConfigValue::Map(normalize_level(inner, Some(&path))?),
            other => other,
        };
        if out.contains_key(&lowered) {
            return Err(ConfigError::DuplicateKey(path));
        }
        out.insert(lowered, value);
    }
    Ok(out)
}

/// Merge `incoming` over `target` key by key.
pub fn merge_into(target: &mut ConfigMap, incoming: ConfigMap) {
    for (key, value) in incoming {
        match target.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

fn merge_value(existing: &mut ConfigValue, incoming: ConfigValue) {
    match (existing, incoming) {
        (ConfigValue::Map(target), ConfigValue::Map(source)) => merge_into(target, source),
        (existing, incoming)
            if !existing.is_map()
                && !incoming.is_map()
                && (existing.is_list() || incoming.is_list()) =>
        {
            let mut items = existing.to_list();
            items.extend(incoming.into_list());
            *existing = ConfigValue::List(items);
        }
        (existing, incoming) => *existing = incoming,
    }
}
