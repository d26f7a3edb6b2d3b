//! Ordered configuration tree.
//!
//! Parsers only ever produce strings, sequences of strings, and nested maps.
//! The boolean and numeric variants appear once the validator has coerced a
//! value in place.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Insertion-ordered mapping used for the root object and for every section.
pub type ConfigMap = IndexMap<String, ConfigValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<String>),
    Map(ConfigMap),
}

impl ConfigValue {
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut ConfigMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Text form of a scalar value. `None` for sequences and maps.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::List(_) | Self::Map(_) => None,
        }
    }

    /// Loose truthiness used for flags read from an unvalidated tree.
    ///
    /// A flag that was coerced to a boolean is returned as is; strings accept
    /// the usual `true`/`yes`/`on`/`1` spellings.
    pub fn as_flag(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Str(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "on" | "1"
            ),
            Self::Int(n) => *n == 1,
            Self::Float(f) => (*f - 1.0).abs() < f64::EPSILON,
            Self::List(_) | Self::Map(_) => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Sequence view of the value: a scalar becomes a one-element list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Map(_) => Vec::new(),
            scalar => scalar.scalar_text().into_iter().collect(),
        }
    }

    pub fn into_list(self) -> Vec<String> {
        match self {
            Self::List(items) => items,
            Self::Str(s) => vec![s],
            other => other.to_list(),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
            Self::Map(map) => write!(f, "{{{} keys}}", map.len()),
            scalar => f.write_str(&scalar.scalar_text().unwrap_or_default()),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        Self::Map(map)
    }
}

/// Names of the root keys holding nested maps, in insertion order.
pub fn section_names(root: &ConfigMap) -> Vec<String> {
    root.iter()
        .filter(|(_, value)| value.is_map())
        .map(|(key, _)| key.clone())
        .collect()
}
