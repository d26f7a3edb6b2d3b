//! Layered constraint declarations.
//!
//! Constraints are registered under a [`Scope`]. The set applied to one object
//! is built by stacking layers from broad to narrow, a narrower layer replacing
//! the constraint list of any key it redeclares:
//!
//! - global settings: `All`, then `Global`
//! - section `name`: `All`, then `Subsections`, then `Section(name)`

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Boolean,
    Number,
    Integer,
    Array,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Array => "array",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    Optional,
    Mandatory,
    NotAllowed,
    Type(ValueType),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optional => f.write_str("optional"),
            Self::Mandatory => f.write_str("mandatory"),
            Self::NotAllowed => f.write_str("notallowed"),
            Self::Type(t) => write!(f, "{t}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Root-level settings only.
    Global,
    /// Root-level settings and every section.
    All,
    /// Every section.
    Subsections,
    /// One named section.
    Section(String),
}

/// Key → constraint flags, in declaration order.
pub type ConstraintSet = IndexMap<String, Vec<Constraint>>;

/// Declarative rule set built once by the caller and shared read-only.
///
/// Keys and section names are stored lower-cased, matching the normalization
/// the loader applies to configuration keys.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSchema {
    layers: HashMap<Scope, ConstraintSet>,
}

impl ConstraintSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append constraints for `key` under `scope`.
    ///
    /// Repeated declarations accumulate. An empty slice still registers the key
    /// as known.
    pub fn add(&mut self, scope: Scope, key: &str, constraints: &[Constraint]) -> &mut Self {
        let scope = match scope {
            Scope::Section(name) => Scope::Section(name.to_lowercase()),
            other => other,
        };
        self.layers
            .entry(scope)
            .or_default()
            .entry(key.to_lowercase())
            .or_default()
            .extend_from_slice(constraints);
        self
    }

    pub fn add_global(&mut self, key: &str, constraints: &[Constraint]) -> &mut Self {
        self.add(Scope::Global, key, constraints)
    }

    pub fn add_all(&mut self, key: &str, constraints: &[Constraint]) -> &mut Self {
        self.add(Scope::All, key, constraints)
    }

    pub fn add_subsections(&mut self, key: &str, constraints: &[Constraint]) -> &mut Self {
        self.add(Scope::Subsections, key, constraints)
    }

    pub fn add_section(&mut self, section: &str, key: &str, constraints: &[Constraint]) -> &mut Self {
        self.add(Scope::Section(section.to_owned()), key, constraints)
    }

    /// Declarations registered directly under one scope, without layering.
    pub fn layer(&self, scope: &Scope) -> Option<&ConstraintSet> {
        self.layers.get(scope)
    }

    /// Effective constraints for the root-level settings.
    pub fn global_constraints(&self) -> ConstraintSet {
        self.stack(&[Scope::All, Scope::Global])
    }

    /// Effective constraints for the section called `name`.
    pub fn section_constraints(&self, name: &str) -> ConstraintSet {
        self.stack(&[
            Scope::All,
            Scope::Subsections,
            Scope::Section(name.to_lowercase()),
        ])
    }

    fn stack(&self, scopes: &[Scope]) -> ConstraintSet {
        let mut merged = ConstraintSet::new();
        for scope in scopes {
            if let Some(layer) = self.layers.get(scope) {
                for (key, constraints) in layer {
                    merged.insert(key.clone(), constraints.clone());
                }
            }
        }
        merged
    }
}
