//! Configuration schema layer for dockenv.
//!
//! This crate owns everything that happens before a container is touched: the
//! ordered configuration tree (`ConfigValue`), layered constraint declarations
//! (`ConstraintSchema`), schema-driven validation with in-place coercion
//! (`Validator`), multi-source loading with merge semantics (`Loader`), and the
//! compact link / port / volume descriptors.

pub mod check;
pub mod constraint;
pub mod descriptor;
pub mod loader;
pub mod parser;
pub mod paths;
pub mod tree;

pub use check::{CheckReport, Diagnostic, DiagnosticKind, Validator};
pub use constraint::{Constraint, ConstraintSchema, ConstraintSet, Scope, ValueType};
pub use descriptor::{DescriptorError, Link, Port, Volume};
pub use loader::{merge_into, normalize_keys, ConfigError, Loader};
pub use parser::{ConfigParser, TomlParser};
pub use paths::{expand_home, expand_home_with, home_dir};
pub use tree::{section_names, ConfigMap, ConfigValue};
