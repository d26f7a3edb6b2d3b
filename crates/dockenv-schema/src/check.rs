use crate::constraint::{Constraint, ConstraintSchema, ConstraintSet, ValueType};
use crate::tree::{section_names, ConfigMap, ConfigValue};
use serde::Serialize;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    InvalidConfigObject,
    MissingKey,
    WrongType,
    UnknownKey,
    KeyNotAllowed,
}

impl DiagnosticKind {
    /// Unknown keys are reported for visibility only; everything else blocks.
    pub fn is_error(self) -> bool {
        !matches!(self, Self::UnknownKey)
    }
}

/// One validation finding, tagged with the section it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub key: Option<String>,
    pub section: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, key: &str, section: Option<&str>) -> Self {
        Self {
            kind,
            key: Some(key.to_owned()),
            section: section.map(str::to_owned),
        }
    }

    fn subject(&self) -> String {
        let key = self.key.as_deref().unwrap_or("[unknown]");
        match &self.section {
            Some(section) => format!("{section}:{key}"),
            None => key.to_owned(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::InvalidConfigObject => f.write_str("Invalid configuration object"),
            DiagnosticKind::MissingKey => write!(f, "{} is not set", self.subject()),
            DiagnosticKind::WrongType => write!(f, "{} has an incompatible type", self.subject()),
            DiagnosticKind::UnknownKey => {
                write!(f, "{} unknown (was it a typo?)", self.subject())
            }
            DiagnosticKind::KeyNotAllowed => {
                write!(f, "{} is not allowed in this section", self.subject())
            }
        }
    }
}

/// Outcome of [`Validator::verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.kind.is_error() {
            self.errors.push(diagnostic);
        } else {
            self.warnings.push(diagnostic);
        }
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Applies a [`ConstraintSchema`] to a configuration tree.
pub struct Validator<'a> {
    schema: &'a ConstraintSchema,
}

impl<'a> Validator<'a> {
    pub fn new(schema: &'a ConstraintSchema) -> Self {
        Self { schema }
    }

    /// Validate `tree`, coercing typed values in place.
    pub fn verify(&self, tree: &mut ConfigValue) -> CheckReport {
        match tree {
            ConfigValue::Map(root) => self.verify_map(root),
            _ => {
                let mut report = CheckReport::default();
                report.push(Diagnostic {
                    kind: DiagnosticKind::InvalidConfigObject,
                    key: None,
                    section: None,
                });
                report
            }
        }
    }

    pub fn verify_map(&self, root: &mut ConfigMap) -> CheckReport {
        let mut report = CheckReport::default();

        let global = self.schema.global_constraints();
        check_object(&mut report, root, &global, None);

        for name in section_names(root) {
            let constraints = self.schema.section_constraints(&name);
            if let Some(ConfigValue::Map(section)) = root.get_mut(&name) {
                check_object(&mut report, section, &constraints, Some(&name));
            }
        }

        debug!(
            "validation finished: {} error(s), {} warning(s)",
            report.errors.len(),
            report.warnings.len()
        );
        report
    }
}

/// Check one object. With `section == None` the object is the root and its
/// nested maps (the sections) are skipped.
fn check_object(
    report: &mut CheckReport,
    object: &mut ConfigMap,
    constraints: &ConstraintSet,
    section: Option<&str>,
) {
    let is_root = section.is_none();

    for (key, flags) in constraints {
        let present = object
            .get(key)
            .is_some_and(|value| !(is_root && value.is_map()));

        if !present {
            if flags.contains(&Constraint::Mandatory) {
                report.push(Diagnostic::new(DiagnosticKind::MissingKey, key, section));
            }
            continue;
        }

        if flags.contains(&Constraint::NotAllowed) {
            report.push(Diagnostic::new(DiagnosticKind::KeyNotAllowed, key, section));
            continue;
        }

        if let Some(value) = object.get_mut(key) {
            if !coerce(value, flags) {
                report.push(Diagnostic::new(DiagnosticKind::WrongType, key, section));
            }
        }
    }

    for (key, value) in object.iter() {
        if is_root && value.is_map() {
            continue;
        }
        if !constraints.contains_key(key) {
            report.push(Diagnostic::new(DiagnosticKind::UnknownKey, key, section));
        }
    }
}

/// Coerce `value` towards the declared types. Returns `false` when the value
/// can never satisfy them (a sequence without ARRAY, or a nested map).
fn coerce(value: &mut ConfigValue, flags: &[Constraint]) -> bool {
    let declared = |t: ValueType| flags.contains(&Constraint::Type(t));
    if !flags.iter().any(|c| matches!(c, Constraint::Type(_))) {
        return true;
    }

    let raw = match &*value {
        ConfigValue::List(_) => return declared(ValueType::Array),
        ConfigValue::Map(_) => return false,
        scalar => scalar.scalar_text().unwrap_or_default(),
    };

    if is_boolean(&raw) && declared(ValueType::Boolean) {
        let lowered = raw.to_ascii_lowercase();
        *value = ConfigValue::Bool(matches!(lowered.as_str(), "true" | "yes" | "on"));
    } else if is_integer(&raw) && declared(ValueType::Integer) {
        match raw.parse::<i64>() {
            Ok(n) => *value = ConfigValue::Int(n),
            Err(_) => return false,
        }
    } else if (is_decimal(&raw) || is_integer(&raw)) && declared(ValueType::Number) {
        match raw.parse::<f64>() {
            Ok(n) => *value = ConfigValue::Float(n),
            Err(_) => return false,
        }
    } else if !declared(ValueType::String) && declared(ValueType::Array) {
        *value = ConfigValue::List(vec![raw]);
    }
    true
}

fn is_boolean(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "on" | "off"
    )
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(raw: &str) -> bool {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let Some((whole, fraction)) = unsigned.split_once('.') else {
        return false;
    };
    whole.bytes().all(|b| b.is_ascii_digit())
        && !fraction.is_empty()
        && fraction.bytes().all(|b| b.is_ascii_digit())
}
