use crate::loader::ConfigError;
use crate::tree::{ConfigMap, ConfigValue};

/// Turns configuration source text into a tree.
///
/// Implementations produce scalars as strings and sequences only where the
/// source syntax repeats a value; typing is left to the validator.
pub trait ConfigParser {
    fn parse(&self, text: &str) -> Result<ConfigMap, ConfigError>;
}

/// TOML front end.
///
/// Root tables become sections, arrays become sequences of strings, and every
/// other scalar is rendered to its textual form. Arrays of tables (`[[web]]`)
/// are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlParser;

impl ConfigParser for TomlParser {
    fn parse(&self, text: &str) -> Result<ConfigMap, ConfigError> {
        let table: toml::Table = toml::from_str(text)?;
        convert_table(table, None)
    }
}

fn convert_table(table: toml::Table, parent: Option<&str>) -> Result<ConfigMap, ConfigError> {
    let mut map = ConfigMap::with_capacity(table.len());
    for (key, value) in table {
        let path = match parent {
            Some(parent) => format!("{parent}.{key}"),
            None => key.clone(),
        };
        let value = convert(value, &path)?;
        map.insert(key, value);
    }
    Ok(map)
}

fn convert(value: toml::Value, path: &str) -> Result<ConfigValue, ConfigError> {
    match value {
        toml::Value::Table(table) => Ok(ConfigValue::Map(convert_table(table, Some(path))?)),
        toml::Value::Array(items) if items.iter().any(toml::Value::is_table) => {
            Err(ConfigError::TableArray(path.to_owned()))
        }
        toml::Value::Array(items) => Ok(ConfigValue::List(items.into_iter().map(text_of).collect())),
        scalar => Ok(ConfigValue::Str(text_of(scalar))),
    }
}

fn text_of(value: toml::Value) -> String {
    match value {
        toml::Value::String(s) => s,
        toml::Value::Integer(n) => n.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(d) => d.to_string(),
        nested @ (toml::Value::Array(_) | toml::Value::Table(_)) => nested.to_string(),
    }
}
