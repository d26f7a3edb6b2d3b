pub mod check;
pub mod completions;
pub mod install;
pub mod man_pages;
pub mod show;

use dockenv_core::CoreError;
use dockenv_schema::{home_dir, ConfigError, ConfigMap, Loader};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_REGISTRY_ERROR: u8 = 4;
pub const EXIT_INSTALL_ERROR: u8 = 5;

/// Per-user defaults, loaded before the file named on the command line.
pub const LOCAL_DEFAULTS_FILE: &str = ".dockenv.toml";

/// A failed command: what to print and which exit code to use.
#[derive(Debug)]
pub struct CommandError {
    pub code: u8,
    pub message: String,
    pub details: Vec<String>,
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        Self {
            code: EXIT_FAILURE,
            message,
            details: Vec::new(),
        }
    }
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            e if e.is_configuration_problem() => EXIT_CONFIG_ERROR,
            CoreError::Registry(_) => EXIT_REGISTRY_ERROR,
            CoreError::Pull(_) | CoreError::Install { .. } => EXIT_INSTALL_ERROR,
            _ => EXIT_FAILURE,
        };
        let details = match &err {
            CoreError::Validation(report) => report.error_messages(),
            CoreError::Preflight(issues) => issues.iter().map(ToString::to_string).collect(),
            CoreError::Install { started, .. } if !started.is_empty() => {
                vec![format!("already started: {}", started.join(", "))]
            }
            _ => Vec::new(),
        };
        Self {
            code,
            message: err.to_string(),
            details,
        }
    }
}

pub fn local_defaults_path() -> Option<PathBuf> {
    home_dir().map(|home| Path::new(&home).join(LOCAL_DEFAULTS_FILE))
}

/// Merge the local defaults (when present) and `config` into one tree.
pub fn load_config(config: &Path) -> Result<ConfigMap, CommandError> {
    let mut loader = Loader::new();
    match local_defaults_path() {
        Some(local) if local.is_file() => {
            loader.load(&local)?;
        }
        Some(local) => debug!("no local defaults at {}", local.display()),
        None => debug!("HOME is not set, skipping local defaults"),
    }
    loader.load(config)?;
    Ok(loader.into_inner())
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

fn plain_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(plain_style());
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(plain_style());
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_status(status: &str) -> String {
    use console::Style;
    match status {
        "replaced" => Style::new().cyan().apply_to(status).to_string(),
        "created" | "ok" => Style::new().green().apply_to(status).to_string(),
        "warning" => Style::new().yellow().apply_to(status).to_string(),
        "error" => Style::new().red().bold().apply_to(status).to_string(),
        other => other.to_owned(),
    }
}
