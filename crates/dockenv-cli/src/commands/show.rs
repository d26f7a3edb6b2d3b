use super::{
    colorize_status, json_pretty, load_config, CommandError, EXIT_CONFIG_ERROR, EXIT_SUCCESS,
};
use dockenv_core::default_schema;
use dockenv_schema::Validator;
use std::path::Path;

/// Print the merged and coerced configuration. Validation problems go to
/// stderr and only affect the exit code.
pub fn run(config: &Path) -> Result<u8, CommandError> {
    let mut tree = load_config(config)?;
    let report = Validator::new(&default_schema()).verify_map(&mut tree);

    println!("{}", json_pretty(&tree)?);
    for message in report.warning_messages() {
        eprintln!("{}: {message}", colorize_status("warning"));
    }
    for message in report.error_messages() {
        eprintln!("{}: {message}", colorize_status("error"));
    }
    Ok(if report.is_ok() {
        EXIT_SUCCESS
    } else {
        EXIT_CONFIG_ERROR
    })
}
