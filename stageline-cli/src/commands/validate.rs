use std::path::{Path, PathBuf};

use anyhow::Result;
use stageline::config::ConfigValidator;
use stageline::errors::ConfigError;

/// Execute the `validate` command: merge configs and check them against the schema.
pub fn execute(configs: &[PathBuf], meta: &Path) -> Result<i32> {
    match check(configs, meta) {
        Ok(fields) => {
            println!("Configuration is valid ({fields} fields checked).");
            Ok(0)
        }
        Err(e) => {
            eprintln!("Configuration is invalid: {e}");
            Ok(stageline::errors::EXIT_MISCONFIGURED)
        }
    }
}

fn check(configs: &[PathBuf], meta: &Path) -> Result<usize, ConfigError> {
    let validator = ConfigValidator::from_files(configs, meta)?;
    validator.validate()?;
    Ok(validator.meta().len())
}
