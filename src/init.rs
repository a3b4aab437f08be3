use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{Config, CONFIG_FILE};
use crate::exceptions::ExceptionsFile;

/// Exceptions template written next to the default input.
pub const TEMPLATE_EXCEPTIONS: &str = "source/source_CRPM_exceptions.toml";

#[derive(Debug, Clone)]
pub struct InitResult {
    pub config_path: PathBuf,
    pub exceptions_path: PathBuf,
}

pub fn generate_config(force: bool) -> Result<InitResult> {
    let current_dir = std::env::current_dir().context("Failed to resolve current directory")?;
    generate_config_at_path(&current_dir, force)
}

/// Write `crpm.toml` and an inactive exceptions template under `dir`.
pub fn generate_config_at_path(dir: &Path, force: bool) -> Result<InitResult> {
    let config_path = dir.join(CONFIG_FILE);
    let exceptions_path = dir.join(TEMPLATE_EXCEPTIONS);

    if !force {
        for path in [&config_path, &exceptions_path] {
            if path.exists() {
                bail!("{} already exists. Use --force to overwrite.", path.display());
            }
        }
    }

    let config = Config {
        exceptions: Some(PathBuf::from(TEMPLATE_EXCEPTIONS)),
        ..Config::default()
    };
    fs::write(&config_path, config.to_toml()?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    info!(path = %config_path.display(), "wrote configuration");

    if let Some(parent) = exceptions_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    ExceptionsFile::template().save_to_file(&exceptions_path)?;
    info!(path = %exceptions_path.display(), "wrote exceptions template");

    Ok(InitResult {
        config_path,
        exceptions_path,
    })
}
