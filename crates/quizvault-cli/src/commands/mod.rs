pub mod delete_result;
pub mod export;
pub mod import;
pub mod init;
pub mod list;
pub mod results;
pub mod take;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizvault_core::config::{load_config_from, QuizvaultConfig};

/// Load the config and apply the `--data-dir` override.
pub fn load_config(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<QuizvaultConfig> {
    let mut config =
        load_config_from(config_path.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
