//! Platform path resolution helpers.

use std::path::{Path, PathBuf};

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "skillvault";

pub fn config_path_in(config_dir: &Path) -> PathBuf {
    config_dir.join(APP_DIR).join("config.toml")
}

pub fn storage_root_in(data_dir: &Path) -> PathBuf {
    data_dir.join(APP_DIR).join("vault")
}

/// `{config_dir}/skillvault/config.toml`
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(config_path_in(&config_dir))
}

/// `{data_dir}/skillvault/vault`
pub fn default_storage_root() -> anyhow::Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(storage_root_in(&data_dir))
}
