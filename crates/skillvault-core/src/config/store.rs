//! Config store for loading and saving config.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{VaultConfig, parser, paths};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store at the platform default location.
    pub fn from_default() -> anyhow::Result<Self> {
        Ok(Self::from_path(paths::default_config_path()?))
    }

    pub fn from_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> anyhow::Result<VaultConfig> {
        if !self.config_path.exists() {
            return Ok(VaultConfig::new());
        }
        parser::parse_vault_toml(&self.config_path)
    }

    pub fn save(&self, config: &VaultConfig) -> anyhow::Result<()> {
        config.validate()?;
        let content = parser::to_toml(config).context("Failed to serialize config to TOML")?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}
