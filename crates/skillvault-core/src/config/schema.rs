//! Configuration schema for config.toml
//!
//! Every field is optional. Unset fields fall back to platform defaults
//! when resolved.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::source::DEFAULT_HOST;

/// File name of the manifest inside the storage root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Root configuration structure for config.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Directory holding every working copy (`{storage_root}/{owner}/{repo}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<PathBuf>,

    /// Manifest location, defaults to `{storage_root}/manifest.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,

    /// Accepted source host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl VaultConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage root, or `default_root` when unset.
    pub fn storage_root_or(&self, default_root: &Path) -> PathBuf {
        self.storage_root
            .clone()
            .unwrap_or_else(|| default_root.to_path_buf())
    }

    /// Manifest path for the given storage root.
    pub fn manifest_path_for(&self, storage_root: &Path) -> PathBuf {
        self.manifest_path
            .clone()
            .unwrap_or_else(|| storage_root.join(MANIFEST_FILE))
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                anyhow::bail!("'host' must not be empty");
            }
            if host.contains("://") || host.contains('/') {
                anyhow::bail!("'host' must be a bare host name, got '{}'", host);
            }
        }
        for (key, path) in [
            ("storage_root", &self.storage_root),
            ("manifest_path", &self.manifest_path),
        ] {
            if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                anyhow::bail!("'{}' must not be empty", key);
            }
        }
        Ok(())
    }
}
