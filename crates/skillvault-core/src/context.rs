//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::catalog::ManifestStore;
use crate::config::{ConfigStore, VaultConfig, default_storage_root};
use crate::git::{Fetcher, GitFetcher};
use crate::source::AddressResolver;
use crate::vault::Vault;

/// Resolved locations and settings for one vault.
///
/// Frontends build this once from configuration (plus any command-line
/// overrides) and ask it for a [`Vault`].
#[derive(Debug, Clone)]
pub struct VaultContext {
    storage_root: PathBuf,
    manifest_path: PathBuf,
    host: String,
}

impl VaultContext {
    /// Create a context with explicit paths.
    pub fn new(storage_root: PathBuf, manifest_path: PathBuf, host: impl Into<String>) -> Self {
        Self {
            storage_root,
            manifest_path,
            host: host.into(),
        }
    }

    /// Resolve a context from `config`, with `storage_override` taking precedence.
    ///
    /// A storage override also moves the default manifest location.
    pub fn from_config(
        config: &VaultConfig,
        storage_override: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let storage_root = match storage_override {
            Some(root) => root,
            None => match &config.storage_root {
                Some(root) => root.clone(),
                None => default_storage_root()?,
            },
        };
        let manifest_path = config.manifest_path_for(&storage_root);
        Ok(Self::new(storage_root, manifest_path, config.host()))
    }

    /// Load configuration from `store` and resolve a context.
    pub fn load(store: &ConfigStore, storage_override: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = store.load().with_context(|| {
            format!(
                "Failed to load configuration from {}",
                store.config_path().display()
            )
        })?;
        Self::from_config(&config, storage_override)
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn manifest_store(&self) -> ManifestStore {
        ManifestStore::new(self.manifest_path.clone())
    }

    pub fn resolver(&self) -> AddressResolver {
        AddressResolver::new(self.host.clone())
    }

    /// Vault backed by the `git` binary.
    pub fn vault(&self) -> Vault {
        self.vault_with(Box::new(GitFetcher::new()))
    }

    /// Vault with a custom fetcher (for testing).
    pub fn vault_with(&self, fetcher: Box<dyn Fetcher>) -> Vault {
        Vault::new(self.storage_root.clone(), self.manifest_store(), fetcher)
            .with_resolver(self.resolver())
    }
}
