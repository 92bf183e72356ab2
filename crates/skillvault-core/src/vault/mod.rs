//! The resource reconciliation engine.
//!
//! [`Vault`] drives every mutation of the catalog: it resolves addresses,
//! fetches content through a [`Fetcher`], discovers and validates skill
//! units, and persists the result. Each public operation is a complete
//! load-modify-save cycle on the manifest; callers serialize access.

mod add;
mod manage;
mod outcome;
mod sync;

pub use outcome::{ImportSummary, RedownloadOutcome, SyncOutcome};

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, ManifestStore, Resource, ResourcePatch};
use crate::error::{Result, VaultError};
use crate::git::Fetcher;
use crate::skills::SkillValidator;
use crate::source::AddressResolver;
use crate::types::ValidationStatus;

/// A local store of fetched skill repositories and their catalog.
#[derive(Debug)]
pub struct Vault {
    storage_root: PathBuf,
    store: ManifestStore,
    fetcher: Box<dyn Fetcher>,
    validator: SkillValidator,
    resolver: AddressResolver,
}

impl Vault {
    /// Create a vault rooted at `storage_root` with its manifest in `store`.
    pub fn new(
        storage_root: impl Into<PathBuf>,
        store: ManifestStore,
        fetcher: Box<dyn Fetcher>,
    ) -> Self {
        Self {
            storage_root: storage_root.into(),
            store,
            fetcher,
            validator: SkillValidator::default(),
            resolver: AddressResolver::default(),
        }
    }

    /// Vault with the manifest at `{storage_root}/manifest.json`.
    pub fn open(storage_root: impl Into<PathBuf>, fetcher: Box<dyn Fetcher>) -> Self {
        let storage_root = storage_root.into();
        let store = ManifestStore::new(storage_root.join(crate::config::MANIFEST_FILE));
        Self::new(storage_root, store, fetcher)
    }

    pub fn with_resolver(mut self, resolver: AddressResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn manifest_path(&self) -> &Path {
        self.store.path()
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    pub fn catalog(&self) -> Result<Catalog> {
        self.store.load()
    }

    // Queries

    pub fn list(&self) -> Result<Vec<Resource>> {
        Ok(self.store.load()?.resources().to_vec())
    }

    pub fn find_by_label(&self, label: &str) -> Result<Option<Resource>> {
        Ok(self.store.load()?.get(label).cloned())
    }

    /// Like [`Vault::find_by_label`], but a miss is [`VaultError::NotFound`].
    pub fn get(&self, label: &str) -> Result<Resource> {
        self.find_by_label(label)?
            .ok_or_else(|| VaultError::NotFound(label.to_string()))
    }

    pub fn filter_by_owner(&self, owner: &str) -> Result<Vec<Resource>> {
        Ok(cloned(self.store.load()?.filter_by_owner(owner)))
    }

    pub fn filter_by_repo(&self, owner: &str, repo: &str) -> Result<Vec<Resource>> {
        Ok(cloned(self.store.load()?.filter_by_repo(owner, repo)))
    }

    pub fn filter_by_skill_name(&self, name: &str) -> Result<Vec<Resource>> {
        Ok(cloned(self.store.load()?.filter_by_unit_name(name)))
    }

    pub fn list_by_validation_status(&self, status: ValidationStatus) -> Result<Vec<Resource>> {
        Ok(cloned(self.store.load()?.filter_by_status(status)))
    }

    // Validation

    /// Re-validate one resource from what is on disk.
    pub fn validate_resource(&self, label: &str) -> Result<Resource> {
        self.store.modify(|catalog| {
            let resource = catalog
                .get(label)
                .ok_or_else(|| VaultError::NotFound(label.to_string()))?;
            let patch = self.evaluate(resource);
            let updated = catalog.update(label, &patch)?.clone();
            tracing::info!(label, status = %updated.validation_status, "Validated resource");
            Ok(updated)
        })
    }

    /// Re-validate every resource. Returns the new status per label.
    pub fn validate_all(&self) -> Result<BTreeMap<String, ValidationStatus>> {
        self.store.modify(|catalog| {
            let labels = catalog.labels();
            self.validate_labels(catalog, &labels)
        })
    }

    /// Validate only resources that have never been validated.
    ///
    /// Returns the labels that were validated.
    pub fn validate_pending(&self) -> Result<Vec<String>> {
        let catalog = self.store.load()?;
        let pending: Vec<String> = catalog
            .filter_by_status(ValidationStatus::Unvalidated)
            .into_iter()
            .map(|r| r.label.clone())
            .collect();
        if pending.is_empty() {
            return Ok(pending);
        }
        self.store.modify(|catalog| {
            self.validate_labels(catalog, &pending)?;
            Ok(pending.clone())
        })
    }

    fn validate_labels(
        &self,
        catalog: &mut Catalog,
        labels: &[String],
    ) -> Result<BTreeMap<String, ValidationStatus>> {
        let mut statuses = BTreeMap::new();
        for label in labels {
            let patch = match catalog.get(label) {
                Some(resource) => self.evaluate(resource),
                None => continue,
            };
            let updated = catalog.update(label, &patch)?;
            statuses.insert(label.clone(), updated.validation_status);
        }
        tracing::debug!(count = statuses.len(), "Validated resources");
        Ok(statuses)
    }

    /// Validation patch for `resource` based on its files on disk.
    ///
    /// Units are checked against their `SKILL.md`; anything else is not a skill.
    fn evaluate(&self, resource: &Resource) -> ResourcePatch {
        if resource.is_unit {
            let marker = resource.marker_path(&self.storage_root);
            ResourcePatch::from_validation(&self.validator.validate(&marker))
        } else {
            ResourcePatch::not_a_skill()
        }
    }
}

fn cloned(resources: Vec<&Resource>) -> Vec<Resource> {
    resources.into_iter().cloned().collect()
}

/// Delete a file or directory tree. A missing path is not an error.
fn remove_path(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(VaultError::io(path, err)),
    };
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Deleted local files");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(VaultError::io(path, err)),
    }
}
