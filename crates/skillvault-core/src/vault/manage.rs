//! Removal, cleanup, manifest exchange and re-downloading.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, ManifestStore, Resource, ResourcePatch, now};
use crate::error::{Result, VaultError};
use crate::types::{ResourceKind, ValidationStatus};

use super::{ImportSummary, RedownloadOutcome, Vault, remove_path};

impl Vault {
    /// Stop tracking `label`, optionally deleting its files.
    ///
    /// A working copy shared with other resources is never deleted as a
    /// whole; only this resource's own folder or file goes.
    pub fn remove(&self, label: &str, delete_files: bool) -> Result<Resource> {
        self.store.modify(|catalog| self.remove_from(catalog, label, delete_files))
    }

    /// Remove every `InvalidSkill` resource. Returns the removed labels.
    pub fn cleanup_invalid(&self, delete_files: bool) -> Result<Vec<String>> {
        self.store.modify(|catalog| {
            let invalid: Vec<String> = catalog
                .filter_by_status(ValidationStatus::InvalidSkill)
                .into_iter()
                .map(|r| r.label.clone())
                .collect();
            for label in &invalid {
                self.remove_from(catalog, label, delete_files)?;
            }
            Ok(invalid)
        })
    }

    fn remove_from(
        &self,
        catalog: &mut Catalog,
        label: &str,
        delete_files: bool,
    ) -> Result<Resource> {
        let resource = catalog
            .remove(label)
            .ok_or_else(|| VaultError::NotFound(label.to_string()))?;

        if delete_files {
            let working_copy = resource.working_copy(&self.storage_root);
            let remaining: Vec<PathBuf> = catalog
                .siblings(&resource.owner, &resource.repo)
                .map(|r| self.footprint(r))
                .collect();
            if remaining.is_empty() {
                remove_path(&working_copy)?;
                prune_empty_dir(working_copy.parent());
            } else {
                let footprint = self.footprint(&resource);
                let overlaps = remaining.iter().any(|path| path.starts_with(&footprint));
                if footprint == working_copy || overlaps {
                    tracing::warn!(
                        label,
                        path = %footprint.display(),
                        "Files are shared with other resources, keeping them"
                    );
                } else {
                    remove_path(&footprint)?;
                }
            }
        }

        tracing::info!(label, delete_files, "Removed resource");
        Ok(resource)
    }

    /// Files that belong to `resource` alone within its working copy.
    fn footprint(&self, resource: &Resource) -> PathBuf {
        match resource.kind {
            ResourceKind::Repo => resource.unit_dir(&self.storage_root),
            ResourceKind::Folder | ResourceKind::File => resource.local_path(&self.storage_root),
        }
    }

    /// Copy the persisted manifest to `dest` byte for byte.
    pub fn export_manifest(&self, dest: &Path) -> Result<()> {
        if !self.store.exists() {
            self.store.save(&Catalog::new())?;
        }
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| VaultError::io(parent, err))?;
        }
        fs::copy(self.store.path(), dest).map_err(|err| VaultError::io(dest, err))?;
        tracing::info!(path = %dest.display(), "Exported manifest");
        Ok(())
    }

    /// Merge the manifest at `src` into this vault without fetching anything.
    ///
    /// Records whose label already exists replace the existing record.
    pub fn import_manifest(&self, src: &Path) -> Result<ImportSummary> {
        let incoming = ManifestStore::read(src)?;
        let summary = self.store.modify(|catalog| {
            let mut summary = ImportSummary::default();
            for resource in incoming.resources() {
                if catalog.upsert(resource.clone()) {
                    summary.replaced += 1;
                } else {
                    summary.added += 1;
                }
            }
            Ok(summary)
        })?;
        tracing::info!(
            path = %src.display(),
            added = summary.added,
            replaced = summary.replaced,
            "Imported manifest"
        );
        Ok(summary)
    }

    /// Delete and re-fetch every working copy, then stamp its resources.
    ///
    /// Resources sharing a working copy are fetched together. A failing
    /// repository is reported per label and does not stop the others.
    pub fn redownload_all(&self) -> Result<BTreeMap<String, RedownloadOutcome>> {
        self.store.modify(|catalog| {
            let mut groups: BTreeMap<(String, String), Vec<Resource>> = BTreeMap::new();
            for resource in catalog.resources() {
                groups
                    .entry((resource.owner.clone(), resource.repo.clone()))
                    .or_default()
                    .push(resource.clone());
            }

            let mut outcomes = BTreeMap::new();
            for members in groups.values() {
                let result = self.redownload_group(members);
                let at = now();
                for member in members {
                    let outcome = match &result {
                        Ok(()) => {
                            catalog.update(&member.label, &ResourcePatch::synced_at(at))?;
                            RedownloadOutcome::success(&member.label)
                        }
                        Err(err) => RedownloadOutcome::failure(&member.label, err.to_string()),
                    };
                    outcomes.insert(member.label.clone(), outcome);
                }
            }
            Ok(outcomes)
        })
    }

    fn redownload_group(&self, members: &[Resource]) -> Result<()> {
        let Some(first) = members.first() else {
            return Ok(());
        };
        let working_copy = first.working_copy(&self.storage_root);
        let remote = first.clone_url();

        // Any member that needs the full tree forces a full fetch
        let sparse: Option<BTreeSet<String>> =
            members.iter().map(Resource::checkout_path).collect();

        remove_path(&working_copy)?;
        let result = match sparse {
            Some(paths) => {
                let paths: Vec<String> = paths.into_iter().collect();
                self.fetcher.sparse_fetch(&remote, &working_copy, &first.branch, &paths)
            }
            None => self.fetcher.fetch(&remote, &working_copy, &first.branch),
        };
        match &result {
            Ok(()) => tracing::info!(repo = %first.repo_label(), "Re-downloaded working copy"),
            Err(err) => {
                tracing::warn!(repo = %first.repo_label(), error = %err, "Re-download failed")
            }
        }
        result
    }
}

/// Remove `dir` if it exists and is empty.
fn prune_empty_dir(dir: Option<&Path>) {
    if let Some(dir) = dir
        && fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_none())
        && let Err(err) = fs::remove_dir(dir)
    {
        tracing::debug!(path = %dir.display(), error = %err, "Could not prune empty directory");
    }
}
