//! Re-syncing tracked resources with their remotes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::catalog::{Catalog, Resource, ResourcePatch, now};
use crate::error::{Result, VaultError};
use crate::fs::try_hash_tree;
use crate::skills::scan;
use crate::types::{ResourceKind, ValidationStatus};

use super::{SyncOutcome, Vault};

impl Vault {
    /// Refresh one resource and reconcile its repository's units.
    ///
    /// Only a missing label is an error. Every failure after that (missing
    /// local files, fetch, discovery, persistence) comes back as an outcome
    /// with `success == false`.
    pub fn sync(&self, label: &str) -> Result<SyncOutcome> {
        let mut catalog = self.store.load()?;
        let resource = catalog
            .get(label)
            .cloned()
            .ok_or_else(|| VaultError::NotFound(label.to_string()))?;

        let local = resource.local_path(&self.storage_root);
        if !local.exists() {
            tracing::warn!(label, path = %local.display(), "Local path missing, skipping sync");
            return Ok(SyncOutcome::failure(
                label,
                format!("Local path does not exist: {}", local.display()),
            ));
        }

        let result = self
            .reconcile(&mut catalog, &resource, &local)
            .and_then(|outcome| self.store.save(&catalog).map(|()| outcome));
        match result {
            Ok(outcome) => {
                tracing::info!(
                    label,
                    units = outcome.units,
                    added = outcome.added.len(),
                    changed = outcome.content_changed,
                    "Synced resource"
                );
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(label, error = %err, "Sync failed");
                Ok(SyncOutcome::failure(label, err.to_string()))
            }
        }
    }

    /// Sync every resource, one at a time. Never stops on a failure.
    pub fn sync_all(&self) -> Result<BTreeMap<String, SyncOutcome>> {
        let labels = self.store.load()?.labels();
        let mut outcomes = BTreeMap::new();
        for label in labels {
            let outcome = self
                .sync(&label)
                .unwrap_or_else(|err| SyncOutcome::failure(&label, err.to_string()));
            outcomes.insert(label, outcome);
        }
        Ok(outcomes)
    }

    fn reconcile(
        &self,
        catalog: &mut Catalog,
        resource: &Resource,
        local: &Path,
    ) -> Result<SyncOutcome> {
        let working_copy = resource.working_copy(&self.storage_root);
        let before = try_hash_tree(local);
        self.fetcher.refresh(&working_copy)?;
        let content_changed = before != try_hash_tree(local);

        let at = now();
        let mut touched = BTreeSet::new();
        let mut added = Vec::new();

        let units = match resource.kind {
            ResourceKind::Repo => {
                let discovered = scan(&working_copy)?;
                for unit in &discovered {
                    let result = self.validator.validate(&unit.marker_path());
                    let relative_path = (!unit.is_root()).then(|| unit.relative_path.clone());

                    if let Some((matched, kind)) = find_unit(catalog, resource, &unit.unit_name) {
                        let mut patch =
                            ResourcePatch::from_validation(&result).with_unit_name(&unit.unit_name);
                        if kind == ResourceKind::Repo {
                            patch = patch.with_relative_path(relative_path);
                        }
                        catalog.update(&matched, &patch)?;
                        touched.insert(matched);
                        continue;
                    }

                    let new_label =
                        format!("{}/{}/{}", resource.owner, resource.repo, unit.unit_name);
                    if catalog.contains(&new_label) {
                        tracing::warn!(
                            label = %new_label,
                            "Label taken by another repository, not tracking new unit"
                        );
                        continue;
                    }
                    let fresh = resource
                        .derive_unit(&new_label, &unit.unit_name, relative_path, at)
                        .with_validation(&result);
                    catalog.add(fresh)?;
                    tracing::info!(label = %new_label, "Tracking new unit");
                    touched.insert(new_label.clone());
                    added.push(new_label);
                }
                discovered.len()
            }
            ResourceKind::Folder | ResourceKind::File => {
                catalog.update(&resource.label, &self.evaluate(resource))?;
                touched.insert(resource.label.clone());
                usize::from(resource.is_unit)
            }
        };

        // The synced resource itself plus any never-validated siblings
        let pending: Vec<String> = catalog
            .siblings(&resource.owner, &resource.repo)
            .filter(|r| !touched.contains(&r.label))
            .filter(|r| {
                r.label == resource.label || r.validation_status == ValidationStatus::Unvalidated
            })
            .map(|r| r.label.clone())
            .collect();
        for label in &pending {
            if let Some(sibling) = catalog.get(label) {
                let patch = self.evaluate(sibling);
                catalog.update(label, &patch)?;
            }
        }

        let siblings: Vec<String> = catalog
            .siblings(&resource.owner, &resource.repo)
            .map(|r| r.label.clone())
            .collect();
        let stamp = ResourcePatch::synced_at(at);
        for label in &siblings {
            catalog.update(label, &stamp)?;
        }

        Ok(SyncOutcome {
            label: resource.label.clone(),
            success: true,
            error: None,
            status: catalog.get(&resource.label).map(|r| r.validation_status),
            added,
            units,
            content_changed,
        })
    }
}

/// Resource of the same repository that stands for `unit_name`.
///
/// Matches on the recorded unit name first, then on the default unit label
/// (records written before unit names were stored).
fn find_unit(
    catalog: &Catalog,
    resource: &Resource,
    unit_name: &str,
) -> Option<(String, ResourceKind)> {
    let default_label = format!("{}/{}/{}", resource.owner, resource.repo, unit_name);
    let siblings = || catalog.siblings(&resource.owner, &resource.repo);
    siblings()
        .find(|r| r.unit_name.as_deref() == Some(unit_name))
        .or_else(|| siblings().find(|r| r.label == default_label))
        .map(|r| (r.label.clone(), r.kind))
}
