//! Adding resources from source addresses.

use std::path::PathBuf;

use crate::catalog::{Resource, now};
use crate::error::Result;
use crate::skills::{DiscoveredUnit, scan};
use crate::source::Address;
use crate::types::ResourceKind;

use super::Vault;

impl Vault {
    /// Resolve `url` and add what it points at.
    pub fn add_url(&self, url: &str, label: Option<&str>) -> Result<Vec<Resource>> {
        let address = self.resolver.resolve(url)?;
        self.add(&address, label)
    }

    /// Fetch `address`, discover its units and track them.
    ///
    /// Returns every resource created. Either all of them are inserted or,
    /// on a label collision, none are and the catalog is left untouched.
    pub fn add(&self, address: &Address, label: Option<&str>) -> Result<Vec<Resource>> {
        // Fail on a corrupt manifest before touching the network
        let mut catalog = self.store.load()?;

        let resources = match address.kind {
            ResourceKind::Repo => self.add_repo(address, label)?,
            ResourceKind::Folder => self.add_folder(address, label)?,
            ResourceKind::File => self.add_file(address, label)?,
        };

        catalog.add_all(resources.clone())?;
        self.store.save(&catalog)?;

        tracing::info!(
            source = %address.source_url,
            resources = resources.len(),
            "Added to vault"
        );
        Ok(resources)
    }

    fn working_copy(&self, address: &Address) -> PathBuf {
        self.storage_root.join(&address.owner).join(&address.repo)
    }

    fn add_repo(&self, address: &Address, label: Option<&str>) -> Result<Vec<Resource>> {
        let local = self.working_copy(address);
        self.fetcher.fetch(&address.clone_url(), &local, &address.branch)?;

        let units = scan(&local)?;
        let at = now();
        if units.is_empty() {
            let label = label.unwrap_or(address.label.as_str());
            return Ok(vec![Resource::new(label, address, at).not_a_skill()]);
        }

        Ok(units
            .iter()
            .map(|unit| {
                let name = match label {
                    Some(label) => format!("{}-{}", label, unit.unit_name),
                    None => default_unit_label(address, unit),
                };
                let relative_path = (!unit.is_root()).then(|| unit.relative_path.clone());
                self.unit_resource(name, address, unit, relative_path)
            })
            .collect())
    }

    fn add_folder(&self, address: &Address, label: Option<&str>) -> Result<Vec<Resource>> {
        let folder = address.relative_path.clone().unwrap_or_default();
        let local = self.working_copy(address);
        self.fetcher.sparse_fetch(
            &address.clone_url(),
            &local,
            &address.branch,
            std::slice::from_ref(&folder),
        )?;

        let units = scan(&local.join(&folder))?;
        let at = now();
        let resources = match units.as_slice() {
            [] => {
                let label = label.unwrap_or(address.label.as_str());
                vec![Resource::new(label, address, at).not_a_skill()]
            }
            [unit] => {
                let name = label
                    .map(str::to_string)
                    .unwrap_or_else(|| default_unit_label(address, unit));
                let relative_path = join_repo_path(&folder, &unit.relative_path);
                vec![self.unit_resource(name, address, unit, Some(relative_path))]
            }
            units => units
                .iter()
                .map(|unit| {
                    let name = match label {
                        Some(label) => format!("{}/{}", label, unit.unit_name),
                        None => default_unit_label(address, unit),
                    };
                    let relative_path = join_repo_path(&folder, &unit.relative_path);
                    self.unit_resource(name, address, unit, Some(relative_path))
                })
                .collect(),
        };
        Ok(resources)
    }

    fn add_file(&self, address: &Address, label: Option<&str>) -> Result<Vec<Resource>> {
        let local = self.working_copy(address);
        let remote = address.clone_url();
        let label = label.unwrap_or(address.label.as_str());

        let checkout = match &address.unit_folder_path {
            Some(folder) if address.is_marker_file() => Some(folder.clone()),
            _ => address.parent_folder(),
        }
        .filter(|folder| folder != ".");
        match &checkout {
            Some(folder) => self.fetcher.sparse_fetch(
                &remote,
                &local,
                &address.branch,
                std::slice::from_ref(folder),
            )?,
            None => self.fetcher.fetch(&remote, &local, &address.branch)?,
        }

        let resource = Resource::new(label, address, now());
        let resource = match &address.unit_name {
            Some(unit_name) if address.is_marker_file() => {
                let marker = local.join(address.relative_path.as_deref().unwrap_or_default());
                resource
                    .with_unit(unit_name)
                    .with_validation(&self.validator.validate(&marker))
            }
            _ => resource.not_a_skill(),
        };
        Ok(vec![resource])
    }

    fn unit_resource(
        &self,
        label: String,
        address: &Address,
        unit: &DiscoveredUnit,
        relative_path: Option<String>,
    ) -> Resource {
        let result = self.validator.validate(&unit.marker_path());
        tracing::debug!(
            label = %label,
            unit = %unit.unit_name,
            valid = result.valid,
            "Validated discovered unit"
        );
        Resource::new(label, address, now())
            .with_relative_path(relative_path)
            .with_unit(&unit.unit_name)
            .with_validation(&result)
    }
}

/// `"{owner}/{repo}/{unit}"`, the default label of a discovered unit.
fn default_unit_label(address: &Address, unit: &DiscoveredUnit) -> String {
    format!("{}/{}/{}", address.owner, address.repo, unit.unit_name)
}

/// Join a folder path and a unit path relative to it; `"."` collapses.
fn join_repo_path(folder: &str, unit_path: &str) -> String {
    match (folder, unit_path) {
        ("" | ".", path) => path.to_string(),
        (folder, "." | "") => folder.to_string(),
        (folder, path) => format!("{}/{}", folder.trim_end_matches('/'), path),
    }
}
