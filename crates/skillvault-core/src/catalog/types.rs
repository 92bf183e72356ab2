//! The catalog document: every tracked resource plus a format version.

use serde_json::{Map, Value};

use crate::error::{Result, VaultError};
use crate::types::ValidationStatus;

use super::resource::{Resource, ResourcePatch};

/// Manifest format version written by this release.
pub const MANIFEST_VERSION: &str = "1.0";

/// Ordered collection of resources, keyed by unique label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Manifest format version
    pub version: String,
    resources: Vec<Resource>,
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            resources: Vec::new(),
        }
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.label.clone()).collect()
    }

    /// Get a resource by label
    pub fn get(&self, label: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.label == label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Insert a new resource.
    ///
    /// Fails with [`VaultError::DuplicateLabel`] when the label is taken.
    pub fn add(&mut self, resource: Resource) -> Result<()> {
        if self.contains(&resource.label) {
            return Err(VaultError::DuplicateLabel(resource.label));
        }
        self.resources.push(resource);
        Ok(())
    }

    /// Insert several resources, or none of them.
    ///
    /// Labels are checked against the catalog and against each other before
    /// anything is inserted.
    pub fn add_all(&mut self, resources: Vec<Resource>) -> Result<()> {
        for (index, resource) in resources.iter().enumerate() {
            let repeated = resources[..index]
                .iter()
                .any(|earlier| earlier.label == resource.label);
            if repeated || self.contains(&resource.label) {
                return Err(VaultError::DuplicateLabel(resource.label.clone()));
            }
        }
        self.resources.extend(resources);
        Ok(())
    }

    /// Replace the resource with the same label, or append it.
    ///
    /// Returns `true` if an existing resource was replaced.
    pub fn upsert(&mut self, resource: Resource) -> bool {
        match self.resources.iter_mut().find(|r| r.label == resource.label) {
            Some(existing) => {
                *existing = resource;
                true
            }
            None => {
                self.resources.push(resource);
                false
            }
        }
    }

    /// Apply `patch` to the resource labeled `label`.
    pub fn update(&mut self, label: &str, patch: &ResourcePatch) -> Result<&Resource> {
        let existing = self
            .resources
            .iter_mut()
            .find(|r| r.label == label)
            .ok_or_else(|| VaultError::NotFound(label.to_string()))?;
        *existing = existing.apply(patch);
        Ok(&*existing)
    }

    /// Remove a resource by label
    pub fn remove(&mut self, label: &str) -> Option<Resource> {
        let index = self.resources.iter().position(|r| r.label == label)?;
        Some(self.resources.remove(index))
    }

    /// Resources fetched from `owner/repo`.
    pub fn siblings<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
    ) -> impl Iterator<Item = &'a Resource> {
        self.resources.iter().filter(move |r| r.same_repo(owner, repo))
    }

    pub fn filter_by_owner(&self, owner: &str) -> Vec<&Resource> {
        self.resources.iter().filter(|r| r.owner == owner).collect()
    }

    pub fn filter_by_repo(&self, owner: &str, repo: &str) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| r.same_repo(owner, repo))
            .collect()
    }

    pub fn filter_by_unit_name(&self, unit_name: &str) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| r.unit_name.as_deref() == Some(unit_name))
            .collect()
    }

    pub fn filter_by_status(&self, status: ValidationStatus) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| r.validation_status == status)
            .collect()
    }

    /// Encode as `{ "version": ..., "resources": [...] }`.
    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        document.insert("version".into(), Value::String(self.version.clone()));
        document.insert(
            "resources".into(),
            Value::Array(
                self.resources
                    .iter()
                    .map(|r| Value::Object(r.to_record()))
                    .collect(),
            ),
        );
        Value::Object(document)
    }

    /// Decode a manifest document.
    ///
    /// Accepts `version`/`resources` with or without a leading `:`. Duplicate
    /// labels in the document collapse to the last occurrence.
    pub fn from_document(document: &Value) -> Result<Self> {
        let Value::Object(map) = document else {
            return Err(VaultError::Manifest(
                "manifest must be a JSON object".to_string(),
            ));
        };
        let field = |key: &str| map.get(key).or_else(|| map.get(&format!(":{key}")));

        let version = match field("version") {
            Some(Value::String(version)) => version.clone(),
            Some(Value::Number(version)) => version.to_string(),
            _ => MANIFEST_VERSION.to_string(),
        };

        let records: &[Value] = match field("resources") {
            None | Some(Value::Null) => &[],
            Some(Value::Array(records)) => records,
            Some(_) => {
                return Err(VaultError::Manifest(
                    "'resources' must be a list".to_string(),
                ));
            }
        };

        let mut catalog = Catalog {
            version,
            resources: Vec::with_capacity(records.len()),
        };
        for record in records {
            let Value::Object(record) = record else {
                return Err(VaultError::Manifest(
                    "every resource record must be an object".to_string(),
                ));
            };
            catalog.upsert(Resource::from_record(record)?);
        }
        Ok(catalog)
    }

    /// Validate the catalog
    pub fn validate(&self) -> Result<()> {
        let major = self.version.split('.').next().unwrap_or_default();
        if major != "1" {
            return Err(VaultError::Manifest(format!(
                "Unsupported manifest version: {}",
                self.version
            )));
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
