//! Manifest persistence.
//!
//! The manifest is a single JSON document. Saves are atomic (tmp + rename)
//! so a crash mid-write never leaves a truncated catalog behind.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, VaultError};

use super::types::Catalog;

/// Reads and writes the catalog document at a fixed path.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the manifest file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the catalog from disk.
    ///
    /// Returns a new empty catalog if the file doesn't exist.
    pub fn load(&self) -> Result<Catalog> {
        if !self.path.exists() {
            return Ok(Catalog::new());
        }
        Self::read(&self.path)
    }

    /// Decode a manifest document from any path (used for imports).
    pub fn read(path: &Path) -> Result<Catalog> {
        let bytes = fs::read(path).map_err(|err| VaultError::io(path, err))?;
        let document: serde_json::Value = serde_json::from_slice(&bytes).map_err(|err| {
            VaultError::Manifest(format!("Failed to parse {}: {}", path.display(), err))
        })?;
        let catalog = Catalog::from_document(&document)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Save the catalog atomically (tmp + rename).
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|err| VaultError::io(dir, err))?;

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "manifest.json".to_string());
        let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, std::process::id()));

        let mut bytes = serde_json::to_vec_pretty(&catalog.to_document())
            .map_err(|err| VaultError::Manifest(format!("Failed to serialize manifest: {err}")))?;
        bytes.push(b'\n');

        fs::write(&tmp_path, bytes).map_err(|err| VaultError::io(&tmp_path, err))?;

        // Remove target first on Windows for replace semantics
        if cfg!(windows) && self.path.exists() {
            fs::remove_file(&self.path).map_err(|err| VaultError::io(&self.path, err))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|err| VaultError::io(&tmp_path, err))?;

        tracing::debug!(path = %self.path.display(), resources = catalog.len(), "Saved manifest");
        Ok(())
    }

    /// Apply `f` to the catalog and save it when `f` succeeds.
    pub fn modify<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Catalog) -> Result<T>,
    {
        let mut catalog = self.load()?;
        let value = f(&mut catalog)?;
        self.save(&catalog)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::resource::{Resource, now};
    use crate::source::AddressResolver;
    use tempfile::TempDir;

    fn resource(label: &str) -> Resource {
        let address = AddressResolver::default()
            .resolve("https://github.com/acme/tools")
            .unwrap();
        Resource::new(label, &address, now())
    }

    #[test]
    fn test_load_missing_returns_empty_catalog() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let store = ManifestStore::new(tmp.path().join("manifest.json"));

        let catalog = store.load().expect("load should succeed");

        assert!(catalog.is_empty());
        assert_eq!(catalog.version, "1.0");
        assert!(!store.exists());
    }

    #[test]
    fn test_save_and_load_persist_data() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let store = ManifestStore::new(tmp.path().join("nested/dir/manifest.json"));

        let mut catalog = Catalog::new();
        catalog.add(resource("acme/tools")).unwrap();
        store.save(&catalog).expect("save should succeed");

        let loaded = store.load().expect("load should succeed");
        assert_eq!(loaded, catalog);

        // No temp files left behind
        let leftovers: Vec<_> = fs::read_dir(tmp.path().join("nested/dir"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_saved_document_shape() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let store = ManifestStore::new(tmp.path().join("manifest.json"));
        let mut catalog = Catalog::new();
        catalog.add(resource("acme/tools")).unwrap();
        store.save(&catalog).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], "1.0");
        assert_eq!(raw["resources"][0]["label"], "acme/tools");
        assert_eq!(raw["resources"][0]["resource_type"], "repo");
        assert_eq!(raw["resources"][0]["validation_status"], "unvalidated");
    }

    #[test]
    fn test_load_rejects_corrupt_manifest() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let path = tmp.path().join("manifest.json");
        fs::write(&path, "{ not json").unwrap();

        let err = ManifestStore::new(&path).load().unwrap_err();
        assert!(matches!(err, VaultError::Manifest(_)));
    }

    #[test]
    fn test_modify_saves_only_on_success() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let store = ManifestStore::new(tmp.path().join("manifest.json"));

        store
            .modify(|catalog| catalog.add(resource("a")))
            .expect("modify should succeed");
        let err = store
            .modify(|catalog| {
                catalog.add(resource("b"))?;
                catalog.add(resource("a"))
            })
            .unwrap_err();

        assert!(matches!(err, VaultError::DuplicateLabel(_)));
        assert_eq!(store.load().unwrap().labels(), vec!["a"]);
    }
}
