use std::path::PathBuf;

use tempfile::TempDir;

use skillvault_core::config::{ConfigStore, VaultConfig};
use skillvault_core::context::VaultContext;

#[test]
fn load_missing_returns_default_config() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_path(temp.path().join("config.toml"));

    let config = store.load().unwrap();

    assert_eq!(config, VaultConfig::new());
    assert_eq!(config.host(), "github.com");
}

#[test]
fn save_then_load_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_path(temp.path().join("nested/config.toml"));
    let config = VaultConfig {
        storage_root: Some(temp.path().join("vault")),
        manifest_path: None,
        host: Some("git.example.com".to_string()),
    };

    store.save(&config).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn save_rejects_invalid_host() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_path(temp.path().join("config.toml"));
    let config = VaultConfig {
        host: Some("https://github.com".to_string()),
        ..VaultConfig::default()
    };

    assert!(store.save(&config).is_err());
    assert!(!store.config_path().exists());
}

#[test]
fn load_reports_parse_errors() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "host = \n").unwrap();

    let err = ConfigStore::from_path(&path).load().unwrap_err();

    assert!(format!("{err:#}").contains("line"));
}

#[test]
fn context_prefers_storage_override() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_path(temp.path().join("config.toml"));
    store
        .save(&VaultConfig {
            storage_root: Some(temp.path().join("configured")),
            manifest_path: None,
            host: Some("git.example.com".to_string()),
        })
        .unwrap();

    let configured = VaultContext::load(&store, None).unwrap();
    assert_eq!(configured.storage_root(), temp.path().join("configured"));
    assert_eq!(
        configured.manifest_path(),
        temp.path().join("configured/manifest.json")
    );
    assert_eq!(configured.host(), "git.example.com");

    let override_root: PathBuf = temp.path().join("override");
    let overridden = VaultContext::load(&store, Some(override_root.clone())).unwrap();
    assert_eq!(overridden.storage_root(), override_root);
    assert_eq!(
        overridden.manifest_path(),
        override_root.join("manifest.json")
    );
}

#[test]
fn context_vault_uses_configured_host() {
    let temp = TempDir::new().unwrap();
    let context = VaultContext::new(
        temp.path().join("vault"),
        temp.path().join("manifest.json"),
        "git.example.com",
    );

    let vault = context.vault();

    assert_eq!(vault.resolver().host(), "git.example.com");
    assert_eq!(vault.manifest_path(), temp.path().join("manifest.json"));
    assert!(
        vault
            .resolver()
            .resolve("https://git.example.com/acme/tools")
            .is_ok()
    );
}
