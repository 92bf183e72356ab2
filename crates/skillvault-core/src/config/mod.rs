//! Vault configuration
//!
//! A single optional TOML file at `{config_dir}/skillvault/config.toml`.
//! A missing file means "all defaults".

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_vault_toml, parse_vault_toml_str, to_toml};
pub use paths::{default_config_path, default_storage_root};
pub use schema::{MANIFEST_FILE, VaultConfig};
pub use store::ConfigStore;
