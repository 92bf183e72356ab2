//! Skillvault Core Library
//!
//! Tracks skill repositories fetched from a git host: resolves source URLs,
//! discovers `SKILL.md` units in the fetched trees, validates them, and
//! keeps a persistent catalog of everything in the vault.

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod fs;
pub mod git;
pub mod skills;
pub mod source;
pub mod types;
pub mod vault;

/// Re-exports of commonly used types
pub mod prelude {
    // Catalog
    pub use crate::catalog::{Catalog, ManifestStore, Resource, ResourcePatch};

    // Configuration
    pub use crate::config::{ConfigStore, VaultConfig};
    pub use crate::context::VaultContext;

    // Errors
    pub use crate::error::{Result, VaultError};

    // Fetching
    pub use crate::git::{Fetcher, GitFetcher};

    // Skills
    pub use crate::skills::{DiscoveredUnit, SkillValidator, ValidationResult, scan};

    // Sources
    pub use crate::source::{Address, AddressResolver};

    // Types
    pub use crate::types::{ResourceKind, ValidationStatus};

    // Engine
    pub use crate::vault::{ImportSummary, RedownloadOutcome, SyncOutcome, Vault};
}
