//! Address types produced by source resolution.

use serde::{Deserialize, Serialize};

use crate::types::ResourceKind;

/// Structured decomposition of a source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// The URL exactly as given by the caller
    pub source_url: String,
    /// URL scheme (`http` or `https`)
    pub scheme: String,
    /// Host the repository lives on (e.g., "github.com")
    pub host: String,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name, without any `.git` suffix
    pub repo: String,
    /// Branch to fetch
    pub branch: String,
    /// Whether this points at the whole repo, a folder, or a file
    pub kind: ResourceKind,
    /// Path inside the repository (Folder and File only)
    pub relative_path: Option<String>,
    /// Unit name, set only when the address is a `SKILL.md` file
    pub unit_name: Option<String>,
    /// Folder holding the `SKILL.md`, relative to the repo root ("." at the root)
    pub unit_folder_path: Option<String>,
    /// Default label for resources created from this address
    pub label: String,
}

impl Address {
    /// Remote URL suitable for `git clone`.
    pub fn clone_url(&self) -> String {
        clone_url(&self.scheme, &self.host, &self.owner, &self.repo)
    }

    /// `"{owner}/{repo}"`.
    pub fn repo_label(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// True when this is a file address pointing at a `SKILL.md`.
    pub fn is_marker_file(&self) -> bool {
        self.kind == ResourceKind::File && self.unit_name.is_some()
    }

    /// Folder that must be checked out to materialize a file address.
    ///
    /// Returns `None` when the file sits at the repository root.
    pub fn parent_folder(&self) -> Option<String> {
        let path = self.relative_path.as_deref()?;
        match path.rsplit_once('/') {
            Some((parent, _)) if !parent.is_empty() => Some(parent.to_string()),
            _ => None,
        }
    }
}

/// Build a clone URL from its parts.
pub fn clone_url(scheme: &str, host: &str, owner: &str, repo: &str) -> String {
    format!("{}://{}/{}/{}.git", scheme, host, owner, repo)
}
