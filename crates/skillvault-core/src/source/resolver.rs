//! Source URL resolver implementation.

use url::Url;

use crate::error::{Result, VaultError};
use crate::types::{DEFAULT_BRANCH, MARKER_FILE, ResourceKind};

use super::spec::Address;

/// Host accepted when no other host is configured.
pub const DEFAULT_HOST: &str = "github.com";

const TREE_MARKER: &str = "tree";
const BLOB_MARKER: &str = "blob";

/// Resolves web URLs into [`Address`]es for a single source host.
#[derive(Debug, Clone)]
pub struct AddressResolver {
    host: String,
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

impl AddressResolver {
    /// Create a resolver that accepts URLs on `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into().to_ascii_lowercase(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Resolve a source URL into an address.
    ///
    /// Handles:
    /// - `https://host/owner/repo` -> Repo
    /// - `https://host/owner/repo/tree/<branch>/<path>` -> Folder (Repo when path is empty)
    /// - `https://host/owner/repo/blob/<branch>/<path>` -> File
    ///
    /// Any other third segment falls back to a Repo address on `main`.
    pub fn resolve(&self, source: &str) -> Result<Address> {
        let url = Url::parse(source.trim())
            .map_err(|err| VaultError::invalid_address(source, err.to_string()))?;

        let scheme = url.scheme().to_string();
        if scheme != "http" && scheme != "https" {
            return Err(VaultError::invalid_address(
                source,
                format!("unsupported scheme '{}'", scheme),
            ));
        }

        let host = url
            .host_str()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| VaultError::invalid_address(source, "missing host"))?;
        if host != self.host {
            return Err(VaultError::invalid_address(
                source,
                format!("expected host '{}', found '{}'", self.host, host),
            ));
        }

        let segments = Self::decoded_segments(&url, source)?;
        if segments.len() < 2 {
            return Err(VaultError::invalid_address(
                source,
                "expected at least owner and repository in the path",
            ));
        }

        let owner = segments[0].clone();
        let repo = segments[1]
            .strip_suffix(".git")
            .unwrap_or(&segments[1])
            .to_string();
        if repo.is_empty() {
            return Err(VaultError::invalid_address(source, "empty repository name"));
        }

        let mut address = Address {
            source_url: source.to_string(),
            scheme,
            host,
            label: format!("{}/{}", owner, repo),
            owner,
            repo,
            branch: DEFAULT_BRANCH.to_string(),
            kind: ResourceKind::Repo,
            relative_path: None,
            unit_name: None,
            unit_folder_path: None,
        };

        match segments.get(2).map(String::as_str) {
            Some(TREE_MARKER) => Self::apply_tree(&mut address, &segments[3..]),
            Some(BLOB_MARKER) => Self::apply_blob(&mut address, &segments[3..], source)?,
            // Unrecognized (or absent) third segment: treat as the repo itself.
            _ => {}
        }

        Ok(address)
    }

    /// Percent-decode each path segment on its own.
    ///
    /// Only the empty segment left by a trailing slash is dropped; an empty
    /// segment anywhere else (`//acme/tools`) is rejected.
    fn decoded_segments(url: &Url, source: &str) -> Result<Vec<String>> {
        let Some(raw) = url.path_segments() else {
            return Err(VaultError::invalid_address(source, "URL has no path"));
        };

        let mut raw: Vec<&str> = raw.collect();
        if raw.last().is_some_and(|segment| segment.is_empty()) {
            raw.pop();
        }
        if raw.iter().any(|segment| segment.is_empty()) {
            return Err(VaultError::invalid_address(source, "empty path segment"));
        }

        raw.into_iter()
            .map(|segment| {
                urlencoding::decode(segment)
                    .map(|decoded| decoded.into_owned())
                    .map_err(|err| {
                        VaultError::invalid_address(
                            source,
                            format!("bad percent-encoding in '{}': {}", segment, err),
                        )
                    })
            })
            .collect()
    }

    /// `tree/<branch>/<path...>`
    fn apply_tree(address: &mut Address, rest: &[String]) {
        if let Some(branch) = rest.first() {
            address.branch = branch.clone();
        }
        let path = rest.get(1..).unwrap_or_default();
        if path.is_empty() {
            return;
        }

        address.kind = ResourceKind::Folder;
        address.relative_path = Some(path.join("/"));
        address.label = format!(
            "{}/{}/{}",
            address.owner,
            address.repo,
            path[path.len() - 1]
        );
    }

    /// `blob/<branch>/<path...>`
    fn apply_blob(address: &mut Address, rest: &[String], source: &str) -> Result<()> {
        if let Some(branch) = rest.first() {
            address.branch = branch.clone();
        }
        let path = rest.get(1..).unwrap_or_default();
        let Some(file_name) = path.last() else {
            return Err(VaultError::invalid_address(
                source,
                "blob URL is missing a file path after the branch",
            ));
        };

        address.kind = ResourceKind::File;
        address.relative_path = Some(path.join("/"));

        if file_name == MARKER_FILE {
            let folders = &path[..path.len() - 1];
            let unit_name = folders
                .last()
                .cloned()
                .unwrap_or_else(|| address.repo.clone());
            let unit_folder_path = if folders.is_empty() {
                ".".to_string()
            } else {
                folders.join("/")
            };
            address.label = format!("{}/{}/{}", address.owner, address.repo, unit_name);
            address.unit_name = Some(unit_name);
            address.unit_folder_path = Some(unit_folder_path);
        } else {
            address.label = format!("{}/{}/{}", address.owner, address.repo, file_name);
        }

        Ok(())
    }
}
