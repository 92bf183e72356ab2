//! Skill unit discovery.
//!
//! A skill unit is any directory that directly contains a `SKILL.md`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::types::MARKER_FILE;

/// A skill unit found under a scan root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredUnit {
    /// Directory path relative to the scan root ("." for the root itself)
    pub relative_path: String,
    /// Same value as `relative_path`
    pub folder_path: String,
    /// Base name of the unit directory
    pub unit_name: String,
    /// Absolute path to the unit directory
    pub path: PathBuf,
}

impl DiscoveredUnit {
    /// Path to the unit's `SKILL.md`.
    pub fn marker_path(&self) -> PathBuf {
        self.path.join(MARKER_FILE)
    }

    /// True when the unit is the scan root.
    pub fn is_root(&self) -> bool {
        self.relative_path == "."
    }
}

/// Recursively find every skill unit under `root`.
///
/// # Ordering
/// Entries are visited in name order, depth first, so the result is
/// deterministic for a fixed tree.
///
/// # Notes
/// - The marker match is exact and case-sensitive (`skill.md` is not a unit)
/// - `.git` directories and symlinked directories are not entered
pub fn scan(root: &Path) -> Result<Vec<DiscoveredUnit>> {
    if !root.is_dir() {
        return Err(VaultError::InvalidPath(root.to_path_buf()));
    }

    let root_name = root_name(root);
    let mut units = Vec::new();
    scan_dir(root, "", &root_name, &mut units)?;

    tracing::debug!(root = %root.display(), units = units.len(), "Scanned for skill units");
    Ok(units)
}

fn scan_dir(
    dir: &Path,
    rel: &str,
    root_name: &str,
    units: &mut Vec<DiscoveredUnit>,
) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|err| VaultError::io(dir, err))?;
    let mut sorted_entries: Vec<_> = entries
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| VaultError::io(dir, err))?;
    sorted_entries.sort_by_key(|entry| entry.file_name());

    // Exact name match, even on case-insensitive filesystems
    let has_marker = sorted_entries.iter().any(|entry| {
        entry.file_name() == MARKER_FILE
            && entry.file_type().map(|ty| ty.is_file()).unwrap_or(false)
    });
    if has_marker {
        let (relative_path, unit_name) = if rel.is_empty() {
            (".".to_string(), root_name.to_string())
        } else {
            let name = rel.rsplit('/').next().unwrap_or(rel).to_string();
            (rel.to_string(), name)
        };
        units.push(DiscoveredUnit {
            folder_path: relative_path.clone(),
            relative_path,
            unit_name,
            path: dir.to_path_buf(),
        });
    }

    for entry in sorted_entries {
        let ty = entry
            .file_type()
            .map_err(|err| VaultError::io(entry.path(), err))?;
        if !ty.is_dir() || entry.file_name() == ".git" {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let child_rel = if rel.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", rel, name)
        };
        scan_dir(&entry.path(), &child_rel, root_name, units)?;
    }

    Ok(())
}

/// Base name of the scan root, resolving `.`/`..` through the filesystem.
fn root_name(root: &Path) -> String {
    let resolved;
    let path = if root.file_name().is_some() {
        root
    } else {
        resolved = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        resolved.as_path()
    };
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
