//! Deterministic tree hashing for change detection
//!
//! Sync hashes a resource's local path before and after a refresh and
//! reports whether the content moved.

use std::fs;
use std::path::Path;

use crate::error::{Result, VaultError};

/// Compute deterministic tree hash of a directory or a single file
///
/// # Algorithm
/// - Recursive directory traversal, entries sorted by name
/// - Files: `blake3(relative_path || 0x00 || content)`
/// - Directories: `relative_path || 0xFF`, then their contents
/// - Symlinks: `relative_path || 0xFE || link target` (never followed)
/// - `.git` directories are skipped
/// - Output: hex string
///
/// # Example
/// ```no_run
/// use skillvault_core::fs::tree_hash::hash_tree;
/// use std::path::Path;
///
/// let hash = hash_tree(Path::new("/path/to/dir"))?;
/// assert_eq!(hash.len(), 64); // blake3 hex output
/// # Ok::<(), skillvault_core::error::VaultError>(())
/// ```
pub fn hash_tree(path: &Path) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    let metadata = fs::symlink_metadata(path).map_err(|err| VaultError::io(path, err))?;
    if metadata.is_file() {
        hasher.update(&[0x00]);
        let content = fs::read(path).map_err(|err| VaultError::io(path, err))?;
        hasher.update(&content);
    } else if metadata.is_dir() {
        hash_dir_recursive(&mut hasher, path, "")?;
    } else {
        return Err(VaultError::InvalidPath(path.to_path_buf()));
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Hash `path` if it exists, `None` otherwise.
pub fn try_hash_tree(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }
    match hash_tree(path) {
        Ok(hash) => Some(hash),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Failed to hash tree");
            None
        }
    }
}

fn hash_dir_recursive(hasher: &mut blake3::Hasher, dir: &Path, base: &str) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|err| VaultError::io(dir, err))?;

    // Collect and sort entries for deterministic ordering
    let mut sorted_entries: Vec<_> = entries
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| VaultError::io(dir, err))?;
    sorted_entries.sort_by_key(|e| e.file_name());

    for entry in sorted_entries {
        let name = entry.file_name();
        if name == ".git" {
            continue;
        }
        let name_str = name.to_string_lossy();
        let rel_path = if base.is_empty() {
            name_str.to_string()
        } else {
            format!("{}/{}", base, name_str)
        };

        let entry_path = entry.path();
        let ty = entry
            .file_type()
            .map_err(|err| VaultError::io(&entry_path, err))?;

        if ty.is_dir() {
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0xFF]); // Directory marker
            hash_dir_recursive(hasher, &entry_path, &rel_path)?;
        } else if ty.is_file() {
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0x00]); // Path separator
            let content = fs::read(&entry_path).map_err(|err| VaultError::io(&entry_path, err))?;
            hasher.update(&content);
        } else if ty.is_symlink() {
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0xFE]); // Symlink marker
            let target =
                fs::read_link(&entry_path).map_err(|err| VaultError::io(&entry_path, err))?;
            hasher.update(target.to_string_lossy().as_bytes());
        }
    }

    Ok(())
}
