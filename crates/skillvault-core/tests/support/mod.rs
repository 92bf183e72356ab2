#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use skillvault_core::catalog::{ManifestStore, ResourcePatch};
use skillvault_core::error::{Result, VaultError};
use skillvault_core::git::Fetcher;
use skillvault_core::vault::Vault;

pub fn skill_md(name: &str) -> String {
    format!("---\nname: {name}\ndescription: Test skill for {name}.\n---\n# {name}\n")
}

/// Frontmatter with a name but no description.
pub fn skill_md_without_description(name: &str) -> String {
    format!("---\nname: {name}\n---\n# {name}\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCall {
    Fetch { remote: String, local: PathBuf },
    Sparse { remote: String, local: PathBuf, paths: Vec<String> },
    Refresh { local: PathBuf },
}

/// Fetcher that copies trees out of a local "remotes" directory.
///
/// A clone of `https://github.com/{owner}/{repo}.git` copies
/// `{remotes}/{owner}/{repo}`. The working copy gets a `.git` directory
/// recording the remote and any sparse paths so `refresh` can re-copy.
#[derive(Debug, Clone)]
pub struct FakeFetcher {
    remotes: PathBuf,
    calls: Rc<RefCell<Vec<FetchCall>>>,
    offline: Rc<Cell<bool>>,
}

impl FakeFetcher {
    fn source_for(&self, remote: &str) -> Result<PathBuf> {
        let trimmed = remote.trim_end_matches(".git");
        let mut parts = trimmed.rsplitn(3, '/');
        let (Some(repo), Some(owner)) = (parts.next(), parts.next()) else {
            return Err(VaultError::external("git clone", format!("bad remote {remote}")));
        };
        let source = self.remotes.join(owner).join(repo);
        if !source.is_dir() {
            return Err(VaultError::external(
                "git clone",
                format!("repository not found: {remote}"),
            ));
        }
        Ok(source)
    }

    fn check_online(&self, operation: &str) -> Result<()> {
        if self.offline.get() {
            return Err(VaultError::external(operation, "could not resolve host"));
        }
        Ok(())
    }

    fn materialize(&self, source: &Path, local: &Path, paths: &[String]) -> Result<()> {
        clear_checkout(local)?;
        if paths.is_empty() {
            copy_tree(source, local)?;
        } else {
            for path in paths {
                let from = source.join(path);
                if from.exists() {
                    copy_tree(&from, &local.join(path))?;
                }
            }
        }
        Ok(())
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, remote: &str, local: &Path, _branch: &str) -> Result<()> {
        self.calls.borrow_mut().push(FetchCall::Fetch {
            remote: remote.to_string(),
            local: local.to_path_buf(),
        });
        self.check_online("git clone")?;
        let source = self.source_for(remote)?;
        self.materialize(&source, local, &[])?;
        write_git_dir(local, remote, &[])
    }

    fn sparse_fetch(
        &self,
        remote: &str,
        local: &Path,
        _branch: &str,
        paths: &[String],
    ) -> Result<()> {
        self.calls.borrow_mut().push(FetchCall::Sparse {
            remote: remote.to_string(),
            local: local.to_path_buf(),
            paths: paths.to_vec(),
        });
        self.check_online("git clone")?;
        let source = self.source_for(remote)?;

        // Widen an existing sparse checkout the way `sparse-checkout add` does
        let mut all_paths = read_sparse_paths(local);
        if local.join(".git").is_dir() && all_paths.is_empty() {
            self.materialize(&source, local, &[])?;
            return write_git_dir(local, remote, &[]);
        }
        for path in paths {
            if !all_paths.contains(path) {
                all_paths.push(path.clone());
            }
        }
        self.materialize(&source, local, &all_paths)?;
        write_git_dir(local, remote, &all_paths)
    }

    fn refresh(&self, local: &Path) -> Result<()> {
        self.calls.borrow_mut().push(FetchCall::Refresh {
            local: local.to_path_buf(),
        });
        self.check_online("git pull")?;
        let origin = fs::read_to_string(local.join(".git/origin")).map_err(|_| {
            VaultError::external("git pull", format!("not a git working copy: {}", local.display()))
        })?;
        let paths = read_sparse_paths(local);
        let source = self.source_for(origin.trim())?;
        self.materialize(&source, local, &paths)
    }
}

/// Temporary storage root, remotes directory and a vault wired to a [`FakeFetcher`].
pub struct Fixture {
    pub temp: TempDir,
    pub storage: PathBuf,
    pub remotes: PathBuf,
    fetcher: FakeFetcher,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let storage = temp.path().join("vault");
        let remotes = temp.path().join("remotes");
        fs::create_dir_all(&storage).unwrap();
        fs::create_dir_all(&remotes).unwrap();
        let fetcher = FakeFetcher {
            remotes: remotes.clone(),
            calls: Rc::default(),
            offline: Rc::default(),
        };
        Self {
            temp,
            storage,
            remotes,
            fetcher,
        }
    }

    pub fn vault(&self) -> Vault {
        Vault::new(
            self.storage.clone(),
            ManifestStore::new(self.manifest_path()),
            Box::new(self.fetcher.clone()),
        )
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.storage.join("manifest.json")
    }

    /// Write `content` at `path` inside the remote `owner/repo`.
    pub fn write_remote(&self, repo: &str, path: &str, content: &str) {
        let target = self.remotes.join(repo).join(path);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, content).unwrap();
    }

    pub fn remove_remote(&self, repo: &str, path: &str) {
        let target = self.remotes.join(repo).join(path);
        if target.is_dir() {
            fs::remove_dir_all(target).unwrap();
        } else {
            fs::remove_file(target).unwrap();
        }
    }

    /// Working copy of `owner/repo` inside the vault.
    pub fn local(&self, repo: &str) -> PathBuf {
        self.storage.join(repo)
    }

    /// Full checkout of `owner/repo` into the vault, outside any vault operation.
    pub fn checkout(&self, repo: &str) {
        let remote = format!("https://github.com/{repo}.git");
        self.fetcher.fetch(&remote, &self.local(repo), "main").unwrap();
        self.clear_calls();
    }

    /// Write a manifest document by hand.
    pub fn write_manifest(&self, document: serde_json::Value) {
        fs::write(
            self.manifest_path(),
            serde_json::to_string_pretty(&document).unwrap(),
        )
        .unwrap();
    }

    /// Set every resource's `last_synced_at` to a fixed past time and return it.
    pub fn backdate_syncs(&self) -> DateTime<Utc> {
        let at: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().unwrap();
        ManifestStore::new(self.manifest_path())
            .modify(|catalog| {
                for label in catalog.labels() {
                    catalog.update(&label, &ResourcePatch::synced_at(at))?;
                }
                Ok(())
            })
            .unwrap();
        at
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.fetcher.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.fetcher.calls.borrow_mut().clear();
    }

    pub fn set_offline(&self, offline: bool) {
        self.fetcher.offline.set(offline);
    }
}

fn write_git_dir(local: &Path, remote: &str, paths: &[String]) -> Result<()> {
    let git_dir = local.join(".git");
    fs::create_dir_all(&git_dir).map_err(|err| VaultError::io(&git_dir, err))?;
    fs::write(git_dir.join("origin"), remote).map_err(|err| VaultError::io(&git_dir, err))?;
    fs::write(git_dir.join("sparse"), paths.join("\n"))
        .map_err(|err| VaultError::io(&git_dir, err))
}

fn read_sparse_paths(local: &Path) -> Vec<String> {
    fs::read_to_string(local.join(".git/sparse"))
        .map(|content| {
            content
                .lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Delete everything in `local` except `.git`.
fn clear_checkout(local: &Path) -> Result<()> {
    let Ok(entries) = fs::read_dir(local) else {
        return Ok(());
    };
    for entry in entries {
        let entry = entry.map_err(|err| VaultError::io(local, err))?;
        let path = entry.path();
        if entry.file_name() == ".git" {
            continue;
        }
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|err| VaultError::io(&path, err))?;
    }
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    if from.is_file() {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|err| VaultError::io(parent, err))?;
        }
        fs::copy(from, to).map_err(|err| VaultError::io(from, err))?;
        return Ok(());
    }
    fs::create_dir_all(to).map_err(|err| VaultError::io(to, err))?;
    for entry in fs::read_dir(from).map_err(|err| VaultError::io(from, err))? {
        let entry = entry.map_err(|err| VaultError::io(from, err))?;
        copy_tree(&entry.path(), &to.join(entry.file_name()))?;
    }
    Ok(())
}
