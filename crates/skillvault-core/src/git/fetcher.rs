//! Git-backed fetcher for vault working copies.

use std::path::Path;
use std::process::Command;

use crate::error::{Result, VaultError};

use super::Fetcher;

/// Clones repositories with the `git` binary.
///
/// Full fetches are shallow clones. Sparse fetches use a blob-less clone with
/// cone-mode sparse checkout, so only the requested folders hit the disk.
#[derive(Debug, Default, Clone)]
pub struct GitFetcher;

impl GitFetcher {
    pub fn new() -> Self {
        Self
    }

    /// Ensure git version is 2.25+ (required for sparse checkout).
    pub fn ensure_git_version() -> Result<()> {
        let stdout = Self::capture_git(None, &["--version"])?;
        let version = stdout.split_whitespace().nth(2).ok_or_else(|| {
            VaultError::external("git --version", format!("unexpected output: {stdout}"))
        })?;
        let invalid =
            || VaultError::external("git --version", format!("invalid version: {version}"));
        let mut parts = version.split('.');
        let major: u32 = parts
            .next()
            .and_then(|part| part.parse().ok())
            .ok_or_else(invalid)?;
        let minor: u32 = parts
            .next()
            .and_then(|part| part.parse().ok())
            .ok_or_else(invalid)?;
        if major > 2 || (major == 2 && minor >= 25) {
            return Ok(());
        }
        Err(VaultError::external(
            "git --version",
            "Git 2.25+ is required for sparse checkout. Please upgrade git.",
        ))
    }

    fn is_working_copy(local: &Path) -> bool {
        local.join(".git").exists()
    }

    fn is_sparse(local: &Path) -> bool {
        Self::capture_git(Some(local), &["config", "--get", "core.sparseCheckout"])
            .map(|value| value.trim() == "true")
            .unwrap_or(false)
    }

    fn prepare_parent(local: &Path) -> Result<()> {
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent).map_err(|err| VaultError::io(parent, err))?;
        }
        Ok(())
    }

    fn path_arg(local: &Path) -> Result<&str> {
        local
            .to_str()
            .ok_or_else(|| VaultError::InvalidPath(local.to_path_buf()))
    }

    /// Run a git command.
    fn run_git(cwd: Option<&Path>, args: &[&str]) -> Result<()> {
        Self::capture_git(cwd, args).map(|_| ())
    }

    /// Run a git command and return its stdout.
    fn capture_git(cwd: Option<&Path>, args: &[&str]) -> Result<String> {
        let operation = format!("git {}", args.first().copied().unwrap_or_default());
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        tracing::debug!(?args, cwd = ?cwd, "Running git");
        let output = cmd.output().map_err(|err| {
            VaultError::external(&operation, format!("failed to spawn git: {err}"))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VaultError::external(
                operation,
                format!("{:?}: {}", args, stderr.trim()),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Fetcher for GitFetcher {
    fn fetch(&self, remote: &str, local: &Path, branch: &str) -> Result<()> {
        if Self::is_working_copy(local) {
            if Self::is_sparse(local) {
                Self::run_git(Some(local), &["sparse-checkout", "disable"])?;
            }
            return Self::run_git(Some(local), &["pull", "--ff-only"]);
        }

        Self::prepare_parent(local)?;
        Self::run_git(
            None,
            &[
                "clone",
                "--depth",
                "1",
                "--branch",
                branch,
                remote,
                Self::path_arg(local)?,
            ],
        )?;
        tracing::info!(remote, path = %local.display(), "Cloned repository");
        Ok(())
    }

    fn sparse_fetch(
        &self,
        remote: &str,
        local: &Path,
        branch: &str,
        paths: &[String],
    ) -> Result<()> {
        if paths.is_empty() || paths.iter().any(|path| path == "." || path.is_empty()) {
            return self.fetch(remote, local, branch);
        }
        Self::ensure_git_version()?;
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();

        if Self::is_working_copy(local) {
            // A full checkout already contains every path
            if Self::is_sparse(local) {
                let mut args = vec!["sparse-checkout", "add"];
                args.extend(&paths);
                Self::run_git(Some(local), &args)?;
            }
            return Self::run_git(Some(local), &["pull", "--ff-only"]);
        }

        Self::prepare_parent(local)?;
        Self::run_git(
            None,
            &[
                "clone",
                "--filter=blob:none",
                "--no-checkout",
                "--depth",
                "1",
                "--branch",
                branch,
                remote,
                Self::path_arg(local)?,
            ],
        )?;
        Self::run_git(Some(local), &["sparse-checkout", "init", "--cone"])?;
        let mut args = vec!["sparse-checkout", "set"];
        args.extend(&paths);
        Self::run_git(Some(local), &args)?;
        Self::run_git(Some(local), &["checkout", branch])?;
        tracing::info!(remote, path = %local.display(), ?paths, "Sparse-cloned repository");
        Ok(())
    }

    fn refresh(&self, local: &Path) -> Result<()> {
        if !Self::is_working_copy(local) {
            return Err(VaultError::external(
                "git pull",
                format!("not a git working copy: {}", local.display()),
            ));
        }
        Self::run_git(Some(local), &["pull", "--ff-only"])
    }
}
