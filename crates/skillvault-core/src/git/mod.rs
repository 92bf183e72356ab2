//! Fetching repository content into working copies.
//!
//! The engine only talks to the [`Fetcher`] trait. [`GitFetcher`] is the
//! production implementation and shells out to the `git` binary.

mod fetcher;

pub use fetcher::GitFetcher;

use std::fmt::Debug;
use std::path::Path;

use crate::error::Result;

/// Transport boundary between the engine and version control.
///
/// `remote` is a clone URL and `local` is the working copy directory.
/// Implementations report every failure as
/// [`crate::error::VaultError::ExternalOperationFailure`].
pub trait Fetcher: Debug {
    /// Materialize the whole tree of `branch` at `local`.
    fn fetch(&self, remote: &str, local: &Path, branch: &str) -> Result<()>;

    /// Materialize only `paths` (repo-relative folders) of `branch` at `local`.
    ///
    /// Paths already checked out in an existing working copy stay checked out.
    fn sparse_fetch(
        &self,
        remote: &str,
        local: &Path,
        branch: &str,
        paths: &[String],
    ) -> Result<()>;

    /// Bring an existing working copy up to date with its upstream.
    fn refresh(&self, local: &Path) -> Result<()>;
}
