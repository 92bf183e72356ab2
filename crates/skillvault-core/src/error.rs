//! Error taxonomy for vault operations.

use std::path::PathBuf;

/// Errors surfaced by the resolver, discovery, catalog and engine layers.
///
/// Schema violations found while validating a `SKILL.md` are never reported
/// through this type; they are data on [`crate::skills::ValidationResult`].
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The source URL could not be interpreted as a repository address.
    #[error("Invalid address '{url}': {reason}")]
    InvalidAddress { url: String, reason: String },

    /// A resource with this label is already tracked.
    #[error("A resource labeled '{0}' already exists")]
    DuplicateLabel(String),

    /// No resource with this label is tracked.
    #[error("No resource labeled '{0}'")]
    NotFound(String),

    /// A fetch/refresh collaborator reported failure.
    #[error("{operation} failed: {message}")]
    ExternalOperationFailure { operation: String, message: String },

    /// Discovery was pointed at something that is not a directory.
    #[error("Not a directory: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted manifest could not be decoded or encoded.
    #[error("Manifest error: {0}")]
    Manifest(String),
}

impl VaultError {
    pub fn invalid_address(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn external(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalOperationFailure {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
