//! Structured results for batch-friendly engine operations.

use serde::Serialize;

use crate::types::ValidationStatus;

/// Result of syncing one resource.
///
/// Transport and persistence failures are reported here instead of as errors,
/// so callers must check `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub label: String,
    pub success: bool,
    /// Why the sync failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Validation status of the synced resource afterwards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ValidationStatus>,
    /// Labels of unit resources created by this sync
    pub added: Vec<String>,
    /// Units found under the synced path
    pub units: usize,
    /// Whether the refresh changed anything on disk
    pub content_changed: bool,
}

impl SyncOutcome {
    pub fn failure(label: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            success: false,
            error: Some(error.into()),
            status: None,
            added: Vec::new(),
            units: 0,
            content_changed: false,
        }
    }
}

/// Counts from merging an imported manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub replaced: usize,
}

/// Result of re-fetching one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedownloadOutcome {
    pub label: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RedownloadOutcome {
    pub fn success(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            success: true,
            error: None,
        }
    }

    pub fn failure(label: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}
