//! Shared core types used across the resolver, catalog and engine layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The file whose presence turns a folder into a skill unit.
pub const MARKER_FILE: &str = "SKILL.md";

/// Branch used when a source URL does not name one.
pub const DEFAULT_BRANCH: &str = "main";

/// What a resource points at inside its repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// The whole repository.
    Repo,
    /// A sub-folder of the repository.
    Folder,
    /// A single file.
    File,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Repo => "repo",
            ResourceKind::Folder => "folder",
            ResourceKind::File => "file",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "repo" | "repository" => Ok(Self::Repo),
            "folder" | "directory" | "dir" => Ok(Self::Folder),
            "file" => Ok(Self::File),
            other => Err(format!("Unknown resource type: {other}")),
        }
    }
}

/// Outcome of the most recent validation pass over a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Never validated (fresh import or legacy record).
    Unvalidated,
    /// Unit whose `SKILL.md` passed every schema check.
    ValidSkill,
    /// Unit whose `SKILL.md` failed at least one schema check.
    InvalidSkill,
    /// Resource without a `SKILL.md`.
    NotASkill,
}

impl ValidationStatus {
    pub const ALL: [ValidationStatus; 4] = [
        ValidationStatus::Unvalidated,
        ValidationStatus::ValidSkill,
        ValidationStatus::InvalidSkill,
        ValidationStatus::NotASkill,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Unvalidated => "unvalidated",
            ValidationStatus::ValidSkill => "valid_skill",
            ValidationStatus::InvalidSkill => "invalid_skill",
            ValidationStatus::NotASkill => "not_a_skill",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "unvalidated" => Ok(Self::Unvalidated),
            "valid_skill" | "validskill" | "valid" => Ok(Self::ValidSkill),
            "invalid_skill" | "invalidskill" | "invalid" => Ok(Self::InvalidSkill),
            "not_a_skill" | "notaskill" => Ok(Self::NotASkill),
            other => Err(format!("Unknown validation status: {other}")),
        }
    }
}
