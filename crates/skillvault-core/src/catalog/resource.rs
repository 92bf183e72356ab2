//! The persisted resource entity and its record encoding.
//!
//! Records are flat JSON objects. Decoding is deliberately forgiving so that
//! manifests written by older releases (symbol-style `:key` names, camelCase
//! keys, `skill_name`/`is_skill`/`folder` aliases) still load. Every default
//! is applied in [`Resource::from_record`] and nowhere else.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::error::{Result, VaultError};
use crate::skills::ValidationResult;
use crate::source::{Address, DEFAULT_HOST, clone_url};
use crate::types::{DEFAULT_BRANCH, MARKER_FILE, ResourceKind, ValidationStatus};

/// Current time truncated to whole seconds (the precision records keep).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// A tracked resource: a repository, folder, or file imported into the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Unique key within the vault
    pub label: String,
    /// URL the resource was added from
    pub source_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub kind: ResourceKind,
    /// Path inside the repository (unit folder for repo units, folder or file path otherwise)
    pub relative_path: Option<String>,
    /// Folder path written by older releases in place of `relative_path`
    pub folder_hint: Option<String>,
    pub added_at: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
    pub validation_status: ValidationStatus,
    pub validation_errors: Vec<String>,
    /// Name of the skill unit, when this resource is one
    pub unit_name: Option<String>,
    pub is_unit: bool,
}

impl Resource {
    /// Create an unvalidated resource for `address`, stamped with `at`.
    pub fn new(label: impl Into<String>, address: &Address, at: DateTime<Utc>) -> Self {
        Self {
            label: label.into(),
            source_url: address.source_url.clone(),
            owner: address.owner.clone(),
            repo: address.repo.clone(),
            branch: address.branch.clone(),
            kind: address.kind,
            relative_path: address.relative_path.clone(),
            folder_hint: None,
            added_at: at,
            last_synced_at: at,
            validation_status: ValidationStatus::Unvalidated,
            validation_errors: Vec::new(),
            unit_name: None,
            is_unit: false,
        }
    }

    /// Set the path inside the repository.
    pub fn with_relative_path(mut self, relative_path: Option<String>) -> Self {
        self.relative_path = relative_path;
        self
    }

    /// Mark this resource as the skill unit `unit_name`.
    pub fn with_unit(mut self, unit_name: impl Into<String>) -> Self {
        self.unit_name = Some(unit_name.into());
        self.is_unit = true;
        self
    }

    /// Record the outcome of validating this resource's `SKILL.md`.
    pub fn with_validation(self, result: &ValidationResult) -> Self {
        self.apply(&ResourcePatch::from_validation(result))
    }

    /// Mark as not being a skill.
    pub fn not_a_skill(self) -> Self {
        self.apply(&ResourcePatch::not_a_skill())
    }

    /// `"{owner}/{repo}"`.
    pub fn repo_label(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// True when this resource comes from `owner/repo`.
    pub fn same_repo(&self, owner: &str, repo: &str) -> bool {
        self.owner == owner && self.repo == repo
    }

    /// Local checkout shared by every resource of this repository.
    pub fn working_copy(&self, storage_root: &Path) -> PathBuf {
        storage_root.join(&self.owner).join(&self.repo)
    }

    /// Path inside the repository that locates this resource, honoring legacy hints.
    fn repo_path(&self) -> Option<&str> {
        self.relative_path
            .as_deref()
            .or(self.folder_hint.as_deref())
            .filter(|path| !path.is_empty() && *path != ".")
    }

    /// Where this resource lives on disk.
    ///
    /// Repo resources resolve to the working copy; folders and files resolve
    /// to their path inside it.
    pub fn local_path(&self, storage_root: &Path) -> PathBuf {
        let working_copy = self.working_copy(storage_root);
        match (self.kind, self.repo_path()) {
            (ResourceKind::Repo, _) | (_, None) => working_copy,
            (_, Some(path)) => working_copy.join(path),
        }
    }

    /// Directory that holds this resource's `SKILL.md` (when it is a unit).
    pub fn unit_dir(&self, storage_root: &Path) -> PathBuf {
        let working_copy = self.working_copy(storage_root);
        match self.kind {
            ResourceKind::Repo => match self.repo_path() {
                Some(path) => working_copy.join(path),
                None => working_copy,
            },
            ResourceKind::Folder => self.local_path(storage_root),
            ResourceKind::File => self
                .local_path(storage_root)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or(working_copy),
        }
    }

    /// Path to this resource's `SKILL.md`.
    pub fn marker_path(&self, storage_root: &Path) -> PathBuf {
        self.unit_dir(storage_root).join(MARKER_FILE)
    }

    /// Repo-relative folder a sparse checkout needs for this resource.
    ///
    /// `None` means only a full checkout will do.
    pub fn checkout_path(&self) -> Option<String> {
        let path = self.repo_path()?;
        match self.kind {
            ResourceKind::Repo => None,
            ResourceKind::Folder => Some(path.to_string()),
            ResourceKind::File => path
                .rsplit_once('/')
                .map(|(parent, _)| parent.to_string())
                .filter(|parent| !parent.is_empty()),
        }
    }

    /// A new repo-unit resource from the same repository as `self`.
    pub fn derive_unit(
        &self,
        label: impl Into<String>,
        unit_name: impl Into<String>,
        relative_path: Option<String>,
        at: DateTime<Utc>,
    ) -> Resource {
        Resource {
            label: label.into(),
            source_url: self.source_url.clone(),
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            branch: self.branch.clone(),
            kind: ResourceKind::Repo,
            relative_path,
            folder_hint: None,
            added_at: at,
            last_synced_at: at,
            validation_status: ValidationStatus::Unvalidated,
            validation_errors: Vec::new(),
            unit_name: None,
            is_unit: false,
        }
        .with_unit(unit_name)
    }

    /// Remote URL to clone this resource's repository from.
    pub fn clone_url(&self) -> String {
        match url::Url::parse(&self.source_url) {
            Ok(url) if url.host_str().is_some() => clone_url(
                url.scheme(),
                url.host_str().unwrap_or(DEFAULT_HOST),
                &self.owner,
                &self.repo,
            ),
            _ => clone_url("https", DEFAULT_HOST, &self.owner, &self.repo),
        }
    }

    /// Pure update: a copy of `self` with `patch` applied.
    ///
    /// A resource that has a unit name is always a unit, whatever the patch says.
    pub fn apply(&self, patch: &ResourcePatch) -> Resource {
        let mut next = self.clone();
        if let Some(status) = patch.validation_status {
            next.validation_status = status;
        }
        if let Some(errors) = &patch.validation_errors {
            next.validation_errors = errors.clone();
        }
        if let Some(unit_name) = &patch.unit_name {
            next.unit_name = Some(unit_name.clone());
        }
        if let Some(relative_path) = &patch.relative_path {
            next.relative_path = relative_path.clone();
        }
        if let Some(is_unit) = patch.is_unit {
            next.is_unit = is_unit;
        }
        if let Some(at) = patch.last_synced_at {
            next.last_synced_at = at;
        }
        next.is_unit = next.is_unit || next.unit_name.is_some();
        next
    }

    /// Encode as a flat record with canonical keys.
    pub fn to_record(&self) -> Map<String, Value> {
        let opt = |value: &Option<String>| match value {
            Some(text) => Value::String(text.clone()),
            None => Value::Null,
        };

        let mut record = Map::new();
        record.insert("label".into(), self.label.clone().into());
        record.insert("source_url".into(), self.source_url.clone().into());
        record.insert("owner".into(), self.owner.clone().into());
        record.insert("repo".into(), self.repo.clone().into());
        record.insert("branch".into(), self.branch.clone().into());
        record.insert("resource_type".into(), self.kind.as_str().into());
        record.insert("relative_path".into(), opt(&self.relative_path));
        record.insert("folder_hint".into(), opt(&self.folder_hint));
        record.insert("added_at".into(), format_time(self.added_at).into());
        record.insert(
            "last_synced_at".into(),
            format_time(self.last_synced_at).into(),
        );
        record.insert(
            "validation_status".into(),
            self.validation_status.as_str().into(),
        );
        record.insert(
            "validation_errors".into(),
            Value::Array(
                self.validation_errors
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );
        record.insert("unit_name".into(), opt(&self.unit_name));
        record.insert("is_unit".into(), self.is_unit.into());
        record
    }

    /// Decode a record, applying the defaults for missing fields:
    ///
    /// | field | default |
    /// |---|---|
    /// | `branch` | `"main"` |
    /// | `resource_type` | `repo` |
    /// | `source_url` | `https://github.com/{owner}/{repo}` |
    /// | `added_at` | now |
    /// | `last_synced_at` | `added_at` |
    /// | `validation_status` | `unvalidated` |
    /// | `validation_errors` | empty |
    /// | `is_unit` | `unit_name` is present |
    pub fn from_record(record: &Map<String, Value>) -> Result<Resource> {
        let fields = RecordFields::new(record);

        let label = fields.required_str(&["label"])?;
        let owner = fields.required_str(&["owner"])?;
        let repo = fields.required_str(&["repo", "repo_name", "repository"])?;
        let source_url = fields
            .str(&["source_url", "url", "source"])
            .unwrap_or_else(|| format!("https://{}/{}/{}", DEFAULT_HOST, owner, repo));
        let branch = fields
            .str(&["branch"])
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        let kind = match fields.str(&["resource_type", "type", "kind"]) {
            Some(text) => text
                .parse::<ResourceKind>()
                .map_err(|err| record_error(&label, err))?,
            None => ResourceKind::Repo,
        };
        let validation_status = match fields.str(&["validation_status", "status"]) {
            Some(text) => text
                .parse::<ValidationStatus>()
                .map_err(|err| record_error(&label, err))?,
            None => ValidationStatus::Unvalidated,
        };
        let added_at = match fields.get(&["added_at", "created_at"]) {
            Some(value) => parse_time(value).map_err(|err| record_error(&label, err))?,
            None => now(),
        };
        let last_synced_at = match fields.get(&["last_synced_at", "last_synced", "synced_at"]) {
            Some(value) => parse_time(value).map_err(|err| record_error(&label, err))?,
            None => added_at,
        };
        let validation_errors = match fields.get(&["validation_errors", "errors"]) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(Value::String(text)) => vec![text.clone()],
            _ => Vec::new(),
        };
        let unit_name = fields.str(&["unit_name", "skill_name"]);
        let explicit_unit = match fields.get(&["is_unit", "is_skill"]) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
            _ => false,
        };
        let is_unit = explicit_unit || unit_name.is_some();

        Ok(Resource {
            label,
            source_url,
            owner,
            repo,
            branch,
            kind,
            relative_path: fields.str(&["relative_path", "path"]),
            folder_hint: fields.str(&["folder_hint", "folder"]),
            added_at,
            last_synced_at,
            validation_status,
            validation_errors,
            unit_name,
            is_unit,
        })
    }
}

/// Field-level changes applied by [`Resource::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePatch {
    pub validation_status: Option<ValidationStatus>,
    pub validation_errors: Option<Vec<String>>,
    /// Backfills or renames the unit (implies `is_unit`)
    pub unit_name: Option<String>,
    pub is_unit: Option<bool>,
    /// `Some(None)` clears the path
    pub relative_path: Option<Option<String>>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl ResourcePatch {
    /// Status and errors from a validation pass.
    pub fn from_validation(result: &ValidationResult) -> Self {
        let status = if result.valid {
            ValidationStatus::ValidSkill
        } else {
            ValidationStatus::InvalidSkill
        };
        Self {
            validation_status: Some(status),
            validation_errors: Some(result.errors.clone()),
            ..Self::default()
        }
    }

    pub fn not_a_skill() -> Self {
        Self {
            validation_status: Some(ValidationStatus::NotASkill),
            validation_errors: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn synced_at(at: DateTime<Utc>) -> Self {
        Self {
            last_synced_at: Some(at),
            ..Self::default()
        }
    }

    pub fn with_unit_name(mut self, unit_name: impl Into<String>) -> Self {
        self.unit_name = Some(unit_name.into());
        self.is_unit = Some(true);
        self
    }

    pub fn with_relative_path(mut self, relative_path: Option<String>) -> Self {
        self.relative_path = Some(relative_path);
        self
    }
}

/// Record keys normalized to snake_case with any leading `:` removed.
struct RecordFields<'a> {
    fields: HashMap<String, &'a Value>,
}

impl<'a> RecordFields<'a> {
    fn new(record: &'a Map<String, Value>) -> Self {
        let fields = record
            .iter()
            .map(|(key, value)| (normalize_key(key), value))
            .collect();
        Self { fields }
    }

    /// First non-null value among `keys`.
    fn get(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key).copied())
            .find(|value| !value.is_null())
    }

    /// First non-empty string among `keys`.
    fn str(&self, keys: &[&str]) -> Option<String> {
        match self.get(keys)? {
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    fn required_str(&self, keys: &[&str]) -> Result<String> {
        self.str(keys).ok_or_else(|| {
            VaultError::Manifest(format!("record is missing required field '{}'", keys[0]))
        })
    }
}

/// `:repoName` / `repoName` / `repo_name` -> `repo_name`.
fn normalize_key(key: &str) -> String {
    let key = key.trim_start_matches(':');
    let mut normalized = String::with_capacity(key.len() + 4);
    for (index, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if index > 0 {
                normalized.push('_');
            }
            normalized.push(ch.to_ascii_lowercase());
        } else if ch == '-' {
            normalized.push('_');
        } else {
            normalized.push(ch);
        }
    }
    normalized
}

fn record_error(label: &str, message: String) -> VaultError {
    VaultError::Manifest(format!("record '{}': {}", label, message))
}

fn format_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a timestamp (RFC 3339, `YYYY-MM-DD HH:MM:SS [+zzzz]`, or Unix seconds).
fn parse_time(value: &Value) -> std::result::Result<DateTime<Utc>, String> {
    let parsed = match value {
        Value::Number(number) => number
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(text) => {
            let text = text.trim();
            DateTime::parse_from_rfc3339(text)
                .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S %z"))
                .map(|at| at.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
                        .ok()
                        .map(|naive| naive.and_utc())
                })
        }
        _ => None,
    };
    parsed
        .map(|at| at.trunc_subsecs(0))
        .ok_or_else(|| format!("invalid timestamp: {}", value))
}
