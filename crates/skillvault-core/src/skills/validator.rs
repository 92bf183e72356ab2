//! `SKILL.md` schema validation.
//!
//! Validation never fails with an error: every problem is reported as a
//! human-readable message on [`ValidationResult::errors`], and all applicable
//! field checks run even after the first failure.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::frontmatter::{FrontmatterDecoder, YamlDecoder, extract_frontmatter, value_kind};

pub const MAX_NAME_LENGTH: usize = 64;
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;
pub const MAX_COMPATIBILITY_LENGTH: usize = 500;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("name pattern is a valid regex")
});

const ALLOWED_TOOLS_KEYS: [&str; 3] = ["allowed-tools", "allowed_tools", "allowedTools"];

/// Declared fields of a `SKILL.md` frontmatter block.
///
/// Absent fields are `None`; present-but-invalid values are kept as decoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillFields {
    pub name: Option<Value>,
    pub description: Option<Value>,
    pub license: Option<Value>,
    pub compatibility: Option<Value>,
    pub metadata: Option<Value>,
    pub allowed_tools: Option<Value>,
}

impl SkillFields {
    fn from_map(map: &Map<String, Value>) -> Self {
        let field = |key: &str| map.get(key).filter(|value| !value.is_null()).cloned();
        Self {
            name: field("name"),
            description: field("description"),
            license: field("license"),
            compatibility: field("compatibility"),
            metadata: field("metadata"),
            allowed_tools: ALLOWED_TOOLS_KEYS.iter().find_map(|key| field(key)),
        }
    }

    /// Declared name, when it is a string.
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str)
    }

    /// Declared description, when it is a string.
    pub fn description_str(&self) -> Option<&str> {
        self.description.as_ref().and_then(Value::as_str)
    }
}

/// Result of validating a single `SKILL.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Ordered, never deduplicated
    pub errors: Vec<String>,
    /// `None` when the file was unreadable, had no frontmatter, or failed to decode
    pub fields: Option<SkillFields>,
}

impl ValidationResult {
    fn failure(error: String) -> Self {
        Self {
            valid: false,
            errors: vec![error],
            fields: None,
        }
    }
}

/// Validates `SKILL.md` files against the skill schema.
#[derive(Debug)]
pub struct SkillValidator {
    decoder: Box<dyn FrontmatterDecoder + Send + Sync>,
}

impl Default for SkillValidator {
    fn default() -> Self {
        Self::new(Box::new(YamlDecoder))
    }
}

impl SkillValidator {
    pub fn new(decoder: Box<dyn FrontmatterDecoder + Send + Sync>) -> Self {
        Self { decoder }
    }

    /// Validate the `SKILL.md` at `path`.
    pub fn validate(&self, path: &Path) -> ValidationResult {
        if !path.is_file() {
            return ValidationResult::failure(format!("File not found: {}", path.display()));
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                return ValidationResult::failure(format!(
                    "Could not read {}: {}",
                    path.display(),
                    err
                ));
            }
        };
        self.validate_content(&content)
    }

    /// Validate `SKILL.md` content that is already in memory.
    pub fn validate_content(&self, content: &str) -> ValidationResult {
        let Some(block) = extract_frontmatter(content) else {
            return ValidationResult::failure(
                "No YAML frontmatter found (missing delimiters)".to_string(),
            );
        };

        let map = match self.decoder.decode(&block) {
            Ok(map) => map,
            Err(err) => return ValidationResult::failure(err),
        };

        let fields = SkillFields::from_map(&map);
        let mut errors = Vec::new();
        check_name(fields.name.as_ref(), &mut errors);
        check_description(fields.description.as_ref(), &mut errors);
        check_compatibility(fields.compatibility.as_ref(), &mut errors);
        check_metadata(fields.metadata.as_ref(), &mut errors);
        check_allowed_tools(fields.allowed_tools.as_ref(), &mut errors);

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            fields: Some(fields),
        }
    }
}

/// Pull a required string field, recording why it is unusable.
fn required_str<'a>(
    field: &str,
    value: Option<&'a Value>,
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    match value {
        None => {
            errors.push(format!("Missing required field: {field}"));
            None
        }
        Some(Value::String(text)) if text.trim().is_empty() => {
            errors.push(format!("Field '{field}' must not be empty"));
            None
        }
        Some(Value::String(text)) => Some(text),
        Some(other) => {
            errors.push(format!(
                "Field '{field}' must be a string, found {}",
                value_kind(other)
            ));
            None
        }
    }
}

fn check_name(value: Option<&Value>, errors: &mut Vec<String>) {
    let Some(name) = required_str("name", value, errors) else {
        return;
    };
    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        errors.push(format!(
            "Field 'name' is {length} characters long (max {MAX_NAME_LENGTH})"
        ));
    }
    if !NAME_PATTERN.is_match(name) {
        errors.push(format!(
            "Field 'name' must contain only lowercase letters, digits and single hyphens \
             (no leading, trailing or consecutive hyphens): '{name}'"
        ));
    }
}

fn check_description(value: Option<&Value>, errors: &mut Vec<String>) {
    let Some(description) = required_str("description", value, errors) else {
        return;
    };
    let length = description.chars().count();
    if length > MAX_DESCRIPTION_LENGTH {
        errors.push(format!(
            "Field 'description' is {length} characters long (max {MAX_DESCRIPTION_LENGTH})"
        ));
    }
}

fn check_compatibility(value: Option<&Value>, errors: &mut Vec<String>) {
    let Some(value) = value else {
        return;
    };
    let length = match value {
        Value::String(text) => text.chars().count(),
        other => other.to_string().chars().count(),
    };
    if length > MAX_COMPATIBILITY_LENGTH {
        errors.push(format!(
            "Field 'compatibility' is {length} characters long (max {MAX_COMPATIBILITY_LENGTH})"
        ));
    }
}

fn check_metadata(value: Option<&Value>, errors: &mut Vec<String>) {
    match value {
        None | Some(Value::Object(_)) => {}
        Some(other) => errors.push(format!(
            "Field 'metadata' must be a mapping of keys to values, found {}",
            value_kind(other)
        )),
    }
}

fn check_allowed_tools(value: Option<&Value>, errors: &mut Vec<String>) {
    match value {
        None | Some(Value::String(_)) => {}
        Some(other) => errors.push(format!(
            "Field 'allowed-tools' must be a string, found {}",
            value_kind(other)
        )),
    }
}
