//! Frontmatter extraction and decoding for `SKILL.md` files.

use serde_json::{Map, Value};

const DELIMITER: &str = "---";

/// Decodes the text between the frontmatter delimiters into key/value fields.
pub trait FrontmatterDecoder: std::fmt::Debug {
    /// Decode `text` into a mapping, or describe why it is not one.
    fn decode(&self, text: &str) -> Result<Map<String, Value>, String>;
}

/// YAML frontmatter decoder backed by `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDecoder;

impl FrontmatterDecoder for YamlDecoder {
    fn decode(&self, text: &str) -> Result<Map<String, Value>, String> {
        let has_content = text.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        });
        if !has_content {
            return Ok(Map::new());
        }

        let value: Value =
            serde_yaml::from_str(text).map_err(|err| format!("Invalid YAML syntax: {err}"))?;
        match value {
            Value::Null => Ok(Map::new()),
            Value::Object(map) => Ok(map),
            other => Err(format!(
                "Frontmatter must be a YAML mapping, found {}",
                value_kind(&other)
            )),
        }
    }
}

/// Return the raw frontmatter block, or `None` when the delimiters are missing.
///
/// The first line must be exactly `---`; the block ends at the next line that
/// is exactly `---`. Trailing `\r` is ignored so CRLF files work.
pub fn extract_frontmatter(content: &str) -> Option<String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines();

    if lines.next()?.trim_end_matches('\r') != DELIMITER {
        return None;
    }

    let mut block = Vec::new();
    for line in lines {
        let line = line.trim_end_matches('\r');
        if line == DELIMITER {
            return Some(block.join("\n"));
        }
        block.push(line);
    }
    None
}

/// Human-readable name of a JSON value's type.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
