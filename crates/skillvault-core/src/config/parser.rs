//! TOML parser with helpful error messages

use super::schema::VaultConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse config.toml with detailed error messages
pub fn parse_vault_toml(path: &Path) -> Result<VaultConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_vault_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse config.toml content from string
pub fn parse_vault_toml_str(content: &str) -> Result<VaultConfig> {
    let config: VaultConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;
    config.validate()?;
    Ok(config)
}

/// Point at the offending line when toml reports one
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();
    match error.span() {
        Some(span) => {
            let line_num = content[..span.start.min(content.len())]
                .matches('\n')
                .count()
                + 1;
            anyhow::anyhow!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                line_context(content, line_num),
                message
            )
        }
        None => anyhow::anyhow!("TOML parsing error: {}", message),
    }
}

fn line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize a configuration to TOML string
pub fn to_toml(config: &VaultConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration to TOML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
storage_root = "/srv/vault"
host = "git.example.com"
"#;

        let config = parse_vault_toml_str(toml).unwrap();
        assert_eq!(config.storage_root, Some(PathBuf::from("/srv/vault")));
        assert_eq!(config.manifest_path, None);
        assert_eq!(config.host(), "git.example.com");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_vault_toml_str("").unwrap();
        assert_eq!(config, VaultConfig::default());
    }

    #[test]
    fn test_parse_invalid_toml_reports_line() {
        let toml = "host = \"github.com\"\nstorage_root = [unclosed\n";

        let err = parse_vault_toml_str(toml).unwrap_err().to_string();
        assert!(err.contains("TOML parsing error"));
        assert!(err.contains("line "));
    }

    #[test]
    fn test_parse_rejects_invalid_host() {
        let err = parse_vault_toml_str("host = \"https://github.com\"")
            .unwrap_err()
            .to_string();
        assert!(err.contains("bare host name"));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let original = VaultConfig {
            storage_root: Some(PathBuf::from("/srv/vault")),
            manifest_path: Some(PathBuf::from("/srv/manifest.json")),
            host: None,
        };

        let toml_str = to_toml(&original).unwrap();
        assert!(!toml_str.contains("host"));
        assert_eq!(parse_vault_toml_str(&toml_str).unwrap(), original);
    }

    #[test]
    fn test_parse_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "manifest_path = \"/tmp/vault.json\"").unwrap();

        let config = parse_vault_toml(temp_file.path()).unwrap();
        assert_eq!(config.manifest_path, Some(PathBuf::from("/tmp/vault.json")));
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let result = parse_vault_toml(Path::new("/nonexistent/path/config.toml"));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
