use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::auth::DEFAULT_TOKEN_ENV;

/// File looked up in the current directory.
pub const CONFIG_FILE: &str = ".pr2pdf.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr2pdf.toml.
/// All fields are optional — the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub pdf: PdfConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API root; override for GitHub Enterprise
    pub api_url: String,
    /// Environment variable holding the token
    pub token_env: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// HTML-to-PDF binary, resolved through PATH
    pub renderer: String,
    /// Extra arguments passed before the input/output operands
    pub args: Vec<String>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            renderer: "wkhtmltopdf".to_string(),
            args: vec!["--encoding".to_string(), "utf-8".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from .pr2pdf.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.token_env, "GHP_TOKEN");
        assert_eq!(config.pdf.renderer, "wkhtmltopdf");
    }

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let toml_str = r#"
[github]
api_url = "https://ghe.example.com/api/v3"

[pdf]
args = []
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.github.token_env, "GHP_TOKEN");
        assert_eq!(config.pdf.renderer, "wkhtmltopdf");
        assert!(config.pdf.args.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[pdf]\nrenderer = \"/opt/bin/wkhtmltopdf\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.pdf.renderer, "/opt/bin/wkhtmltopdf");
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[pdf\nrenderer = 1").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
