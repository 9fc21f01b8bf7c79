//! Configuration management
//!
//! YAML configuration file with environment-variable override for the
//! credential. Missing file falls back to defaults; a malformed file is an
//! error rather than a silent reset.

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "gemchat.yaml";

/// Default config directory name
const CONFIG_DIR_NAME: &str = "gemchat";

/// Environment variable consulted for the API key, taking precedence over
/// the config file
pub const API_KEY_ENV_VAR: &str = "GOOGLE_API_KEY";

/// When the conversation handle is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenPolicy {
    /// Open as soon as a credential is available, at session start
    #[default]
    Eager,
    /// Open on the first send attempt
    Lazy,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// API endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key; the `GOOGLE_API_KEY` environment variable takes precedence
    #[serde(default)]
    pub api_key: Option<String>,

    /// When to open the conversation handle
    #[serde(default)]
    pub open_policy: OpenPolicy,

    /// Upper bound on a single model request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: default_model(),
            base_url: default_base_url(),
            api_key: None,
            open_policy: OpenPolicy::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Default config file location (`<config_dir>/gemchat/gemchat.yaml`)
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Config::default()),
            },
        };

        if !path.exists() {
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the API key: environment variable first, then config file.
    /// Blank values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                self.api_key
                    .clone()
                    .filter(|key| !key.trim().is_empty())
            })
    }

    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.open_policy, OpenPolicy::Eager);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.yaml");
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "model: gemini-1.5-pro").unwrap();
        writeln!(file, "open_policy: lazy").unwrap();
        writeln!(file, "request_timeout_secs: 30").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.open_policy, OpenPolicy::Lazy);
        assert_eq!(config.request_timeout_secs, 30);
        // Unset fields keep their defaults
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
    }

    #[test]
    fn test_load_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "model: [unclosed").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_blank_configured_key_counts_as_absent() {
        let config = Config {
            api_key: Some("   ".to_string()),
            ..Config::default()
        };
        // Only meaningful when the env var is not set in the test
        // environment; the configured blank key must never win.
        if std::env::var(API_KEY_ENV_VAR).is_err() {
            assert!(config.resolve_api_key().is_none());
        }
    }

    #[test]
    fn test_open_policy_serde() {
        assert_eq!(
            serde_yml::from_str::<OpenPolicy>("eager").unwrap(),
            OpenPolicy::Eager
        );
        assert_eq!(
            serde_yml::from_str::<OpenPolicy>("lazy").unwrap(),
            OpenPolicy::Lazy
        );
    }
}
