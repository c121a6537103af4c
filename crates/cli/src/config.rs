//! CLI configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! config file, then `NEERORBIT_*` environment variables
//! (`NEERORBIT_API__BASE_URL`, `NEERORBIT_STORAGE__TOKEN_FILE`, ...).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Local session storage
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend, without the `/api` suffix
    pub base_url: String,

    /// Request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,

    /// User agent override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Token storage configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Token file; defaults to `tokens.json` in the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl CliConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist; the `default_path` is used only if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or a value cannot be parsed
    pub fn load(path: Option<&Path>, default_path: &Path) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?;

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::from(default_path).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix("NEERORBIT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to load configuration")?;

        Ok(settings.try_deserialize()?)
    }

    /// Write this configuration as TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = CliConfig::load(None, &temp_dir.path().join("missing.toml")).unwrap();

        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.storage.token_file, None);
        assert_eq!(config.api.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"https://flood.example.org\"\ntimeout_secs = 0\n\n[storage]\ntoken_file = \"/tmp/t.json\"\n",
        )
        .unwrap();

        let config = CliConfig::load(Some(&path), &temp_dir.path().join("other.toml")).unwrap();
        assert_eq!(config.api.base_url, "https://flood.example.org");
        assert_eq!(config.api.timeout(), None);
        assert_eq!(config.storage.token_file, Some(PathBuf::from("/tmp/t.json")));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(CliConfig::load(Some(&missing), &missing).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = CliConfig::default();
        config.api.base_url = "https://api.example.org".into();
        config.save(&path).unwrap();

        let loaded = CliConfig::load(Some(&path), &path).unwrap();
        assert_eq!(loaded.api.base_url, "https://api.example.org");
        assert_eq!(loaded.api.timeout_secs, 30);
    }
}
