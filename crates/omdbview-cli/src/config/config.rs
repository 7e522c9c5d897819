//! `AppConfig` struct and TOML read/write.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use omdbview_api::omdb::MediaType;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `omdb.api_key`.
pub const API_KEY_ENV: &str = "OMDB_API_KEY";

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// OMDB connection settings.
    #[serde(default)]
    pub omdb: OmdbConfig,
    /// Default listing settings.
    #[serde(default)]
    pub browse: BrowseConfig,
}

/// OMDB connection configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OmdbConfig {
    /// API key (overridden by `OMDB_API_KEY`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Minimum interval between requests in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_interval_ms: Option<u64>,
    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Default listing configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BrowseConfig {
    /// Query used for the initial listing.
    pub query: String,
    /// Media type filter for the initial listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    /// Media type filter for free-text searches (none: all types).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_media_type: Option<MediaType>,
    /// Number of items the listing tries to fill.
    pub target_count: usize,
    /// Maximum number of search pages per listing.
    pub max_pages: u32,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            query: String::from("series"),
            media_type: Some(MediaType::Series),
            search_media_type: None,
            target_count: 120,
            max_pages: 20,
        }
    }
}

impl OmdbConfig {
    /// Resolves the API key, preferring the environment value.
    ///
    /// # Errors
    ///
    /// Returns an error if neither source provides a non-blank key.
    pub fn resolve_api_key(&self, env_value: Option<String>) -> Result<String> {
        let key = env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|v| !v.trim().is_empty()));
        match key {
            Some(k) => Ok(k),
            None => bail!("OMDB API key is not configured (set {API_KEY_ENV} or omdb.api_key)"),
        }
    }

    /// Returns the configured request interval, if any.
    #[must_use]
    pub fn min_interval(&self) -> Option<Duration> {
        self.min_interval_ms.map(Duration::from_millis)
    }

    /// Returns the configured request timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_config() {
        // Arrange & Act
        let config = AppConfig::default();

        // Assert
        assert!(config.omdb.api_key.is_none());
        assert_eq!(config.browse.query, "series");
        assert_eq!(config.browse.media_type, Some(MediaType::Series));
        assert_eq!(config.browse.target_count, 120);
        assert_eq!(config.browse.max_pages, 20);
    }

    #[test]
    fn test_parse_full_config() {
        // Arrange
        let toml_str = r#"
[omdb]
api_key = "abc123"
base_url = "http://localhost:8080/"
min_interval_ms = 0
timeout_secs = 5

[browse]
query = "star"
media_type = "movie"
search_media_type = "series"
target_count = 30
max_pages = 4
"#;

        // Act
        let config: AppConfig = toml::from_str(toml_str).unwrap();

        // Assert
        assert_eq!(config.omdb.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.omdb.min_interval(), Some(Duration::ZERO));
        assert_eq!(config.omdb.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.browse.query, "star");
        assert_eq!(config.browse.media_type, Some(MediaType::Movie));
        assert_eq!(config.browse.search_media_type, Some(MediaType::Series));
        assert_eq!(config.browse.target_count, 30);
        assert_eq!(config.browse.max_pages, 4);
    }

    #[test]
    fn test_partial_browse_section_keeps_defaults() {
        // Arrange
        let toml_str = "[browse]\ntarget_count = 50\n";

        // Act
        let config: AppConfig = toml::from_str(toml_str).unwrap();

        // Assert
        assert_eq!(config.browse.target_count, 50);
        assert_eq!(config.browse.query, "series");
        assert_eq!(config.browse.max_pages, 20);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = AppConfig {
            omdb: OmdbConfig {
                api_key: Some(String::from("k")),
                ..OmdbConfig::default()
            },
            browse: BrowseConfig {
                query: String::from("batman"),
                media_type: Some(MediaType::Movie),
                ..BrowseConfig::default()
            },
        };

        // Act
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_empty_file() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[browse\n").unwrap();

        // Act
        let result = AppConfig::load(&path);

        // Assert
        assert!(result.unwrap_err().to_string().contains("failed to parse"));
    }

    #[test]
    fn test_api_key_env_overrides_config() {
        // Arrange
        let omdb = OmdbConfig {
            api_key: Some(String::from("from-config")),
            ..OmdbConfig::default()
        };

        // Act
        let key = omdb
            .resolve_api_key(Some(String::from("from-env")))
            .unwrap();

        // Assert
        assert_eq!(key, "from-env");
    }

    #[test]
    fn test_api_key_falls_back_to_config() {
        // Arrange
        let omdb = OmdbConfig {
            api_key: Some(String::from("from-config")),
            ..OmdbConfig::default()
        };

        // Act
        let key = omdb.resolve_api_key(Some(String::from("  "))).unwrap();

        // Assert
        assert_eq!(key, "from-config");
    }

    #[test]
    fn test_api_key_missing_fails() {
        // Arrange
        let omdb = OmdbConfig::default();

        // Act
        let result = omdb.resolve_api_key(None);

        // Assert
        assert!(result.unwrap_err().to_string().contains(API_KEY_ENV));
    }
}
