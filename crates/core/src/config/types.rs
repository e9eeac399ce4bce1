use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::TmdbConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub catalog: TmdbConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Preference storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("reelscout.db")
}

/// Sanitized config for logging (API key redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub catalog: SanitizedCatalogConfig,
    pub storage: StorageConfig,
}

/// Sanitized catalog config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub api_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub image_base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            catalog: SanitizedCatalogConfig {
                api_key_configured: !config.catalog.api_key.is_empty(),
                base_url: config.catalog.base_url.clone(),
                image_base_url: config.catalog.image_base_url().to_string(),
                language: config.catalog.language.clone(),
                timeout_secs: config.catalog.timeout_secs,
            },
            storage: config.storage.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[catalog]
api_key = "secret"
base_url = "http://localhost:9999/3"
language = "it-IT"
timeout_secs = 5

[storage]
path = "/tmp/prefs.db"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.catalog.api_key, "secret");
        assert_eq!(config.catalog.language.as_deref(), Some("it-IT"));
        assert_eq!(config.catalog.timeout_secs, 5);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/prefs.db"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let toml = r#"
[catalog]
api_key = "secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.catalog.timeout_secs, 30);
        assert!(config.catalog.base_url.is_none());
        assert_eq!(config.catalog.image_base_url(), "https://image.tmdb.org/t/p");
        assert_eq!(config.storage.path, PathBuf::from("reelscout.db"));
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let toml = r#"
[catalog]
api_key = "super-secret-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.catalog.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret-key"));
        assert!(json.contains("reelscout.db"));
    }
}
