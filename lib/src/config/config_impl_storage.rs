// lib/src/config/config_impl_storage.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{error, info, warn};
use serde_yaml2 as serde_yaml;

use crate::config::config_constants::*;
use crate::config::config_structs::AppConfig;

impl AppConfig {
    /// Loads the configuration from `path`, falling back to defaults when the
    /// file does not exist, then applies environment overrides.
    pub async fn load(path: &Path) -> Result<AppConfig> {
        let mut config = if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            AppConfig::default()
        } else {
            let content = tokio::fs::read_to_string(path)
                .await
                .context(format!("Failed to read config file: {}", path.display()))?;
            AppConfig::from_yaml(&content)
                .context(format!("Failed to parse YAML config from {}", path.display()))?
        };

        config.apply_env_overrides();
        if config.security.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("Using the built-in development JWT secret; set {} in production", ENV_JWT_SECRET);
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<AppConfig> {
        if content.trim().is_empty() {
            return Ok(AppConfig::default());
        }
        serde_yaml::from_str::<AppConfig>(content).map_err(|e| {
            error!("Deserialization error: {:?}", e);
            anyhow::anyhow!("invalid configuration: {}", e)
        })
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, which maps an environment variable
    /// name to its value. Unparseable values are logged and ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_JWT_SECRET).filter(|s| !s.is_empty()) {
            info!("Using JWT secret from {}", ENV_JWT_SECRET);
            self.security.jwt_secret = secret;
        }
        if let Some(port) = lookup(ENV_PORT) {
            match port.trim().parse::<u16>() {
                Ok(port) => {
                    info!("Overriding REST port with {} from {}", port, ENV_PORT);
                    self.rest.port = port;
                }
                Err(e) => warn!("Ignoring invalid {}={:?}: {}", ENV_PORT, port, e),
            }
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|s| !s.is_empty()) {
            info!("Overriding data directory with {} from {}", dir, ENV_DATA_DIR);
            self.storage.data_directory = PathBuf::from(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageEngineType;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "storage:\n  storage_engine_type: sled\nrest:\n  port: 9090\n";
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.storage.storage_engine_type, StorageEngineType::Sled);
        assert_eq!(config.storage.subscription_buffer, DEFAULT_SUBSCRIPTION_BUFFER);
        assert_eq!(config.rest.port, 9090);
        assert_eq!(config.rest.host, DEFAULT_REST_HOST);
        assert_eq!(config.security.min_password_length, 6);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn env_overrides_apply_and_bad_port_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides_from(|key| match key {
            ENV_JWT_SECRET => Some("s3cret".to_string()),
            ENV_PORT => Some("not-a-port".to_string()),
            ENV_DATA_DIR => Some("/tmp/cb".to_string()),
            _ => None,
        });
        assert_eq!(config.security.jwt_secret, "s3cret");
        assert_eq!(config.rest.port, DEFAULT_REST_PORT);
        assert_eq!(config.storage.data_directory, PathBuf::from("/tmp/cb"));
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.yaml")).await.unwrap();
        assert_eq!(config.storage.storage_engine_type, StorageEngineType::InMemory);
    }

    #[test]
    fn engine_type_parses_aliases() {
        assert_eq!("in_memory".parse::<StorageEngineType>().unwrap(), StorageEngineType::InMemory);
        assert!("rocksdb".parse::<StorageEngineType>().is_err());
    }
}
