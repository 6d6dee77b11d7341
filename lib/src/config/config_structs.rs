// lib/src/config/config_structs.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::error;
use models::errors::CareError;
use serde::{Deserialize, Serialize};

use crate::config::config_defaults::*;

/// Storage engine types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageEngineType {
    InMemory,
    Sled,
}

impl FromStr for StorageEngineType {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inmemory" | "in_memory" | "memory" => Ok(StorageEngineType::InMemory),
            "sled" => Ok(StorageEngineType::Sled),
            _ => {
                error!("Unknown storage engine type: {}", s);
                Err(CareError::Configuration(format!("Unknown storage engine type: {}", s)))
            }
        }
    }
}

impl fmt::Display for StorageEngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageEngineType::InMemory => write!(f, "inmemory"),
            StorageEngineType::Sled => write!(f, "sled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_storage_engine_type")]
    pub storage_engine_type: StorageEngineType,
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    /// Snapshots buffered per live query before the producer waits.
    #[serde(default = "default_subscription_buffer")]
    pub subscription_buffer: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            storage_engine_type: default_storage_engine_type(),
            data_directory: default_data_directory(),
            subscription_buffer: default_subscription_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestConfig {
    #[serde(default = "default_rest_host")]
    pub host: String,
    #[serde(default = "default_rest_port")]
    pub port: u16,
}

impl Default for RestConfig {
    fn default() -> Self {
        RestConfig { host: default_rest_host(), port: default_rest_port() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            min_password_length: default_min_password_length(),
        }
    }
}

/// Top-level application configuration, one section per concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}
