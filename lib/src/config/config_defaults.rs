// lib/src/config/config_defaults.rs

use std::path::PathBuf;

use crate::config::config_constants::*;
use crate::config::config_structs::StorageEngineType;

pub fn default_storage_engine_type() -> StorageEngineType { StorageEngineType::InMemory }
pub fn default_data_directory() -> PathBuf { PathBuf::from(DEFAULT_DATA_DIRECTORY) }
pub fn default_subscription_buffer() -> usize { DEFAULT_SUBSCRIPTION_BUFFER }
pub fn default_rest_host() -> String { DEFAULT_REST_HOST.to_string() }
pub fn default_rest_port() -> u16 { DEFAULT_REST_PORT }
pub fn default_jwt_secret() -> String { DEFAULT_JWT_SECRET.to_string() }
pub fn default_token_ttl_hours() -> i64 { DEFAULT_TOKEN_TTL_HOURS }
pub fn default_min_password_length() -> usize { DEFAULT_MIN_PASSWORD_LENGTH }
