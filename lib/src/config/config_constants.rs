// lib/src/config/config_constants.rs

pub const DEFAULT_CONFIG_PATH: &str = "carebridge_config.yaml";
pub const DEFAULT_DATA_DIRECTORY: &str = "./data/carebridge";
pub const DEFAULT_REST_HOST: &str = "127.0.0.1";
pub const DEFAULT_REST_PORT: u16 = 8082;
pub const DEFAULT_SUBSCRIPTION_BUFFER: usize = 16;
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 8;
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;
/// Only suitable for local development; `load` warns when it is still in use.
pub const DEFAULT_JWT_SECRET: &str = "carebridge-development-secret";

pub const ENV_JWT_SECRET: &str = "CAREBRIDGE_JWT_SECRET";
pub const ENV_PORT: &str = "CAREBRIDGE_PORT";
pub const ENV_DATA_DIR: &str = "CAREBRIDGE_DATA_DIR";
