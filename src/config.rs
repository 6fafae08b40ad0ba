use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use thiserror::Error;

use crate::leave::policy::{ApprovalPolicy, PolicyError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value `{value}`")]
    Invalid { key: &'static str, value: String },
    #[error("APPROVAL_PERMISSIONS: {0}")]
    Policy(#[from] PolicyError),
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,

    /// Permission required per approval level
    pub approval_policy: ApprovalPolicy,
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parsed_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    let Ok(value) = env::var(key) else {
        return Ok(default);
    };
    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::Invalid { key, value }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let approval_policy = match env::var("APPROVAL_PERMISSIONS") {
            Ok(value) => ApprovalPolicy::parse(&value)?,
            Err(_) => ApprovalPolicy::default(),
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", 10)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parsed_or("LOG_LEVEL", tracing::Level::DEBUG)?,
            approval_policy,
        })
    }
}
