//! Process configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use storefront_observability::LogFormat;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid BIND_ADDR '{value}': {reason}")]
    BindAddr { value: String, reason: String },

    #[error("invalid LOG_FORMAT: {0}")]
    LogFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Postgres connection string; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub log_format: LogFormat,
    /// `true` when `JWT_SECRET` was missing and the dev default is in use.
    pub insecure_jwt_secret: bool,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::BindAddr {
                value: raw_addr.clone(),
                reason: e.to_string(),
            })?;

        let log_format = match var("LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(ConfigError::LogFormat)?,
            None => LogFormat::default(),
        };

        let (jwt_secret, insecure_jwt_secret) = match var("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEV_JWT_SECRET.to_string(), true),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            database_url: var("DATABASE_URL"),
            log_format,
            insecure_jwt_secret,
        })
    }
}
