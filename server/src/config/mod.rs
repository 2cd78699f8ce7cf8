use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::services::event_service::DEFAULT_WRITE_ATTEMPTS;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEV_JWT_SECRET: &str = "development-only-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Without a database URL the server keeps events in memory.
    pub database_url: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
    pub cors_allowed_origins: Vec<String>,
    pub production: bool,
    pub db_max_connections: u32,
    pub write_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            cors_allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            production: false,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            write_attempts: DEFAULT_WRITE_ATTEMPTS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let production = env::var("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        let jwt_secret = match non_empty("JWT_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::Missing("JWT_SECRET")),
            None => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                defaults.jwt_secret
            }
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            host: parsed("HOST")?.unwrap_or(defaults.host),
            port: parsed("PORT")?.unwrap_or(defaults.port),
            jwt_secret,
            cors_allowed_origins: non_empty("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .transpose()?
                .unwrap_or(defaults.cors_allowed_origins),
            production,
            db_max_connections: parsed("DB_MAX_CONNECTIONS")?
                .unwrap_or(defaults.db_max_connections),
            write_attempts: parsed("WRITE_RETRY_LIMIT")?.unwrap_or(defaults.write_attempts),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    non_empty(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value })
        })
        .transpose()
}

/// Origins are sent back with credentials allowed, so every entry must be
/// a concrete `http(s)://` origin.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let invalid = |value: &str| ConfigError::Invalid {
        key: "CORS_ALLOWED_ORIGINS",
        value: value.to_string(),
    };

    let origins = split_origins(raw);
    if origins.is_empty() {
        return Err(invalid(raw));
    }
    for origin in &origins {
        let has_scheme = origin.starts_with("http://") || origin.starts_with("https://");
        if !has_scheme || origin.parse::<HeaderValue>().is_err() {
            return Err(invalid(origin));
        }
    }
    Ok(origins)
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}
