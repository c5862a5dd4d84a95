//! Process configuration.
//!
//! One explicit struct built from the environment at startup and passed by
//! reference into constructors. There is no ambient global state; a component
//! that needs a setting receives it.

use std::time::Duration;

use thiserror::Error;

use crate::store::WritePolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Everything the process needs, resolved once.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string (`DATABASE_URL`).
    pub database_url: String,
    /// Redis connection string (`REDIS_URL`), shared by cache and pub/sub.
    pub redis_url: String,
    /// HTTP listen port (`PORT`, default 8080).
    pub port: u16,
    /// Name of the shared-secret auth header (`AUTH_HEADER`); unset disables
    /// the check.
    pub auth_header: Option<String>,
    /// Event topic (`TOPIC_NAME`); empty disables event emission globally.
    pub topic: String,
    /// Deployment revision stamped into events (`SERVICE_REVISION`).
    pub revision: String,
    /// Item-list cache TTL (`CACHE_TTL_SECS`, default 10).
    pub cache_ttl: Duration,
    /// Publisher worker-pool size (`PUBLISHER_WORKERS`, default 2).
    pub publisher_workers: usize,
    /// Publisher queue capacity (`PUBLISHER_QUEUE_CAPACITY`, default 256).
    pub publisher_queue_capacity: usize,
    /// Association-write strictness (`ALLOW_DUPLICATE_ITEMS`,
    /// `CHECK_REFERENCES`; defaults preserve the permissive historical
    /// behavior).
    pub write_policy: WritePolicy,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: require("DATABASE_URL")?,
            redis_url: require("REDIS_URL")?,
            port: parse_or("PORT", 8080)?,
            auth_header: optional("AUTH_HEADER"),
            topic: optional("TOPIC_NAME").unwrap_or_default(),
            revision: optional("SERVICE_REVISION").unwrap_or_default(),
            cache_ttl: Duration::from_secs(parse_or("CACHE_TTL_SECS", 10)?),
            publisher_workers: parse_or("PUBLISHER_WORKERS", 2)?,
            publisher_queue_capacity: parse_or("PUBLISHER_QUEUE_CAPACITY", 256)?,
            write_policy: WritePolicy {
                allow_duplicates: parse_or("ALLOW_DUPLICATE_ITEMS", true)?,
                check_references: parse_or("CHECK_REFERENCES", false)?,
            },
        })
    }
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var manipulation is process-global, so everything lives in one test.
    #[test]
    fn from_env_defaults_and_overrides() {
        unsafe {
            std::env::set_var("DATABASE_URL", "postgres://localhost/packrat");
            std::env::set_var("REDIS_URL", "redis://localhost");
            std::env::set_var("CACHE_TTL_SECS", "30");
            std::env::remove_var("PORT");
            std::env::remove_var("TOPIC_NAME");
            std::env::remove_var("AUTH_HEADER");
        }

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.topic, "");
        assert!(config.auth_header.is_none());
        assert!(config.write_policy.allow_duplicates);
        assert!(!config.write_policy.check_references);

        unsafe {
            std::env::remove_var("DATABASE_URL");
        }
        let err = AppConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));

        unsafe {
            std::env::set_var("DATABASE_URL", "postgres://localhost/packrat");
            std::env::set_var("PORT", "not-a-port");
        }
        let err = AppConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        unsafe {
            std::env::remove_var("PORT");
            std::env::remove_var("CACHE_TTL_SECS");
            std::env::remove_var("REDIS_URL");
        }
    }
}
