// SPDX-License-Identifier: PMPL-1.0-or-later
//! Server configuration.

use std::time::Duration;

use meetup_pages::{FallbackMode, RegenerationConfig};
use meetup_store::PoolConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Store connection string (`memory://` or `redb://<path>`)
    pub connection_url: String,
    /// Upper bound on concurrently checked-out store connections
    pub max_connections: usize,
    /// How long a request waits for a store connection
    pub acquire_timeout_ms: u64,
    /// Listing page freshness window
    pub revalidate_secs: u64,
    /// Policy for detail ids not known at build time
    pub fallback: FallbackMode,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            connection_url: "memory://".to_string(),
            max_connections: 10,
            acquire_timeout_ms: 5000,
            revalidate_secs: 10,
            fallback: FallbackMode::Blocking,
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

impl ApiConfig {
    /// Defaults overridden by `MEETUP_*` and `CONNECTION_URL` environment
    /// variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("MEETUP_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("MEETUP_PORT") {
            config.port = parse("MEETUP_PORT", port)?;
        }
        if let Some(url) = lookup("CONNECTION_URL") {
            config.connection_url = url;
        }
        if let Some(max) = lookup("MEETUP_MAX_CONNECTIONS") {
            config.max_connections = parse("MEETUP_MAX_CONNECTIONS", max)?;
            if config.max_connections == 0 {
                return Err(ConfigError::Invalid {
                    key: "MEETUP_MAX_CONNECTIONS",
                    value: "0".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if let Some(ms) = lookup("MEETUP_ACQUIRE_TIMEOUT_MS") {
            config.acquire_timeout_ms = parse("MEETUP_ACQUIRE_TIMEOUT_MS", ms)?;
        }
        if let Some(secs) = lookup("MEETUP_REVALIDATE_SECS") {
            config.revalidate_secs = parse("MEETUP_REVALIDATE_SECS", secs)?;
        }
        if let Some(fallback) = lookup("MEETUP_FALLBACK") {
            config.fallback = parse("MEETUP_FALLBACK", fallback)?;
        }
        if let Some(format) = lookup("MEETUP_LOG_FORMAT") {
            config.log_format = match format.trim().to_ascii_lowercase().as_str() {
                "pretty" | "text" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "MEETUP_LOG_FORMAT",
                        value: format,
                        reason: "expected 'pretty' or 'json'".to_string(),
                    })
                }
            };
        }

        Ok(config)
    }

    /// Scheme of the connection string, the only part of it safe to log.
    pub fn connection_scheme(&self) -> &str {
        self.connection_url
            .split_once("://")
            .map_or("unknown", |(scheme, _)| scheme)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
        }
    }

    pub fn regeneration_config(&self) -> RegenerationConfig {
        RegenerationConfig::new(Duration::from_secs(self.revalidate_secs), self.fallback)
    }
}
