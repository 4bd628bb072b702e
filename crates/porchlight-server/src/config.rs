//! Environment configuration for the sync server binary.
//!
//! All configuration is loaded from environment variables. Defaults bind
//! everywhere on port 3000 with a supply of 100 candies at one per child.

use std::fmt::Display;
use std::str::FromStr;

/// Complete server configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct PorchlightConfig {
    /// Host address to bind (default `0.0.0.0`).
    pub host: String,
    /// TCP port to listen on (default 3000).
    pub port: u16,
    /// Candy supply baseline at startup (default 100).
    pub initial_candy_count: u64,
    /// Candy handed out per visitor (default 1).
    pub candy_per_child: u64,
}

impl PorchlightConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables (all optional):
    /// - `PORCHLIGHT_HOST` -- bind address (default `0.0.0.0`)
    /// - `PORCHLIGHT_PORT` -- TCP port (default `3000`)
    /// - `PORCHLIGHT_INITIAL_CANDY` -- candy supply baseline (default `100`)
    /// - `PORCHLIGHT_CANDY_PER_CHILD` -- candy per visitor (default `1`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: std::env::var("PORCHLIGHT_HOST").unwrap_or_else(|_| String::from("0.0.0.0")),
            port: env_parse("PORCHLIGHT_PORT", 3000)?,
            initial_candy_count: env_parse("PORCHLIGHT_INITIAL_CANDY", 100)?,
            candy_per_child: env_parse("PORCHLIGHT_CANDY_PER_CHILD", 1)?,
        })
    }
}

impl Default for PorchlightConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 3000,
            initial_candy_count: 100,
            candy_per_child: 1,
        }
    }
}

/// Parse an environment variable, falling back to a default when unset.
fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
            name: name.to_owned(),
            reason: format!("{e}"),
        }),
        Err(_) => Ok(default),
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// The variable name.
        name: String,
        /// Why parsing failed.
        reason: String,
    },
}
