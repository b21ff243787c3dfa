//! Space Controller configuration.
//!
//! Configuration is loaded from environment variables with sensible
//! defaults; nothing here is sensitive.

use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default HTTP bind address (API, health, metrics).
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default grace period for in-flight requests on shutdown, in seconds.
pub const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 2;

/// Default session id prefix.
pub const DEFAULT_SESSION_ID_PREFIX: &str = "space";

/// Space Controller configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Unique identifier for this session instance.
    pub session_id: String,

    /// Optional path to a JSON file with zone definitions to preload.
    pub zones_file: Option<String>,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unparseable values.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("SC_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let zones_file = vars.get("SC_ZONES_FILE").cloned();

        let shutdown_grace_seconds = match vars.get("SC_SHUTDOWN_GRACE_SECONDS") {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "SC_SHUTDOWN_GRACE_SECONDS must be an integer, got {raw:?}"
                ))
            })?,
            None => DEFAULT_SHUTDOWN_GRACE_SECONDS,
        };

        // Generate a session instance id unless one is pinned.
        let session_id = vars.get("SC_SESSION_ID").cloned().unwrap_or_else(|| {
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_SESSION_ID_PREFIX}-{short_suffix}")
        });

        Ok(Config {
            bind_address,
            session_id,
            zones_file,
            shutdown_grace_seconds,
        })
    }
}
