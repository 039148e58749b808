//! Environment-driven settings. Read once at startup; a missing MONGODB_URI
//! is fatal before the listener is bound, never a per-request error.

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_DATABASE: &str = "events";
const DEFAULT_COLLECTION: &str = "events";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SELECTION_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongodb_uri: String,
    pub database_name: String,
    pub collection: String,
    pub bind_addr: SocketAddr,
    /// Fail-fast window for server selection and the initial TCP connect.
    pub server_selection_timeout: Duration,
}

impl Settings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary lookup. `from_env` routes through
    /// this so tests can feed a map instead of mutating process env.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mongodb_uri = get("MONGODB_URI")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingUri)?;
        let database_name = get("MONGODB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.into());
        let collection = get("MONGODB_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.into());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr: SocketAddr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let timeout_secs = match get("SERVER_SELECTION_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "SERVER_SELECTION_TIMEOUT_SECS",
                value: raw.clone(),
            })?,
            None => DEFAULT_SELECTION_TIMEOUT_SECS,
        };

        Ok(Settings {
            mongodb_uri,
            database_name,
            collection,
            bind_addr,
            server_selection_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
