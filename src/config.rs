//! # Application configuration
//!
//! Read from the process environment at startup. The two key paths are
//! required; the process refuses to start without them since every protected
//! request depends on the key material they point to.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while reading the configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the PEM-encoded RSA private signing key.
    pub private_key_path: PathBuf,
    /// Path to the PEM-encoded RSA public verification key.
    pub public_key_path: PathBuf,
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    ///
    /// Required: `JWT_PRIVATE`, `JWT_PUBLIC` (key file paths).
    /// Optional: `HOST` (default `0.0.0.0`), `PORT` (default `8080`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Split out of [`Self::from_env`] so tests can supply variables without
    /// mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let private_key_path = require(&lookup, "JWT_PRIVATE")?.into();
        let public_key_path = require(&lookup, "JWT_PUBLIC")?.into();

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(value) => value.parse().map_err(|e| ConfigError::InvalidVar {
                var: "PORT",
                value,
                reason: format!("{e}"),
            })?,
            None => 8080,
        };

        Ok(Self {
            private_key_path,
            public_key_path,
            host,
            port,
        })
    }

    /// Address the HTTP listener binds to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn require(
    lookup: impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<String, ConfigError> {
    lookup(var).ok_or(ConfigError::MissingVar(var))
}
