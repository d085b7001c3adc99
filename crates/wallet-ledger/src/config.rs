//! # Ledger Configuration
//!
//! Administrator identities and ledger behavior switches.
//!
//! ## Config File Format
//!
//! ```toml
//! [access]
//! admins = ["admin-pubkey-1", "admin-pubkey-2"]
//!
//! [ledger]
//! query_payload = "raw"          # or "normalized"
//! invocation_timeout_ms = 5000
//! ```
//!
//! ## Environment Variables
//!
//! - `WALLET_CONFIG`: path to a TOML file (optional)
//! - `WALLET_ADMINS`: comma separated identities, replaces the file's list
//! - `WALLET_QUERY_PAYLOAD`: `raw` or `normalized`

use crate::domain::entities::{AdminSet, QueryPayloadMode};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Default hard timeout for one invocation.
pub const DEFAULT_INVOCATION_TIMEOUT_MS: u64 = 5_000;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },

    /// TOML parse error.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Semantically invalid configuration.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration file structure.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    access: AccessSection,
    #[serde(default)]
    ledger: LedgerSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AccessSection {
    #[serde(default)]
    admins: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LedgerSection {
    query_payload: Option<QueryPayloadMode>,
    invocation_timeout_ms: Option<u64>,
}

/// Complete ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Identities allowed to invoke mutating operations.
    pub admins: Vec<String>,
    /// How `queryBalance` reports absent accounts.
    pub query_payload: QueryPayloadMode,
    /// Hard timeout applied by the runtime adapter.
    pub invocation_timeout_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            query_payload: QueryPayloadMode::Raw,
            invocation_timeout_ms: DEFAULT_INVOCATION_TIMEOUT_MS,
        }
    }
}

impl LedgerConfig {
    /// Configuration with the given administrators and default settings.
    #[must_use]
    pub fn with_admins<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let config = Self {
            admins: file.access.admins,
            query_payload: file.ledger.query_payload.unwrap_or_default(),
            invocation_timeout_ms: file
                .ledger
                .invocation_timeout_ms
                .unwrap_or(DEFAULT_INVOCATION_TIMEOUT_MS),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("WALLET_CONFIG") {
            Some(path) => {
                info!(path = %path, "Loading ledger config file");
                Self::load(path)?
            }
            None => Self::default(),
        };

        if let Some(admins) = lookup("WALLET_ADMINS") {
            config.admins = admins
                .split(',')
                .map(str::trim)
                .filter(|admin| !admin.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(mode) = lookup("WALLET_QUERY_PAYLOAD") {
            config.query_payload = mode.parse().map_err(ConfigError::Invalid)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the ledger cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admins.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one administrator identity is required".to_string(),
            ));
        }
        if self.admins.iter().any(String::is_empty) {
            return Err(ConfigError::Invalid(
                "administrator identities must not be empty".to_string(),
            ));
        }
        if self.invocation_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "invocation_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured administrators as a lookup set.
    #[must_use]
    pub fn admin_set(&self) -> AdminSet {
        self.admins.iter().map(String::as_str).collect()
    }
}
