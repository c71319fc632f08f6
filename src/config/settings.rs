//! Ledger settings loading from ledger.toml
//!
//! The file is optional. Anything it leaves out falls back to the defaults
//! below, so a bare checkout runs against a local `SQLite` file and logs mail
//! instead of sending it.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire ledger.toml file
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LedgerConfig {
    /// Database settings
    #[serde(default)]
    pub database: DatabaseSettings,
    /// Outbound mail settings
    #[serde(default)]
    pub mail: MailSettings,
}

/// Database settings
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseSettings {
    /// Connection URL; `DATABASE_URL` in the environment overrides it
    pub url: Option<String>,
}

/// Settings used when composing notification mail
#[derive(Debug, Deserialize, Clone)]
pub struct MailSettings {
    /// Sender address on every outbound message
    #[serde(default = "default_from")]
    pub from: String,
    /// Base URL of the API, used to build activation links
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_from() -> String {
    "support@investment-ledger.local".to_string()
}

fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from: default_from(),
            api_url: default_api_url(),
        }
    }
}

/// Loads ledger configuration from a TOML file
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<LedgerConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses ledger configuration from TOML text
pub fn parse_config(contents: &str) -> Result<LedgerConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse ledger.toml: {e}"),
    })
}

/// Loads ledger configuration from the default location (./ledger.toml),
/// falling back to defaults when the file does not exist.
pub fn load_default_config() -> Result<LedgerConfig> {
    let path = Path::new("ledger.toml");
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!("No ledger.toml found, using default settings");
        Ok(LedgerConfig::default())
    }
}
