//! Configuration Loader
//!
//! Loads and validates configuration from TOML files: the logging level,
//! the roster seed for the in-memory ledger stub, and the currency
//! definitions.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::domain::currency::Currency;

/// Main configuration structure matching coinkeep.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingSection,
    /// Roster seed for the in-memory ledger stub.
    #[serde(default)]
    pub users: Vec<UserSeed>,
    #[serde(default)]
    pub currencies: Vec<Currency>,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// One seeded user: name, online flag, and group memberships.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSeed {
    pub name: String,
    #[serde(default = "default_online")]
    pub online: bool,
    #[serde(default)]
    pub groups: Vec<String>,
}

fn default_online() -> bool {
    true
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut currency_ids = HashSet::new();
        for currency in &self.currencies {
            if currency.id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "currency id must not be empty".to_string(),
                ));
            }
            if !currency_ids.insert(currency.id.clone()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate currency id: {}",
                    currency.id
                )));
            }
            if currency.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "currency {} has an empty name",
                    currency.id
                )));
            }
            if currency.payout < 0 {
                return Err(ConfigError::ValidationError(format!(
                    "currency {} payout must be >= 0, got {}",
                    currency.id, currency.payout
                )));
            }
            for (group, amount) in &currency.bonus {
                if *amount < 0 {
                    return Err(ConfigError::ValidationError(format!(
                        "currency {} bonus for group {} must be >= 0, got {}",
                        currency.id, group, amount
                    )));
                }
            }
        }

        let mut user_names = HashSet::new();
        for user in &self.users {
            if user.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "user name must not be empty".to_string(),
                ));
            }
            if !user_names.insert(user.name.to_lowercase()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate user name: {}",
                    user.name
                )));
            }
        }

        Ok(())
    }

    /// Non-fatal configuration oddities for the binary to log after the
    /// subscriber is up. A non-positive interval is valid to load but
    /// the currency will never be due.
    pub fn warnings(&self) -> Vec<String> {
        self.currencies
            .iter()
            .filter(|c| c.interval <= 0)
            .map(|c| {
                format!(
                    "currency {} has interval {} and will never pay out",
                    c.id, c.interval
                )
            })
            .collect()
    }
}
