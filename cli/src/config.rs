//! Configuration for the command-line front end.

use casebook_engine::ActorContext;
use std::env;

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Name attributed to history entries and new records
    pub user_name: String,
    /// Organisation attributed to history entries and new records
    pub user_org: String,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let user_name = lookup("USER_NAME").unwrap_or_default();
        let user_org = lookup("USER_ORG").unwrap_or_default();

        let pretty = match lookup("CASEBOOK_PRETTY") {
            None => false,
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidPretty(raw))?,
        };

        Ok(Self {
            user_name,
            user_org,
            pretty,
        })
    }

    /// The session the engine attributes changes to.
    pub fn actor(&self) -> ActorContext {
        ActorContext::new(self.user_name.clone(), self.user_org.clone())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Some(false),
        "1" | "true" | "yes" | "on" => Some(true),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid CASEBOOK_PRETTY value: {0}")]
    InvalidPretty(String),
}
