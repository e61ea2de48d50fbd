//! Runtime configuration loaded from the process environment.
//!
//! `main` calls `dotenvy::dotenv()` first, so a local `.env` file can supply
//! any of these variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BITCOIN_DE_API_URL: &str = "https://api.bitcoin.de/v2";
pub const DEFAULT_TRADING_PAIR: &str = "btceur";
pub const DEFAULT_API_CREDITS: i64 = 20;
pub const DEFAULT_THROTTLE_MIN_CREDITS: i64 = 3;
pub const DEFAULT_THROTTLE_COOLDOWN_SECS: u64 = 3;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "Invalid value for {}: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub bitcoin_de_api_url: String,
    pub trading_pair: String,
    /// Credits assumed before the first response reports the real value
    pub initial_credits: i64,
    pub throttle_min_credits: i64,
    pub throttle_cooldown: Duration,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            bitcoin_de_api_url: lookup("BITCOIN_DE_API_URL")
                .unwrap_or_else(|| DEFAULT_BITCOIN_DE_API_URL.to_string()),
            trading_pair: lookup("TRADING_PAIR")
                .unwrap_or_else(|| DEFAULT_TRADING_PAIR.to_string()),
            initial_credits: parse_or(&lookup, "API_CREDITS", DEFAULT_API_CREDITS)?,
            throttle_min_credits: parse_or(
                &lookup,
                "THROTTLE_MIN_CREDITS",
                DEFAULT_THROTTLE_MIN_CREDITS,
            )?,
            throttle_cooldown: Duration::from_secs(parse_or(
                &lookup,
                "THROTTLE_COOLDOWN_SECS",
                DEFAULT_THROTTLE_COOLDOWN_SECS,
            )?),
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
        })
    }

    /// Defaults for everything except the database URL.
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            bitcoin_de_api_url: DEFAULT_BITCOIN_DE_API_URL.to_string(),
            trading_pair: DEFAULT_TRADING_PAIR.to_string(),
            initial_credits: DEFAULT_API_CREDITS,
            throttle_min_credits: DEFAULT_THROTTLE_MIN_CREDITS,
            throttle_cooldown: Duration::from_secs(DEFAULT_THROTTLE_COOLDOWN_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
