use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::services::AccountDefaults;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which backend serves reads and whose write failures are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Document,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreKind::Sqlite),
            "document" | "json" => Ok(StoreKind::Document),
            other => Err(format!("unsupported store '{other}', expected sqlite or document")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub document_dir: PathBuf,
    pub primary_store: StoreKind,
    pub mirror_writes: bool,
    pub max_connection_pooling: u32,
    pub port: u16,
    pub log_file: String,
    pub account_defaults: AccountDefaults,
}

impl Config {
    /// Read settings from the environment, honouring a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AccountDefaults::default();
        let account_defaults = AccountDefaults {
            opening_balance: parse_or(&lookup, "DEFAULT_OPENING_BALANCE", defaults.opening_balance)?,
            daily_limit: parse_or(&lookup, "DEFAULT_DAILY_LIMIT", defaults.daily_limit)?,
        };
        if account_defaults.opening_balance < Decimal::ZERO {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_OPENING_BALANCE",
                value: account_defaults.opening_balance.to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        if account_defaults.daily_limit <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_DAILY_LIMIT",
                value: account_defaults.daily_limit.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:ledger.db".to_string()),
            document_dir: lookup("DOCUMENT_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./documents")),
            primary_store: parse_or(&lookup, "PRIMARY_STORE", StoreKind::Sqlite)?,
            mirror_writes: parse_or(&lookup, "MIRROR_WRITES", true)?,
            max_connection_pooling: parse_or(&lookup, "MAX_CONNECTION_POOLING", 5)?,
            port: parse_or(&lookup, "PORT", 3000)?,
            log_file: lookup("LOG_FILE").unwrap_or_else(|| "app.log".to_string()),
            account_defaults,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|err| ConfigError::Invalid {
            key,
            value,
            reason: err.to_string(),
        }),
    }
}
