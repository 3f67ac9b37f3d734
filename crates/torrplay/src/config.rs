//! Runtime configuration read from the environment (and `.env`)

use std::collections::HashMap;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8090;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),
    #[error("{0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

/// Settings for the qBittorrent connection and the file server
#[derive(Debug, Clone)]
pub struct Config {
    /// qBittorrent Web UI address, e.g. http://localhost:8080
    pub qbit_host: String,
    pub qbit_username: String,
    pub qbit_password: String,
    pub host: String,
    pub port: u16,
    /// Basic auth accounts; empty means authorization is disabled
    pub accounts: HashMap<String, String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let port = match lookup("FILE_SERVER_PORT").filter(|v| !v.trim().is_empty()) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("FILE_SERVER_PORT", value))?,
            None => DEFAULT_PORT,
        };

        let accounts = match lookup("FILE_SERVER_ACCOUNTS") {
            Some(value) => parse_accounts(&value)?,
            None => HashMap::new(),
        };

        Ok(Self {
            qbit_host: required("QBIT_HOST")?,
            qbit_username: required("QBIT_USERNAME")?,
            qbit_password: required("QBIT_PASSWORD")?,
            host: lookup("FILE_SERVER_HOST")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            accounts,
        })
    }
}

/// Parse `user:password,user:password`
fn parse_accounts(value: &str) -> Result<HashMap<String, String>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((user, password)) if !user.is_empty() => {
                Ok((user.to_string(), password.to_string()))
            }
            _ => Err(ConfigError::Invalid("FILE_SERVER_ACCOUNTS", entry.to_string())),
        })
        .collect()
}
