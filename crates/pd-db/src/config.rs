//! Database connection settings read from the environment.
//!
//! | variable                    | default     |
//! |-----------------------------|-------------|
//! | `PERSONAL_DATA_DB_USERNAME` | `root`      |
//! | `PERSONAL_DATA_DB_PASSWORD` | empty       |
//! | `PERSONAL_DATA_DB_HOST`     | `localhost` |
//! | `PERSONAL_DATA_DB_PORT`     | `3306`      |
//! | `PERSONAL_DATA_DB_NAME`     | none        |
//!
//! Variables that are set but empty count as unset, except the password where
//! an empty value is a valid (empty) password.

use std::env::VarError;
use std::fmt;

use pd_core::security::input::{self, ValidationError};
use sqlx::mysql::MySqlConnectOptions;
use thiserror::Error;

pub const ENV_USERNAME: &str = "PERSONAL_DATA_DB_USERNAME";
pub const ENV_PASSWORD: &str = "PERSONAL_DATA_DB_PASSWORD";
pub const ENV_HOST: &str = "PERSONAL_DATA_DB_HOST";
pub const ENV_PORT: &str = "PERSONAL_DATA_DB_PORT";
pub const ENV_NAME: &str = "PERSONAL_DATA_DB_NAME";

pub const DEFAULT_USERNAME: &str = "root";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {source}")]
    Invalid {
        var: &'static str,
        source: ValidationError,
    },
    #[error("Invalid port in {var}: {value:?}")]
    InvalidPort { var: &'static str, value: String },
    #[error("{var} is not valid unicode")]
    NotUnicode { var: &'static str },
}

const ENV_VARS: [&str; 5] = [ENV_USERNAME, ENV_PASSWORD, ENV_HOST, ENV_PORT, ENV_NAME];

/// Connection settings for the personal data database.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
}

impl DbConfig {
    /// Read the settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_var_fn(|key| std::env::var(key))
    }

    /// Like [`DbConfig::from_lookup`], but over a `std::env::var`-shaped
    /// function. A variable that is set but not valid unicode is an error
    /// rather than unset.
    pub fn from_var_fn<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        for key in ENV_VARS {
            if let Err(VarError::NotUnicode(_)) = var(key) {
                return Err(ConfigError::NotUnicode { var: key });
            }
        }
        Self::from_lookup(|key| var(key).ok())
    }

    /// Read the settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let host = non_empty(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        input::validate_hostname(&host).map_err(|source| ConfigError::Invalid {
            var: ENV_HOST,
            source,
        })?;

        let username = non_empty(ENV_USERNAME).unwrap_or_else(|| DEFAULT_USERNAME.to_string());
        input::validate_username(&username).map_err(|source| ConfigError::Invalid {
            var: ENV_USERNAME,
            source,
        })?;

        let port = match non_empty(ENV_PORT) {
            Some(value) => value
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or(ConfigError::InvalidPort {
                    var: ENV_PORT,
                    value,
                })?,
            None => DEFAULT_PORT,
        };

        let database = non_empty(ENV_NAME);
        if let Some(ref name) = database {
            input::validate_database_name(name).map_err(|source| ConfigError::Invalid {
                var: ENV_NAME,
                source,
            })?;
        }

        Ok(Self {
            host,
            port,
            username,
            password: lookup(ENV_PASSWORD).unwrap_or_default(),
            database,
        })
    }

    /// sqlx connection options for these settings.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password);

        match self.database {
            Some(ref database) => options.database(database),
            None => options,
        }
    }
}

// Never print the password.
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "***" };
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &password)
            .field("database", &self.database)
            .finish()
    }
}
