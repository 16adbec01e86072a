use pd_core::security::input::ValidationError;
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, DbConfig};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Duplicate entry: {0}")]
    Duplicate(String),
    #[error("Inserted id {0} does not fit the users.id column")]
    IdOutOfRange(u64),
}

/// Open a single connection described by `config`.
///
/// The caller owns the connection and should `close()` it when done.
pub async fn connect(config: &DbConfig) -> Result<MySqlConnection, DbError> {
    let conn = MySqlConnection::connect_with(&config.connect_options()).await?;

    info!(
        host = %config.host,
        port = config.port,
        database = config.database.as_deref().unwrap_or("<none>"),
        "Connected to personal data database"
    );
    Ok(conn)
}

/// Open a single connection using `PERSONAL_DATA_DB_*` environment variables.
pub async fn get_db() -> Result<MySqlConnection, DbError> {
    let config = DbConfig::from_env()?;
    connect(&config).await
}

/// Map a failed INSERT to [`DbError::Duplicate`] when MySQL reports an
/// integrity constraint violation (SQLSTATE 23000).
pub(crate) fn map_insert_error(e: sqlx::Error, what: impl FnOnce() -> String) -> DbError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some("23000") {
            return DbError::Duplicate(what());
        }
    }
    DbError::Connection(e)
}
