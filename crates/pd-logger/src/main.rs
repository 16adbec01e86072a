use anyhow::{Context, Result};
use pd_core::{Logger, RedactingFormatter};
use pd_db::queries;
use sqlx::Connection;
use tokio_stream::StreamExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Diagnostics go through the same redacting format as the row log.
    // Use RUST_LOG env var to control log levels, defaulting to info.
    let diagnostics = match RedactingFormatter::pii() {
        Ok(formatter) => formatter,
        Err(e) => {
            eprintln!("Invalid redaction configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .event_format(diagnostics)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        error!("filtered-logger exited with error: {:#}", e);
        std::process::exit(1);
    }
}

/// Log every row of the personal data `users` table with PII redacted.
async fn run() -> Result<()> {
    let mut conn = pd_db::get_db()
        .await
        .context("Failed to connect to the personal data database")?;

    let logger = Logger::user_data(std::io::stderr()).context("Failed to build user_data logger")?;

    // Rows are logged as they arrive instead of loading the whole table.
    let mut logged = 0usize;
    {
        let mut rows = queries::stream_personal_data(&mut conn);
        while let Some(row) = rows.next().await {
            let row = row.context("Failed to read the users table")?;
            logger
                .info(row.to_log_message())
                .context("Failed to write log line")?;
            logged += 1;
        }
    }

    conn.close().await.context("Failed to close database connection")?;

    info!("Logged {} users", logged);
    Ok(())
}
