//! Explicitly constructed, redacting loggers.
//!
//! A [`Logger`] owns its formatter and its output sink. There is no
//! process-wide registry: callers build the logger they need and pass it to
//! whatever code emits records.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use crate::formatter::{Level, LogRecord, RedactingFormatter};
use crate::redaction::RedactionError;

/// Name of the logger used for personal-data rows.
pub const USER_DATA_LOGGER: &str = "user_data";

/// A named logger writing redacted lines to a sink.
///
/// Records below the configured level are dropped. Writes are serialised
/// through an internal mutex so one logger can be shared across threads.
pub struct Logger {
    name: String,
    level: Level,
    formatter: RedactingFormatter,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
    pub fn new(
        name: impl Into<String>,
        level: Level,
        formatter: RedactingFormatter,
        sink: impl Write + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            level,
            formatter,
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// The `user_data` logger: `INFO` and above, redacting the default PII fields.
    pub fn user_data(sink: impl Write + Send + 'static) -> Result<Self, RedactionError> {
        Ok(Self::new(
            USER_DATA_LOGGER,
            Level::Info,
            RedactingFormatter::pii()?,
            sink,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Log `message` at `level` under this logger's name.
    pub fn log(&self, level: Level, message: impl Into<String>) -> io::Result<()> {
        if !self.is_enabled(level) {
            return Ok(());
        }
        self.emit(&LogRecord::new(self.name.as_str(), level, message))
    }

    /// Format and write a prepared record, one line per record.
    pub fn emit(&self, record: &LogRecord) -> io::Result<()> {
        if !self.is_enabled(record.level) {
            return Ok(());
        }

        let mut line = self.formatter.format(record);
        line.push('\n');

        let mut sink = self.sink.lock().unwrap_or_else(|p| p.into_inner());
        sink.write_all(line.as_bytes())?;
        sink.flush()
    }

    pub fn debug(&self, message: impl Into<String>) -> io::Result<()> {
        self.log(Level::Debug, message)
    }

    pub fn info(&self, message: impl Into<String>) -> io::Result<()> {
        self.log(Level::Info, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> io::Result<()> {
        self.log(Level::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> io::Result<()> {
        self.log(Level::Error, message)
    }

    pub fn critical(&self, message: impl Into<String>) -> io::Result<()> {
        self.log(Level::Critical, message)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("formatter", &self.formatter)
            .finish()
    }
}
