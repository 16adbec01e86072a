//! Personal data handling: PII-redacting log formatting, explicit loggers,
//! bcrypt password hashing, and input validation.

pub mod formatter;
pub mod logger;
pub mod password;
pub mod redaction;
pub mod security;

#[cfg(test)]
pub(crate) mod testing;

pub use formatter::{Level, LogRecord, RedactingFormatter, PII_FIELDS, REDACTION, SEPARATOR};
pub use logger::Logger;
pub use redaction::{filter_datum, RedactionError, Redactor};
