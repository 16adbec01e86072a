//! Strict allowlist-based validation for values that reach the database layer.
//!
//! Connection settings read from the environment and user-supplied columns go
//! through these validators before they are used to build connection options
//! or bound into queries.

use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors returned when input fails validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Invalid database name: {0}")]
    InvalidDatabaseName(String),
    #[error("Invalid username: {0}")]
    InvalidUsername(String),
    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),
    #[error("Input too long: max {max} chars, got {actual}")]
    TooLong { max: usize, actual: usize },
}

// ---------------------------------------------------------------------------
// Strict regex patterns -- allowlists only, never denylists.
// ---------------------------------------------------------------------------

/// RFC 5321 compatible email address (simplified but safe).
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*\.[a-zA-Z]{2,}$",
    )
    .unwrap()
});

/// MySQL / MariaDB database name: alphanumeric, underscore, hyphen, 1-64 chars.
static DB_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{1,64}$").unwrap());

/// MySQL account name: alphanumeric, dot, underscore, hyphen, 1-32 chars.
static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._-]{1,32}$").unwrap());

/// Hostname (RFC 952 / RFC 1123), also allowing `_` as container service
/// names often contain it.
static HOSTNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9._-]{0,253}[a-zA-Z0-9])?$").unwrap());

// ---------------------------------------------------------------------------
// Public validation functions
// ---------------------------------------------------------------------------

/// Validate an email address.
///
/// Uses a simplified RFC 5321 pattern that accepts all reasonable addresses
/// while rejecting injection payloads.
pub fn validate_email(email: &str) -> Result<&str, ValidationError> {
    validate_max_len(email, 254)?;
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(email)
}

/// Validate a database name (MySQL / MariaDB compatible).
///
/// Only alphanumeric characters, underscores, and hyphens are allowed.
/// Maximum 64 characters (MySQL limit).
pub fn validate_database_name(name: &str) -> Result<&str, ValidationError> {
    if !DB_NAME_RE.is_match(name) {
        return Err(ValidationError::InvalidDatabaseName(name.to_string()));
    }
    Ok(name)
}

/// Validate a MySQL account name.
///
/// Maximum 32 characters (MySQL 5.7+ limit).
pub fn validate_username(username: &str) -> Result<&str, ValidationError> {
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::InvalidUsername(username.to_string()));
    }
    Ok(username)
}

/// Validate a hostname (RFC 952 / RFC 1123) or an IPv4 / IPv6 address.
pub fn validate_hostname(hostname: &str) -> Result<&str, ValidationError> {
    if hostname.parse::<IpAddr>().is_ok() {
        return Ok(hostname);
    }
    validate_max_len(hostname, 253)?;
    if !HOSTNAME_RE.is_match(hostname) {
        return Err(ValidationError::InvalidHostname(hostname.to_string()));
    }
    Ok(hostname)
}

/// Reject values longer than `max` characters.
pub fn validate_max_len(input: &str, max: usize) -> Result<&str, ValidationError> {
    let actual = input.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { max, actual });
    }
    Ok(input)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
