//! Field-level redaction of `key=value` log messages.
//!
//! A message is a run of `key=value` segments joined by a single separator
//! character. Every segment whose key is one of the configured sensitive
//! fields has its value replaced by a fixed token; all other text is kept
//! byte for byte.
//!
//! # Matching rules
//!
//! - Field names are matched literally and case-sensitively. Pattern
//!   metacharacters in field names and in the separator are escaped.
//! - A field only matches where it does not continue a longer word: at the
//!   start of the text, after the separator, or after any character that is
//!   not a letter, digit or `_`. With the field `name`, `username=bob` is left
//!   alone while `(name=Bob` and `msg=name=Bob` are redacted.
//! - The value is the longest run of characters up to (not including) the next
//!   separator or the end of the text. Empty values are redacted too.

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::debug;

/// Errors raised while building a [`Redactor`] from its configuration.
#[derive(Debug, Error)]
pub enum RedactionError {
    #[error("Field name must not be empty")]
    EmptyField,
    #[error("Field name {field:?} contains the separator {separator:?}")]
    FieldContainsSeparator { field: String, separator: char },
    #[error("Field name {0:?} contains '=' or whitespace")]
    InvalidField(String),
    #[error("Separator {0:?} cannot delimit key=value pairs")]
    InvalidSeparator(char),
    #[error("Redaction token {token:?} contains the separator {separator:?}")]
    TokenContainsSeparator { token: String, separator: char },
    #[error("Failed to compile redaction pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A compiled redaction rule set.
///
/// Immutable once built, so a single instance can be shared freely between
/// threads and reused for every message.
#[derive(Debug, Clone)]
pub struct Redactor {
    fields: Vec<String>,
    redaction: String,
    separator: char,
    /// `None` when no fields are configured; every message then passes through.
    pattern: Option<Regex>,
}

impl Redactor {
    /// Build a redactor for `fields`, replacing their values with `redaction`.
    ///
    /// Duplicate field names are collapsed. The configuration is rejected when:
    /// - a field name is empty, contains `=`, whitespace, or the separator
    /// - the separator is `=`
    /// - the token contains the separator (a second pass would then split it)
    pub fn new<I, S>(
        fields: I,
        redaction: impl Into<String>,
        separator: char,
    ) -> Result<Self, RedactionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let redaction = redaction.into();

        if separator == '=' {
            return Err(RedactionError::InvalidSeparator(separator));
        }
        if redaction.contains(separator) {
            return Err(RedactionError::TokenContainsSeparator {
                token: redaction,
                separator,
            });
        }

        let mut unique: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            validate_field(&field, separator)?;
            if !unique.contains(&field) {
                unique.push(field);
            }
        }

        let pattern = if unique.is_empty() {
            None
        } else {
            Some(Regex::new(&build_pattern(&unique, separator))?)
        };

        debug!(
            fields = unique.len(),
            separator = %separator.escape_debug(),
            "Compiled redaction pattern"
        );

        Ok(Self {
            fields: unique,
            redaction,
            separator,
            pattern,
        })
    }

    /// Redact every sensitive `field=value` segment of `message`.
    pub fn redact(&self, message: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return message.to_string();
        };

        pattern
            .replace_all(message, |caps: &Captures<'_>| {
                format!("{}{}={}", &caps["lead"], &caps["field"], self.redaction)
            })
            .into_owned()
    }

    /// The sensitive field names, deduplicated, in configuration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn redaction(&self) -> &str {
        &self.redaction
    }

    pub fn separator(&self) -> char {
        self.separator
    }
}

/// One-shot redaction of a single message.
///
/// Compiles a [`Redactor`] for this call only; build one with
/// [`Redactor::new`] and reuse it when redacting many messages.
pub fn filter_datum<I, S>(
    fields: I,
    redaction: &str,
    message: &str,
    separator: char,
) -> Result<String, RedactionError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Ok(Redactor::new(fields, redaction, separator)?.redact(message))
}

fn validate_field(field: &str, separator: char) -> Result<(), RedactionError> {
    if field.is_empty() {
        return Err(RedactionError::EmptyField);
    }
    if field.contains(separator) {
        return Err(RedactionError::FieldContainsSeparator {
            field: field.to_string(),
            separator,
        });
    }
    if field.contains('=') || field.chars().any(char::is_whitespace) {
        return Err(RedactionError::InvalidField(field.to_string()));
    }
    Ok(())
}

/// `(?P<lead>^|\W|<sep>)(?P<field>f1|f2|..)=[^<sep>]*`
fn build_pattern(fields: &[String], separator: char) -> String {
    let mut buf = [0u8; 4];
    let sep = regex::escape(separator.encode_utf8(&mut buf));
    let alternatives = fields
        .iter()
        .map(|f| regex::escape(f))
        .collect::<Vec<_>>()
        .join("|");

    format!(r"(?P<lead>^|\W|{sep})(?P<field>{alternatives})=[^{sep}]*")
}
