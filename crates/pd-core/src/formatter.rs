//! Log line rendering with PII redaction.
//!
//! Every record is rendered with a fixed template,
//!
//! ```text
//! [HOLBERTON] <name> <LEVEL> <YYYY-MM-DD HH:MM:SS,mmm>: <message>
//! ```
//!
//! and the whole rendered line is then passed through a [`Redactor`]. Because
//! redaction runs over the full line rather than just the message, any part of
//! the header that looks like `field=value` for a sensitive field is redacted
//! as well.
//!
//! [`RedactingFormatter`] also implements [`FormatEvent`], so it can be used as
//! the event format of a `tracing_subscriber::fmt` subscriber.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::redaction::{RedactionError, Redactor};

/// Token substituted for every sensitive value.
pub const REDACTION: &str = "***";

/// Character delimiting `key=value` segments.
pub const SEPARATOR: char = ';';

/// Tag rendered in brackets at the start of every line.
pub const DEFAULT_PREFIX: &str = "HOLBERTON";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Fields treated as PII by the reference deployment.
pub const PII_FIELDS: [&str; 5] = ["name", "email", "phone", "ssn", "password"];

/// Severity of a log record, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::INFO => Self::Info,
            // DEBUG and TRACE
            _ => Self::Debug,
        }
    }
}

/// A single log record before formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Name of the logger that produced the record.
    pub name: String,
    pub level: Level,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogRecord {
    /// Create a record stamped with the current UTC time.
    pub fn new(name: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level,
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// Renders log records and strips PII values from the rendered line.
#[derive(Debug, Clone)]
pub struct RedactingFormatter {
    redactor: Redactor,
    prefix: String,
}

impl RedactingFormatter {
    /// Build a formatter redacting `fields` with [`REDACTION`] and [`SEPARATOR`].
    pub fn new<I, S>(fields: I) -> Result<Self, RedactionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_prefix(fields, DEFAULT_PREFIX)
    }

    /// Same as [`RedactingFormatter::new`] with a custom bracketed prefix.
    pub fn with_prefix<I, S>(fields: I, prefix: impl Into<String>) -> Result<Self, RedactionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            redactor: Redactor::new(fields, REDACTION, SEPARATOR)?,
            prefix: prefix.into(),
        })
    }

    /// Formatter for the default [`PII_FIELDS`].
    pub fn pii() -> Result<Self, RedactionError> {
        Self::new(PII_FIELDS)
    }

    pub fn fields(&self) -> &[String] {
        self.redactor.fields()
    }

    /// Render `record` with the template, without redaction.
    pub fn render(&self, record: &LogRecord) -> String {
        self.render_line(&record.name, record.level, record.timestamp, &record.message)
    }

    /// Render `record` and redact the resulting line.
    pub fn format(&self, record: &LogRecord) -> String {
        self.redactor.redact(&self.render(record))
    }

    fn render_line(
        &self,
        name: &str,
        level: Level,
        timestamp: DateTime<Utc>,
        message: &str,
    ) -> String {
        let line = format!(
            "[{}] {} {} {}: {}",
            self.prefix,
            name,
            level,
            timestamp.format(TIMESTAMP_FORMAT),
            message
        );
        escape_line_breaks(&line).into_owned()
    }
}

impl<S, N> FormatEvent<S, N> for RedactingFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let line = self.render_line(
            metadata.target(),
            Level::from(metadata.level()),
            Utc::now(),
            &visitor.into_message(),
        );
        writeln!(writer, "{}", self.redactor.redact(&line))
    }
}

/// Collects the `message` field of an event, plus every other field as a
/// `key=value;` segment so structured PII is redacted like inline PII.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn into_message(self) -> String {
        let segments = self
            .fields
            .iter()
            .map(|f| format!("{}{}", f, SEPARATOR))
            .collect::<Vec<_>>()
            .join(" ");

        match (self.message.is_empty(), segments.is_empty()) {
            (_, true) => self.message,
            (true, false) => segments,
            (false, false) => format!("{} {}", self.message, segments),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

fn escape_line_breaks(line: &str) -> Cow<'_, str> {
    if line.contains(['\n', '\r']) {
        Cow::Owned(line.replace('\r', "\\r").replace('\n', "\\n"))
    } else {
        Cow::Borrowed(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SharedBuffer;
    use chrono::TimeZone;

    fn record(message: &str) -> LogRecord {
        LogRecord {
            name: "my_logger".to_string(),
            level: Level::Info,
            timestamp: Utc
                .with_ymd_and_hms(2019, 11, 19, 18, 24, 25)
                .unwrap()
                + chrono::Duration::milliseconds(105),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_render_uses_template() {
        let formatter = RedactingFormatter::pii().unwrap();
        assert_eq!(
            formatter.render(&record("hello")),
            "[HOLBERTON] my_logger INFO 2019-11-19 18:24:25,105: hello"
        );
    }

    #[test]
    fn test_format_redacts_message() {
        let formatter = RedactingFormatter::new(["email", "ssn", "password"]).unwrap();
        let msg = "name=Bob;email=bob@dylan.com;ssn=000-123-0000;password=bobby2019;";
        assert_eq!(
            formatter.format(&record(msg)),
            "[HOLBERTON] my_logger INFO 2019-11-19 18:24:25,105: \
             name=Bob;email=***;ssn=***;password=***;"
        );
    }

    #[test]
    fn test_format_without_pii_matches_render() {
        let formatter = RedactingFormatter::pii().unwrap();
        let r = record("ip=10.0.0.1; user_agent=curl/8.0;");
        assert_eq!(formatter.format(&r), formatter.render(&r));
    }

    #[test]
    fn test_header_is_redacted_too() {
        let formatter = RedactingFormatter::new(["name"]).unwrap();
        let mut r = record("ok");
        r.name = "name=svc".to_string();
        // The value runs to the end of the line since nothing else contains `;`.
        assert_eq!(formatter.format(&r), "[HOLBERTON] name=***");
    }

    #[test]
    fn test_custom_prefix() {
        let formatter = RedactingFormatter::with_prefix(["ssn"], "AUDIT").unwrap();
        assert!(formatter.format(&record("ssn=1;")).starts_with("[AUDIT] my_logger INFO "));
        assert!(formatter.format(&record("ssn=1;")).ends_with(": ssn=***;"));
    }

    #[test]
    fn test_output_is_single_line() {
        let formatter = RedactingFormatter::pii().unwrap();
        let line = formatter.format(&record("email=a@x.com\nssn=1;\r\nip=2;"));
        assert!(!line.contains('\n') && !line.contains('\r'));
        assert!(line.ends_with(": email=***;\\r\\nip=2;"));
    }

    #[test]
    fn test_invalid_fields_are_rejected() {
        assert!(RedactingFormatter::new(["a;b"]).is_err());
    }

    #[test]
    fn test_level_names_and_order() {
        assert_eq!(Level::Warning.to_string(), "WARNING");
        assert_eq!(Level::from(&tracing::Level::TRACE), Level::Debug);
        assert_eq!(Level::from(&tracing::Level::WARN), Level::Warning);
        assert!(Level::Debug < Level::Info && Level::Error < Level::Critical);
        assert_eq!(serde_json::to_string(&Level::Critical).unwrap(), "\"CRITICAL\"");
    }

    // -- tracing integration ------------------------------------------------

    fn capture_events<F: FnOnce()>(f: F) -> String {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .event_format(RedactingFormatter::pii().unwrap())
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        tracing::subscriber::with_default(subscriber, f);
        buffer.contents()
    }

    #[test]
    fn test_format_event_redacts_message() {
        let output = capture_events(|| {
            tracing::info!(target: "user_data", "name=Bob; email=bob@x.com; ip=1.2.3.4;");
        });
        assert!(output.starts_with("[HOLBERTON] user_data INFO "));
        assert!(output.ends_with(": name=***; email=***; ip=1.2.3.4;\n"));
    }

    #[test]
    fn test_format_event_redacts_structured_fields() {
        let output = capture_events(|| {
            tracing::warn!(target: "user_data", ssn = "000-12-3456", attempts = 3, "lookup");
        });
        assert!(output.starts_with("[HOLBERTON] user_data WARNING "));
        assert!(output.ends_with(": lookup ssn=***; attempts=3;\n"));
        assert!(!output.contains("000-12-3456"));
    }
}
