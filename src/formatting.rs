// src/formatting.rs

use crate::core::Severity;
use chrono::{DateTime, SecondsFormat, Utc};
use std::borrow::Cow;

/// A trait for rendering a log event into the text channels write out.
///
/// Implementations must be pure: the same inputs always produce the same string.
pub trait RecordFormatter: Send + Sync {
    fn format(&self, severity: Severity, message: &str, timestamp: DateTime<Utc>) -> String;
}

/// Renders `[<timestamp>] <logger>.<LEVEL>: <message>` on a single line.
///
/// Line breaks inside the message (`\r\n`, `\r`, `\n`) become single spaces.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    logger_name: String,
}

impl LineFormatter {
    pub fn new(logger_name: impl Into<String>) -> Self {
        Self {
            logger_name: logger_name.into(),
        }
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new("App")
    }
}

impl RecordFormatter for LineFormatter {
    fn format(&self, severity: Severity, message: &str, timestamp: DateTime<Utc>) -> String {
        format!(
            "[{}] {}.{}: {}",
            timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.logger_name,
            severity,
            single_line(message)
        )
    }
}

fn single_line(message: &str) -> Cow<'_, str> {
    if !message.contains(['\r', '\n']) {
        return Cow::Borrowed(message);
    }
    Cow::Owned(message.replace("\r\n", " ").replace(['\r', '\n'], " "))
}
