//! Core domain types and service traits for alertline
//!
//! This module defines the log record model and the trait contract that
//! every output channel implements.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The importance of a log event, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// The upper-case name used in rendered log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown severity '{0}'")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// One log event plus its rendered text.
///
/// Records are built by the dispatcher and handed to channels by shared
/// reference. Fields are read-only so every channel observes the same
/// `formatted` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    severity: Severity,
    message: String,
    formatted: String,
    timestamp: DateTime<Utc>,
}

impl Record {
    /// Creates a record. `formatted` must already be rendered from the other fields.
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        formatted: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            formatted,
            timestamp,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The raw text supplied by the caller.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The rendered representation that channels write out.
    pub fn formatted(&self) -> &str {
        &self.formatted
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// A delivery target for log records.
///
/// Severity filtering is owned by the dispatcher, so a channel only has to
/// know how to write a record out.
#[async_trait]
pub trait Channel: Send + Sync {
    /// A unique, descriptive name for the channel (e.g., "stderr", "sms").
    /// Used in diagnostics.
    fn name(&self) -> &str;

    /// Delivers a record to the channel's medium.
    ///
    /// # Returns
    /// * `Ok(())` if the record was written or the failure was handled internally
    /// * `Err` if writing failed; the dispatcher absorbs it
    async fn deliver(&self, record: &Record) -> Result<()>;
}
