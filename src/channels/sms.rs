//! A channel that pages operators by SMS.
//!
//! SMS bodies have a hard length limit, so long records are cut down and
//! marked before they are sent. Gateway failures are reported to the
//! diagnostic sink and never returned to the dispatcher.

use crate::core::{Channel, Record};
use crate::diagnostics::{DiagnosticSink, TracingDiagnostics};
use crate::notification::messagebird::{
    MessageBirdClient, OutgoingMessage, SmsClientTrait, DEFAULT_ENDPOINT,
};
use anyhow::Result;
use async_trait::async_trait;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// The longest body sent without truncation, in characters.
pub const DEFAULT_MAX_BODY_CHARS: usize = 140;

/// Appended to a body that was cut short.
pub const TRUNCATION_MARKER: &str = " ...";

/// Errors raised while constructing an [`AlertChannel`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("incomplete SMS configuration: api_key is required")]
    MissingApiKey,
    #[error("incomplete SMS configuration: originator is required")]
    MissingOriginator,
    #[error("incomplete SMS configuration: at least one recipient is required")]
    NoRecipients,
    #[error("incomplete SMS configuration: recipient #{0} is blank")]
    BlankRecipient(usize),
    #[error("max_body_chars must be greater than zero")]
    ZeroBodyLimit,
    #[error("failed to build SMS gateway client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Settings for the SMS channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertOptions {
    pub api_key: String,
    pub originator: String,
    pub recipients: Vec<String>,
    pub max_body_chars: usize,
    pub endpoint: String,
    pub timeout: Duration,
}

impl AlertOptions {
    /// Creates options with the required fields and defaults for the rest.
    pub fn new(
        api_key: impl Into<String>,
        originator: impl Into<String>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            originator: originator.into(),
            recipients,
            max_body_chars: DEFAULT_MAX_BODY_CHARS,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Checks that every required field is present and non-blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.originator.trim().is_empty() {
            return Err(ConfigError::MissingOriginator);
        }
        if self.recipients.is_empty() {
            return Err(ConfigError::NoRecipients);
        }
        if let Some(i) = self.recipients.iter().position(|r| r.trim().is_empty()) {
            return Err(ConfigError::BlankRecipient(i));
        }
        if self.max_body_chars == 0 {
            return Err(ConfigError::ZeroBodyLimit);
        }
        Ok(())
    }
}

/// Shortens `text` to `limit` characters plus [`TRUNCATION_MARKER`] when it is
/// longer than `limit`. Text of exactly `limit` characters is returned as is.
pub fn truncate_body(text: &str, limit: usize) -> Cow<'_, str> {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &text[..cut], TRUNCATION_MARKER)),
        None => Cow::Borrowed(text),
    }
}

/// Sends each record's formatted text as an SMS to a fixed list of recipients.
pub struct AlertChannel {
    originator: String,
    recipients: Vec<String>,
    max_body_chars: usize,
    client: Arc<dyn SmsClientTrait>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl AlertChannel {
    /// Creates a channel that sends through `client`.
    ///
    /// Fails immediately if the options are incomplete.
    pub fn new(options: AlertOptions, client: Arc<dyn SmsClientTrait>) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            originator: options.originator,
            recipients: options.recipients,
            max_body_chars: options.max_body_chars,
            client,
            diagnostics: Arc::new(TracingDiagnostics),
        })
    }

    /// Creates a channel backed by the MessageBird REST API.
    pub fn messagebird(options: AlertOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let client = MessageBirdClient::new(&options.endpoint, options.api_key.clone(), options.timeout)
            .map_err(ConfigError::HttpClient)?;
        Self::new(options, Arc::new(client))
    }

    /// Replaces the sink that gateway failures are reported to.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Builds the message that would be sent for `text`.
    pub fn compose<'a>(&'a self, text: &'a str) -> OutgoingMessage<'a> {
        OutgoingMessage {
            originator: &self.originator,
            recipients: &self.recipients,
            body: truncate_body(text, self.max_body_chars),
        }
    }
}

#[async_trait]
impl Channel for AlertChannel {
    fn name(&self) -> &str {
        "sms"
    }

    async fn deliver(&self, record: &Record) -> Result<()> {
        let message = self.compose(record.formatted());
        match self.client.send(&message).await {
            Ok(()) => {
                debug!(
                    recipients = self.recipients.len(),
                    truncated = matches!(message.body, Cow::Owned(_)),
                    "SMS alert sent"
                );
            }
            Err(e) => self.diagnostics.report(self.name(), e.kind(), &e.to_string()),
        }
        Ok(())
    }
}
