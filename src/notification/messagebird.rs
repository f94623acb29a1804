//! A client for sending SMS messages through the MessageBird REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// The default MessageBird API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://rest.messagebird.com";

/// MessageBird's error code for an account without enough balance.
const NOT_ENOUGH_BALANCE: i64 = 25;

/// One SMS as handed to the gateway.
///
/// The sender and recipients are borrowed from the channel's configuration;
/// only the body is built per delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage<'a> {
    pub originator: &'a str,
    pub recipients: &'a [String],
    pub body: Cow<'a, str>,
}

/// Why the gateway did not accept a message.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request to SMS gateway timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("could not reach SMS gateway: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("SMS gateway rejected credentials (status {status}): {description}")]
    Authentication { status: u16, description: String },
    #[error("SMS gateway quota exhausted (status {status}): {description}")]
    Quota { status: u16, description: String },
    #[error("SMS gateway rejected message (status {status}): {description}")]
    Rejected { status: u16, description: String },
}

impl DeliveryError {
    /// A short label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryError::Timeout(_) => "timeout",
            DeliveryError::Transport(_) => "transport",
            DeliveryError::Authentication { .. } => "authentication",
            DeliveryError::Quota { .. } => "quota",
            DeliveryError::Rejected { .. } => "rejected",
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DeliveryError::Timeout(e)
        } else {
            DeliveryError::Transport(e)
        }
    }
}

/// A trait for clients that can hand an SMS to a gateway.
#[async_trait]
pub trait SmsClientTrait: Send + Sync {
    /// Sends one message to all of its recipients.
    async fn send(&self, message: &OutgoingMessage<'_>) -> Result<(), DeliveryError>;
}

#[derive(Debug, Default, Deserialize)]
struct GatewayErrorBody {
    #[serde(default)]
    errors: Vec<GatewayError>,
}

#[derive(Debug, Deserialize)]
struct GatewayError {
    code: i64,
    #[serde(default)]
    description: String,
}

/// Sends messages to `<endpoint>/messages` with an access key.
#[derive(Debug, Clone)]
pub struct MessageBirdClient {
    http: reqwest::Client,
    messages_url: String,
    access_key: String,
}

impl MessageBirdClient {
    /// Creates a new `MessageBirdClient`.
    ///
    /// The underlying HTTP client is built once and reused for every message.
    pub fn new(endpoint: &str, access_key: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            messages_url: format!("{}/messages", endpoint.trim_end_matches('/')),
            access_key: access_key.into(),
        })
    }

    fn classify(status: reqwest::StatusCode, body: &str) -> DeliveryError {
        let parsed: GatewayErrorBody = serde_json::from_str(body).unwrap_or_default();
        let description = if parsed.errors.is_empty() {
            body.trim().to_string()
        } else {
            parsed
                .errors
                .iter()
                .map(|e| e.description.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        };
        let status_code = status.as_u16();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            DeliveryError::Authentication {
                status: status_code,
                description,
            }
        } else if status == reqwest::StatusCode::PAYMENT_REQUIRED
            || parsed.errors.iter().any(|e| e.code == NOT_ENOUGH_BALANCE)
        {
            DeliveryError::Quota {
                status: status_code,
                description,
            }
        } else {
            DeliveryError::Rejected {
                status: status_code,
                description,
            }
        }
    }
}

#[async_trait]
impl SmsClientTrait for MessageBirdClient {
    #[instrument(skip(self, message), fields(recipients = message.recipients.len()))]
    async fn send(&self, message: &OutgoingMessage<'_>) -> Result<(), DeliveryError> {
        let response = self
            .http
            .post(&self.messages_url)
            .header(reqwest::header::AUTHORIZATION, format!("AccessKey {}", self.access_key))
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "SMS accepted by gateway");
            return Ok(());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("failed to read response body: {}", e),
        };
        Err(Self::classify(status, &body))
    }
}
