//! Integration test for channel failure handling.

#[path = "../helpers/mod.rs"]
mod helpers;

use alertline::channels::{AlertChannel, AlertOptions};
use alertline::core::{Channel, Record, Severity};
use alertline::dispatcher::Dispatcher;
use async_trait::async_trait;
use helpers::mock_channel::RecordingChannel;
use helpers::RecordingDiagnostics;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct PanickingChannel;

#[async_trait]
impl Channel for PanickingChannel {
    fn name(&self) -> &str {
        "panicking_mock"
    }

    async fn deliver(&self, _record: &Record) -> anyhow::Result<()> {
        panic!("writer poisoned");
    }
}

fn gateway_options(server: &MockServer, timeout: Duration) -> AlertOptions {
    let mut options = AlertOptions::new("test_key", "AlertLine", vec!["31612345678".to_string()]);
    options.endpoint = server.uri();
    options.timeout = timeout;
    options
}

#[tokio::test]
async fn test_gateway_outage_does_not_affect_other_channels() {
    // Arrange: a gateway that answers every message with a server error.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let sms_diagnostics = Arc::new(RecordingDiagnostics::default());
    let alert = AlertChannel::messagebird(gateway_options(&server, Duration::from_secs(5)))
        .unwrap()
        .with_diagnostics(sms_diagnostics.clone());
    let stream = Arc::new(RecordingChannel::new("stream"));

    let mut dispatcher = Dispatcher::default();
    dispatcher
        .register(Arc::new(alert), Severity::Error)
        .register(stream.clone(), Severity::Info);

    // Act
    dispatcher.error("[503] GET /checkout").await;

    // Assert
    assert_eq!(stream.messages(), vec!["[503] GET /checkout"]);
    let reports = sms_diagnostics.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, "rejected");
}

#[tokio::test]
async fn test_gateway_timeout_is_absorbed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let sms_diagnostics = Arc::new(RecordingDiagnostics::default());
    let alert = AlertChannel::messagebird(gateway_options(&server, Duration::from_millis(200)))
        .unwrap()
        .with_diagnostics(sms_diagnostics.clone());
    let stream = Arc::new(RecordingChannel::new("stream"));

    let mut dispatcher = Dispatcher::default();
    dispatcher
        .register(Arc::new(alert), Severity::Error)
        .register(stream.clone(), Severity::Info);

    dispatcher.critical("queue backlog").await;

    assert_eq!(stream.messages(), vec!["queue backlog"]);
    assert_eq!(sms_diagnostics.reports()[0].kind, "timeout");
}

#[tokio::test]
async fn test_panicking_channel_does_not_crash_dispatch() {
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let before = Arc::new(RecordingChannel::new("before"));
    let after = Arc::new(RecordingChannel::new("after"));

    let mut dispatcher = Dispatcher::default().with_diagnostics(diagnostics.clone());
    dispatcher
        .register(before.clone(), Severity::Debug)
        .register(Arc::new(PanickingChannel), Severity::Debug)
        .register(after.clone(), Severity::Debug);

    dispatcher.info("survives").await;
    dispatcher.info("again").await;

    assert_eq!(before.messages(), vec!["survives", "again"]);
    assert_eq!(after.messages(), vec!["survives", "again"]);

    let reports = diagnostics.reports();
    assert_eq!(reports.len(), 2);
    assert!(reports
        .iter()
        .all(|r| r.source == "panicking_mock" && r.kind == "panic" && r.description == "writer poisoned"));
}
