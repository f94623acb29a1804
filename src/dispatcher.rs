//! Severity-filtered fan-out of log records to registered channels.
//!
//! The dispatcher owns an ordered list of `(channel, threshold)` pairs. For
//! each call to [`Dispatcher::log`] it renders one [`Record`] and hands it to
//! every channel whose threshold the record meets, in registration order.
//! Channel failures, including panics, are reported to the diagnostic sink
//! and never reach the caller.

use crate::core::{Channel, Record, Severity};
use crate::diagnostics::{DiagnosticSink, TracingDiagnostics};
use crate::formatting::{LineFormatter, RecordFormatter};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// A channel together with the minimum severity it was registered for.
#[derive(Clone)]
pub struct Registration {
    channel: Arc<dyn Channel>,
    threshold: Severity,
}

impl Registration {
    pub fn new(channel: Arc<dyn Channel>, threshold: Severity) -> Self {
        Self { channel, threshold }
    }

    /// Returns true when a record of `severity` should go to this channel.
    pub fn accepts(&self, severity: Severity) -> bool {
        severity >= self.threshold
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("channel", &self.channel.name())
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Hands out timestamps that never go backwards, even if the wall clock does.
#[derive(Debug)]
struct MonotonicClock {
    last: Mutex<DateTime<Utc>>,
}

impl MonotonicClock {
    fn new() -> Self {
        Self {
            last: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.next_from(Utc::now())
    }

    fn next_from(&self, candidate: DateTime<Utc>) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if candidate > *last {
            *last = candidate;
        }
        *last
    }
}

/// The central logger. Build it at startup, register channels, then share
/// it behind an `Arc`; the registration list is fixed from then on.
pub struct Dispatcher {
    formatter: Box<dyn RecordFormatter>,
    registrations: Vec<Registration>,
    diagnostics: Arc<dyn DiagnosticSink>,
    clock: MonotonicClock,
}

impl Dispatcher {
    /// Creates a dispatcher with no channels that reports failures through `tracing`.
    pub fn new(formatter: impl RecordFormatter + 'static) -> Self {
        Self {
            formatter: Box::new(formatter),
            registrations: Vec::new(),
            diagnostics: Arc::new(TracingDiagnostics),
            clock: MonotonicClock::new(),
        }
    }

    /// Replaces the sink that absorbed channel failures are reported to.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Appends a channel. The same channel may be registered more than once;
    /// each registration is evaluated on its own.
    pub fn register(&mut self, channel: Arc<dyn Channel>, threshold: Severity) -> &mut Self {
        trace!(channel = channel.name(), %threshold, "Registering channel");
        self.registrations.push(Registration::new(channel, threshold));
        self
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Renders a record and delivers it to every channel that accepts its severity.
    ///
    /// Channels are awaited one after another in registration order. Nothing
    /// is returned to the caller: a failing channel is reported to the
    /// diagnostic sink and the remaining channels still run.
    pub async fn log(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        let timestamp = self.clock.now();
        let formatted = self.formatter.format(severity, &message, timestamp);
        let record = Record::new(severity, message, formatted, timestamp);

        for registration in &self.registrations {
            if !registration.accepts(severity) {
                continue;
            }
            self.deliver_isolated(registration.channel(), &record).await;
        }
    }

    async fn deliver_isolated(&self, channel: &Arc<dyn Channel>, record: &Record) {
        let name = channel.name();
        trace!(channel = name, severity = %record.severity(), "Delivering record");

        match AssertUnwindSafe(channel.deliver(record)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.diagnostics.report(name, "delivery", &format!("{:#}", e));
            }
            Err(panic) => {
                self.diagnostics.report(name, "panic", &panic_message(&*panic));
            }
        }
    }

    pub async fn debug(&self, message: impl Into<String>) {
        self.log(Severity::Debug, message).await
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(Severity::Info, message).await
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.log(Severity::Warning, message).await
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(Severity::Error, message).await
    }

    pub async fn critical(&self, message: impl Into<String>) {
        self.log(Severity::Critical, message).await
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(LineFormatter::default())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "channel panicked".to_string()
    }
}
