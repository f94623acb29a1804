//! The side channel for failures inside the logging pipeline itself.
//!
//! Delivery failures cannot be logged through the dispatcher that produced
//! them without risking a loop (a failing SMS channel would page about its
//! own failure). They are reported here instead.

use tracing::error;

/// Receives failures that the pipeline absorbed.
pub trait DiagnosticSink: Send + Sync {
    /// Reports a failure from `source` (usually a channel name).
    ///
    /// `kind` is a short machine-friendly label such as `timeout` or `panic`.
    fn report(&self, source: &str, kind: &str, description: &str);
}

/// Writes diagnostics to the process's own `tracing` output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, source: &str, kind: &str, description: &str) {
        error!(
            target: "alertline::diagnostics",
            source,
            kind,
            "{}",
            description
        );
    }
}
