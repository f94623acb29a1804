//! Request/response logging for the HTTP server.
//!
//! Every completed request produces exactly one record whose severity comes
//! from the response status code.

use crate::core::Severity;
use crate::dispatcher::Dispatcher;
use axum::extract::{Request, State};
use axum::http::{Method, Uri};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

/// Maps a response status to the severity of its access-log record.
pub fn severity_for_status(status: u16) -> Severity {
    match status {
        500..=u16::MAX => Severity::Error,
        400..=499 => Severity::Warning,
        _ => Severity::Info,
    }
}

/// Renders the access-log line, e.g. `[404] GET /missing`.
pub fn request_line(status: u16, method: &Method, uri: &Uri) -> String {
    format!("[{}] {} {}", status, method, uri)
}

/// Axum middleware that logs each request after the handler has run.
pub async fn log_requests(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    dispatcher
        .log(severity_for_status(status), request_line(status, &method, &uri))
        .await;
    response
}
