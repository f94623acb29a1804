//! # Demo Server
//!
//! A small `axum` application that exercises the logging pipeline. Every
//! request passes through [`log_requests`], and two routes exist purely to
//! produce interesting records:
//!
//! - `/simulateError` answers with a 500, which is logged at ERROR.
//! - `/makeLogEntries` writes one record at each of DEBUG, INFO, WARNING and ERROR.

use crate::dispatcher::Dispatcher;
use crate::middleware::log_requests;
use axum::{extract::State, http::StatusCode, middleware, routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// Builds the router with request logging attached.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/simulateError", get(simulate_error))
        .route("/makeLogEntries", get(make_log_entries))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(dispatcher.clone(), log_requests))
        .with_state(dispatcher)
}

async fn hello() -> &'static str {
    "Hello World :)"
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn simulate_error() -> (StatusCode, &'static str) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "This should trigger error handling!",
    )
}

async fn make_log_entries(State(dispatcher): State<Arc<Dispatcher>>) -> &'static str {
    dispatcher.debug("This is a test at debug level.").await;
    dispatcher.info("This is a test at info level.").await;
    dispatcher.warning("This is a test at warning level.").await;
    dispatcher.error("This is a test at error level.").await;
    "You should see some log entries."
}

/// Serves the demo application on an already-bound listener.
pub struct DemoServer {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown_rx: watch::Receiver<bool>,
}

impl DemoServer {
    pub fn new(
        listener: TcpListener,
        dispatcher: Arc<Dispatcher>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            listener,
            dispatcher,
            shutdown_rx,
        }
    }

    /// Returns a future that runs the server until a shutdown signal is received.
    pub fn run(self) -> impl Future<Output = ()> {
        let DemoServer {
            listener,
            dispatcher,
            mut shutdown_rx,
        } = self;
        let app = router(dispatcher);

        async move {
            if let Ok(addr) = listener.local_addr() {
                info!(%addr, "HTTP server listening");
            }
            let shutdown = async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("HTTP server error: {}", e);
            }
            info!("HTTP server stopped.");
        }
    }
}
