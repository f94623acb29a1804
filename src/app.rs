//! The main application logic, decoupled from the entry point.

use crate::{
    channels::{AlertChannel, StreamChannel},
    config::Config,
    core::{Channel, Severity},
    dispatcher::Dispatcher,
    formatting::LineFormatter,
    server::DemoServer,
};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Builds the dispatcher and registers every channel enabled in `config`.
///
/// Fails if the SMS channel is configured but incomplete, or if the log
/// file cannot be opened.
pub async fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let mut dispatcher = Dispatcher::new(LineFormatter::new(config.logger_name.clone()));

    if config.console.enabled {
        dispatcher.register(Arc::new(StreamChannel::stderr()), config.console.threshold);
    }

    if config.file.enabled {
        let channel = StreamChannel::file(&config.file.path).await?;
        dispatcher.register(Arc::new(channel), config.file.threshold);
    }

    if let Some(sms) = &config.sms {
        let channel = AlertChannel::messagebird(sms.to_alert_options())
            .context("Failed to configure SMS alert channel")?;
        dispatcher.register(Arc::new(channel), sms.threshold);
    }

    Ok(dispatcher)
}

/// A handle to the running application.
pub struct App {
    dispatcher: Arc<Dispatcher>,
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    server_task: JoinHandle<()>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Signals the server to stop and waits for in-flight requests to finish.
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down HTTP server...");
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.server_task.await {
            error!("HTTP server task panicked: {:?}", e);
        }
        info!("Shutdown complete.");
        Ok(())
    }
}

/// Builder for the main application.
///
/// Tests use it to replace the configured channels with fakes.
pub struct AppBuilder {
    config: Config,
    channels_override: Option<Vec<(Arc<dyn Channel>, Severity)>>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            channels_override: None,
        }
    }

    /// Registers exactly these channels instead of the configured ones.
    pub fn channels_override(mut self, channels: Vec<(Arc<dyn Channel>, Severity)>) -> Self {
        self.channels_override = Some(channels);
        self
    }

    /// Builds the dispatcher, binds the listener and spawns the server.
    pub async fn start(self) -> Result<App> {
        let dispatcher = match self.channels_override {
            Some(channels) => {
                let mut dispatcher =
                    Dispatcher::new(LineFormatter::new(self.config.logger_name.clone()));
                for (channel, threshold) in channels {
                    dispatcher.register(channel, threshold);
                }
                dispatcher
            }
            None => build_dispatcher(&self.config).await?,
        };
        let dispatcher = Arc::new(dispatcher);

        let listener = TcpListener::bind(&self.config.server.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.server.listen_addr))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = DemoServer::new(listener, dispatcher.clone(), shutdown_rx);
        let server_task = tokio::spawn(server.run());

        info!(
            %local_addr,
            channels = dispatcher.registrations().len(),
            "alertline started"
        );

        Ok(App {
            dispatcher,
            local_addr,
            shutdown_tx,
            server_task,
        })
    }
}
