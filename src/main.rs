//! alertline - request logging with severity-filtered fan-out and SMS alerts.

use alertline::{app::App, cli::Cli, config::Config};
use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            tracing_subscriber::fmt().init();
            error!("Failed to load configuration: {:#}", err);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Listen Address: {}", config.server.listen_addr);
    info!(
        "Console Channel: {}",
        if config.console.enabled {
            format!("enabled (>= {})", config.console.threshold)
        } else {
            "disabled".to_string()
        }
    );
    info!(
        "File Channel: {}",
        if config.file.enabled {
            format!("{} (>= {})", config.file.path.display(), config.file.threshold)
        } else {
            "disabled".to_string()
        }
    );
    match &config.sms {
        Some(sms) => info!(
            "SMS Channel: {} recipient(s) (>= {})",
            sms.recipients.len(),
            sms.threshold
        ),
        None => info!("SMS Channel: disabled"),
    }
    info!("-------------------------------------------------------");

    let app = App::builder(config).start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Shutting down gracefully...");

    app.shutdown().await
}
