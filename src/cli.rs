//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `alertline.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// A demo web server whose request log fans out to the console, a file and SMS.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address for the HTTP server to listen on.
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Level filter for the process's own diagnostics.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Path of the log file channel.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Disable the SMS alert channel even if it is configured.
    #[arg(long)]
    pub no_sms: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(listen) = &self.listen {
            let mut server = Dict::new();
            server.insert("listen_addr".into(), Value::from(listen.clone()));
            dict.insert("server".into(), Value::from(server));
        }

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        if let Some(path) = &self.log_file {
            let mut file = Dict::new();
            file.insert("path".into(), Value::from(path.display().to_string()));
            dict.insert("file".into(), Value::from(file));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
