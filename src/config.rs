//! Configuration management for alertline
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer defaults, an optional `alertline.toml` file, environment
//! variables and command-line arguments.

use crate::channels::sms::{AlertOptions, DEFAULT_MAX_BODY_CHARS};
use crate::cli::Cli;
use crate::core::Severity;
use crate::notification::messagebird::DEFAULT_ENDPOINT;
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map, Value},
    Figment, Metadata, Profile, Provider,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// The file read when `--config` is not given. It is optional.
pub const DEFAULT_CONFIG_FILE: &str = "alertline.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The level filter for the process's own diagnostics (`tracing`).
    pub log_level: String,
    /// The name shown in every rendered record, e.g. `App.ERROR`.
    pub logger_name: String,
    /// Configuration for the HTTP server.
    pub server: ServerConfig,
    /// The console channel.
    pub console: ConsoleConfig,
    /// The append-only log file channel.
    pub file: FileConfig,
    /// The SMS alert channel. Disabled when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms: Option<SmsConfig>,
}

/// Configuration for the HTTP server.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub listen_addr: String,
}

/// Configuration for the console channel, which writes to stderr.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub threshold: Severity,
}

/// Configuration for the log file channel.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FileConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub threshold: Severity,
}

/// Configuration for SMS alerts.
///
/// Required fields default to empty so that a missing value is reported by
/// the channel's own validation rather than as a parse error.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SmsConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub originator: String,
    /// Either a list or a comma-separated string.
    #[serde(default, deserialize_with = "string_list")]
    pub recipients: Vec<String>,
    #[serde(default = "default_sms_threshold")]
    pub threshold: Severity,
    #[serde(default = "default_sms_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_sms_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
}

fn default_sms_threshold() -> Severity {
    Severity::Error
}

fn default_sms_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_sms_timeout_ms() -> u64 {
    10_000
}

fn default_max_body_chars() -> usize {
    DEFAULT_MAX_BODY_CHARS
}

impl SmsConfig {
    /// Converts the settings into options for the SMS channel.
    pub fn to_alert_options(&self) -> AlertOptions {
        AlertOptions {
            api_key: self.api_key.clone(),
            originator: self.originator.clone(),
            recipients: self.recipients.clone(),
            max_body_chars: self.max_body_chars,
            endpoint: self.endpoint.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Splits a comma-separated list, dropping surrounding whitespace and empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(raw) => split_list(&raw),
        OneOrMany::Many(list) => list,
    })
}

/// Reads the SMS credentials and phone numbers from three environment
/// variables into the `sms` table.
///
/// The values are taken verbatim, so phone numbers keep their leading `+`
/// or `0` instead of being parsed as integers.
#[derive(Debug, Clone, Copy)]
pub struct SmsEnv {
    name: &'static str,
    api_key: &'static str,
    originator: &'static str,
    recipients: &'static str,
}

impl SmsEnv {
    /// `MESSAGEBIRD_API_KEY`, `MESSAGEBIRD_ORIGINATOR`, `MESSAGEBIRD_RECIPIENTS`.
    pub const MESSAGEBIRD: SmsEnv = SmsEnv {
        name: "MessageBird environment variables",
        api_key: "MESSAGEBIRD_API_KEY",
        originator: "MESSAGEBIRD_ORIGINATOR",
        recipients: "MESSAGEBIRD_RECIPIENTS",
    };

    /// `ALERTLINE_SMS__API_KEY`, `ALERTLINE_SMS__ORIGINATOR`, `ALERTLINE_SMS__RECIPIENTS`.
    pub const ALERTLINE: SmsEnv = SmsEnv {
        name: "`ALERTLINE_SMS__` environment variables",
        api_key: "ALERTLINE_SMS__API_KEY",
        originator: "ALERTLINE_SMS__ORIGINATOR",
        recipients: "ALERTLINE_SMS__RECIPIENTS",
    };
}

/// Keys that `SmsEnv::ALERTLINE` owns. The generic `Env` provider skips them.
const RAW_SMS_KEYS: [&str; 3] = ["sms.api_key", "sms.originator", "sms.recipients"];

impl Provider for SmsEnv {
    fn metadata(&self) -> Metadata {
        Metadata::named(self.name)
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        let mut sms = Dict::new();

        if let Ok(key) = std::env::var(self.api_key) {
            sms.insert("api_key".into(), Value::from(key));
        }
        if let Ok(originator) = std::env::var(self.originator) {
            sms.insert("originator".into(), Value::from(originator));
        }
        if let Ok(recipients) = std::env::var(self.recipients) {
            sms.insert("recipients".into(), Value::from(split_list(&recipients)));
        }

        let mut dict = Dict::new();
        if !sms.is_empty() {
            dict.insert("sms".into(), Value::from(sms));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}

impl Config {
    /// Loads the configuration, layering (lowest to highest precedence)
    /// defaults, the TOML file, `MESSAGEBIRD_*` variables, `ALERTLINE_*`
    /// variables and finally command-line arguments.
    ///
    /// SMS credentials and phone numbers under `ALERTLINE_SMS__*` are read
    /// as plain strings; every other `ALERTLINE_*` value goes through
    /// figment's usual parsing.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        figment = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found at specified path: {}", path.display());
                }
                figment.merge(Toml::file(path))
            }
            None => figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
        };

        let mut config: Config = figment
            .merge(SmsEnv::MESSAGEBIRD)
            // e.g. ALERTLINE_FILE__THRESHOLD=warning
            .merge(Env::prefixed("ALERTLINE_").split("__").ignore(&RAW_SMS_KEYS))
            .merge(SmsEnv::ALERTLINE)
            .merge(cli.clone())
            .extract()?;

        if cli.no_sms {
            config.sms = None;
        }
        Ok(config)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            logger_name: "App".to_string(),
            server: ServerConfig {
                listen_addr: "127.0.0.1:8080".to_string(),
            },
            console: ConsoleConfig {
                enabled: true,
                threshold: Severity::Debug,
            },
            file: FileConfig {
                enabled: true,
                path: PathBuf::from("app.log"),
                threshold: Severity::Info,
            },
            sms: None,
        }
    }
}
