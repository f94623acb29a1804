use alertline::app::build_dispatcher;
use alertline::channels::ConfigError;
use alertline::cli::Cli;
use alertline::config::{Config, SmsConfig};
use alertline::core::Severity;
use clap::Parser;
use figment::Jail;
use std::path::PathBuf;

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["alertline"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_defaults_without_file_or_env() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        let config = Config::load(&cli(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.sms.is_none());
        Ok(())
    });
}

#[test]
fn test_load_full_valid_config() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "alertline.toml",
            r#"
                log_level = "debug"
                logger_name = "Shop"
                [server]
                listen_addr = "0.0.0.0:9000"
                [console]
                enabled = false
                threshold = "warning"
                [file]
                path = "/var/log/shop.log"
                threshold = "error"
                enabled = true
                [sms]
                api_key = "live_key"
                originator = "ShopOps"
                recipients = ["31612345678", "31687654321"]
                threshold = "critical"
                timeout_ms = 2500
                max_body_chars = 160
            "#,
        )?;

        let config = Config::load(&cli(&[])).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.logger_name, "Shop");
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert!(!config.console.enabled);
        assert_eq!(config.console.threshold, Severity::Warning);
        assert_eq!(config.file.path, PathBuf::from("/var/log/shop.log"));
        assert_eq!(config.file.threshold, Severity::Error);

        let sms = config.sms.unwrap();
        assert_eq!(sms.api_key, "live_key");
        assert_eq!(sms.originator, "ShopOps");
        assert_eq!(sms.recipients, vec!["31612345678", "31687654321"]);
        assert_eq!(sms.threshold, Severity::Critical);
        assert_eq!(sms.timeout_ms, 2500);
        assert_eq!(sms.max_body_chars, 160);
        assert_eq!(sms.endpoint, "https://rest.messagebird.com");
        Ok(())
    });
}

#[test]
fn test_messagebird_env_enables_sms_with_raw_values() {
    Jail::expect_with(|jail| {
        jail.set_env("MESSAGEBIRD_API_KEY", "env_key");
        jail.set_env("MESSAGEBIRD_ORIGINATOR", "31600000000");
        jail.set_env("MESSAGEBIRD_RECIPIENTS", "+31612345678, 0612345678");

        let config = Config::load(&cli(&[])).unwrap();

        let sms = config.sms.expect("sms section should be present");
        assert_eq!(sms.api_key, "env_key");
        assert_eq!(sms.originator, "31600000000");
        assert_eq!(sms.recipients, vec!["+31612345678", "0612345678"]);
        assert_eq!(sms.threshold, Severity::Error);
        Ok(())
    });
}

#[test]
fn test_alertline_sms_env_keeps_numeric_values_as_strings() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("MESSAGEBIRD_ORIGINATOR", "Ops");
        jail.set_env("ALERTLINE_SMS__API_KEY", "1234567890");
        jail.set_env("ALERTLINE_SMS__ORIGINATOR", "31600000000");
        jail.set_env("ALERTLINE_SMS__RECIPIENTS", "31612345678");
        jail.set_env("ALERTLINE_SMS__THRESHOLD", "critical");
        jail.set_env("ALERTLINE_SMS__TIMEOUT_MS", "2500");

        let config = Config::load(&cli(&[])).unwrap();

        let sms = config.sms.expect("sms section should be present");
        assert_eq!(sms.api_key, "1234567890");
        assert_eq!(sms.originator, "31600000000");
        assert_eq!(sms.recipients, vec!["31612345678"]);
        assert_eq!(sms.threshold, Severity::Critical);
        assert_eq!(sms.timeout_ms, 2500);
        Ok(())
    });
}

#[test]
fn test_env_overrides_file_and_cli_overrides_env() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
                log_level = "warn"
                [server]
                listen_addr = "127.0.0.1:7000"
                [file]
                enabled = true
                path = "from-file.log"
                threshold = "info"
                [sms]
                api_key = "file_key"
                originator = "FileOps"
                recipients = "111,222"
            "#,
        )?;
        jail.set_env("MESSAGEBIRD_API_KEY", "env_key");
        jail.set_env("ALERTLINE_FILE__THRESHOLD", "warning");
        jail.set_env("ALERTLINE_LOG_LEVEL", "debug");
        jail.set_env("ALERTLINE_SERVER__LISTEN_ADDR", "127.0.0.1:7001");

        let config = Config::load(&cli(&[
            "--config",
            "custom.toml",
            "--listen",
            "127.0.0.1:7002",
            "--log-file",
            "from-cli.log",
        ]))
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.file.threshold, Severity::Warning);
        assert_eq!(config.file.path, PathBuf::from("from-cli.log"));
        assert_eq!(config.server.listen_addr, "127.0.0.1:7002");

        let sms = config.sms.unwrap();
        assert_eq!(sms.api_key, "env_key");
        assert_eq!(sms.originator, "FileOps");
        assert_eq!(sms.recipients, vec!["111", "222"]);
        Ok(())
    });
}

#[test]
fn test_no_sms_flag_disables_channel() {
    Jail::expect_with(|jail| {
        jail.set_env("MESSAGEBIRD_API_KEY", "env_key");
        let config = Config::load(&cli(&["--no-sms"])).unwrap();
        assert!(config.sms.is_none());
        Ok(())
    });
}

#[test]
fn test_invalid_threshold_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "alertline.toml",
            r#"
                [console]
                threshold = "loud"
            "#,
        )?;
        let result = Config::load(&cli(&[]));
        assert!(result.is_err());
        Ok(())
    });
}

#[test]
fn test_non_existent_config_file() {
    let config_result = Config::load(&cli(&["--config", "/path/to/non/existent/alertline.toml"]));
    assert!(config_result.is_err());
    let error_string = config_result.unwrap_err().to_string();
    assert!(error_string.contains("Config file not found at specified path"));
}

fn config_without_streams(sms: SmsConfig) -> Config {
    let mut config = Config::default();
    config.console.enabled = false;
    config.file.enabled = false;
    config.sms = Some(sms);
    config
}

fn sms_config(recipients: Vec<String>) -> SmsConfig {
    serde_json::from_value(serde_json::json!({
        "api_key": "key",
        "originator": "Ops",
        "recipients": recipients,
    }))
    .unwrap()
}

#[tokio::test]
async fn test_incomplete_sms_config_fails_startup() {
    let config = config_without_streams(sms_config(vec![]));

    let err = match build_dispatcher(&config).await {
        Ok(_) => panic!("expected a configuration error"),
        Err(e) => e,
    };

    assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::NoRecipients)));
}

#[tokio::test]
async fn test_complete_config_registers_every_enabled_channel() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_without_streams(sms_config(vec!["31612345678".to_string()]));
    config.console.enabled = true;
    config.file.enabled = true;
    config.file.path = dir.path().join("app.log");

    let dispatcher = build_dispatcher(&config).await.unwrap();

    let thresholds: Vec<Severity> = dispatcher
        .registrations()
        .iter()
        .map(|r| r.threshold())
        .collect();
    assert_eq!(thresholds, vec![Severity::Debug, Severity::Info, Severity::Error]);
    assert!(config.file.path.exists());
}
