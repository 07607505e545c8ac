//! # Configuration Tests
//!
//! Defaults, TOML loading and validation of `ServerConfig`.

use std::io::Write;
use std::time::Duration;

use dtp_core::{DtpError, ServerConfig, StatusCode, TagFraming};

#[test]
fn test_server_config_defaults() {
    let config = ServerConfig::default();

    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 9090);
    assert_eq!(config.receive_buffer_size, 4096);
    assert_eq!(config.thread_pool_size, 20);
    assert_eq!(config.max_pending_connections, 10);
    assert!(config.blocking_execution);
    assert!(config.clean_termination);
    assert_eq!(config.tag_framing, TagFraming::Fixed);
    assert_eq!(config.fixed_tag, 0);
    assert!(!config.reuse_port);
    assert_eq!(config.read_timeout_ms, 5000);
    assert_eq!(config.read_timeout(), Some(Duration::from_secs(5)));
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_toml_is_default() {
    let config = ServerConfig::from_toml_str("").unwrap();
    assert_eq!(config, ServerConfig::default());
}

#[test]
fn test_partial_toml_keeps_other_defaults() {
    let config = ServerConfig::from_toml_str(
        r#"
        port = 7000
        thread_pool_size = 5
        clean_termination = false
        tag_framing = "prefixed"
        "#,
    )
    .unwrap();

    assert_eq!(config.port, 7000);
    assert_eq!(config.thread_pool_size, 5);
    assert!(!config.clean_termination);
    assert_eq!(config.tag_framing, TagFraming::Prefixed);
    assert_eq!(config.receive_buffer_size, 4096);
    assert!(config.blocking_execution);
}

/// A zero read timeout means the dispatcher waits for the peer indefinitely.
#[test]
fn test_read_timeout_zero_disables_bound() {
    let config = ServerConfig::from_toml_str("read_timeout_ms = 0").unwrap();
    assert_eq!(config.read_timeout(), None);

    let config = ServerConfig::from_toml_str("read_timeout_ms = 250").unwrap();
    assert_eq!(config.read_timeout(), Some(Duration::from_millis(250)));
}

#[test]
fn test_unknown_key_is_rejected() {
    let err = ServerConfig::from_toml_str("prot = 1").unwrap_err();
    assert!(matches!(err, DtpError::InvalidConfiguration(_)));
    assert_eq!(err.status(), StatusCode::INVALID_CONFIGURATION);
}

#[test]
fn test_zero_sizes_are_rejected() {
    assert!(ServerConfig::from_toml_str("receive_buffer_size = 0").is_err());
    assert!(ServerConfig::from_toml_str("thread_pool_size = 0").is_err());
}

#[test]
fn test_host_must_be_an_ip() {
    let config = ServerConfig {
        host: "localhost".into(),
        ..ServerConfig::default()
    };
    assert!(matches!(config.validate(), Err(DtpError::InvalidConfiguration(_))));

    let config = ServerConfig {
        host: "::1".into(),
        port: 1234,
        ..ServerConfig::default()
    };
    assert_eq!(config.socket_addr().unwrap(), "[::1]:1234".parse().unwrap());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "host = \"127.0.0.1\"\nport = 0\nfixed_tag = 7").unwrap();

    let config = ServerConfig::load(file.path()).unwrap();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 0);
    assert_eq!(config.fixed_tag, 7);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServerConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, DtpError::InvalidConfiguration(_)));
}
