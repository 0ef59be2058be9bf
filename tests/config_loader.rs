use std::fs;

use mobilessh::config::{Config, ConfigError, TransportMode};
use tempfile::TempDir;

fn write_config(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.toml");
    fs::write(&path, content).expect("Failed to write config");
    (dir, path)
}

#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.connection.timeout_ms, 10_000);
    assert_eq!(config.connection.default_port, 22);
    assert_eq!(config.transport.mode, TransportMode::Ssh);
    assert_eq!(config.terminal.term, "xterm-256color");
    assert_eq!((config.terminal.cols, config.terminal.rows), (80, 24));
    assert_eq!(config.simulated.connect_delay_ms, 1500);
    assert_eq!(config.simulated.command_delay_ms, 500);
    assert_eq!(config.logging.filter, "info");
    assert!(config.logging.file.is_none());
}

#[test]
fn test_missing_file_returns_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.connection.timeout_ms, 10_000);
}

#[test]
fn test_full_config_parses() {
    let (_dir, path) = write_config(
        r#"
[connection]
timeout_ms = 1500
default_port = 2222

[transport]
mode = "simulated"

[terminal]
term = "vt100"
cols = 132
rows = 43

[simulated]
connect_delay_ms = 10
command_delay_ms = 0

[logging]
filter = "mobilessh=debug"
file = "/tmp/mobilessh.log"
"#,
    );

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.connection.timeout_ms, 1500);
    assert_eq!(config.connection.default_port, 2222);
    assert_eq!(config.transport.mode, TransportMode::Simulated);
    assert_eq!(config.terminal.term, "vt100");
    assert_eq!(config.terminal.cols, 132);
    assert_eq!(config.simulated.command_delay_ms, 0);
    assert_eq!(config.logging.filter, "mobilessh=debug");
    assert_eq!(
        config.logging.file.as_deref(),
        Some(std::path::Path::new("/tmp/mobilessh.log"))
    );
}

#[test]
fn test_partial_config_keeps_defaults() {
    let (_dir, path) = write_config("[connection]\ntimeout_ms = 3000\n");

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.connection.timeout_ms, 3000);
    assert_eq!(config.connection.default_port, 22);
    assert_eq!(config.transport.mode, TransportMode::Ssh);
    assert_eq!(config.simulated.connect_delay_ms, 1500);
}

#[test]
fn test_parse_error_reports_path() {
    let (_dir, path) = write_config("[connection\ntimeout_ms = ");

    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn test_unknown_transport_mode_is_rejected() {
    let (_dir, path) = write_config("[transport]\nmode = \"telnet\"\n");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn test_zero_timeout_fails_validation() {
    let (_dir, path) = write_config("[connection]\ntimeout_ms = 0\n");

    let err = Config::load_from(&path).unwrap_err();
    match err {
        ConfigError::ValidationError { message } => assert!(message.contains("timeout_ms")),
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_empty_terminal_size_fails_validation() {
    let (_dir, path) = write_config("[terminal]\ncols = 0\n");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn test_config_path_ends_with_app_dir() {
    let path = Config::config_path();
    assert!(path.ends_with("mobilessh/config.toml"));
}
