use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionDefaults,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub simulated: SimulatedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied to every connection attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDefaults {
    /// Connect + authenticate + open-shell budget in milliseconds (default: 10000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Port used when the form leaves it blank (default: 22).
    #[serde(default = "default_port")]
    pub default_port: u16,
}

/// Which transport backs new sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Real SSH connection.
    #[default]
    Ssh,
    /// Local simulation with canned command output.
    Simulated,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub mode: TransportMode,
}

/// Remote PTY parameters requested when opening the shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default = "default_term")]
    pub term: String,
    #[serde(default = "default_cols")]
    pub cols: u16,
    #[serde(default = "default_rows")]
    pub rows: u16,
}

/// Latencies used by the simulated transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedConfig {
    /// Fake connect latency in milliseconds (default: 1500).
    #[serde(default = "default_connect_delay_ms")]
    pub connect_delay_ms: u64,
    /// Fake per-command latency in milliseconds (default: 500).
    #[serde(default = "default_command_delay_ms")]
    pub command_delay_ms: u64,
}

/// Tracing output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Write logs to this file instead of stderr.
    #[serde(default)]
    pub file: Option<std::path::PathBuf>,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_port() -> u16 {
    22
}

fn default_term() -> String {
    "xterm-256color".to_string()
}

fn default_cols() -> u16 {
    80
}

fn default_rows() -> u16 {
    24
}

fn default_connect_delay_ms() -> u64 {
    1500
}

fn default_command_delay_ms() -> u64 {
    500
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            default_port: default_port(),
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            term: default_term(),
            cols: default_cols(),
            rows: default_rows(),
        }
    }
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            connect_delay_ms: default_connect_delay_ms(),
            command_delay_ms: default_command_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: None,
        }
    }
}
