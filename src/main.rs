use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use mobilessh::config::{Config, ConnectionConfig, ConnectionForm, SecureString, TransportMode};
use mobilessh::lifecycle::{LifecycleCoordinator, OwnerSignal};
use mobilessh::logging;
use mobilessh::session::ConnectionManager;
use mobilessh::transport::{SimulatedTransport, Transport};
use mobilessh::ConnectError;

/// How long to wait for the shell to be released after Ctrl-C.
const RELEASE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(name = "mobilessh", version, about = "Interactive remote shell over SSH")]
struct Cli {
    /// Config file (default: <config_dir>/mobilessh/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Use the simulated transport instead of SSH
    #[arg(long)]
    simulate: bool,

    /// Connect timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[arg(long)]
    host: String,

    /// Port (default: connection.default_port from the config)
    #[arg(long)]
    port: Option<String>,

    #[arg(long)]
    user: String,

    /// Environment variable holding the password; stdin is read if unset
    #[arg(long, default_value = "MOBILESSH_PASSWORD")]
    password_env: String,
}

type StdinLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    match cli.verbose {
        0 => {}
        1 => config.logging.filter = "debug".to_string(),
        _ => config.logging.filter = "trace".to_string(),
    }
    logging::init_tracing(&config.logging)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let password = match std::env::var(&cli.password_env) {
        Ok(password) if !password.is_empty() => password,
        _ => {
            eprint!("Password: ");
            lines
                .next_line()
                .await
                .context("Failed to read password from stdin")?
                .unwrap_or_default()
        }
    };

    let form = ConnectionForm {
        host: cli.host.clone(),
        port: cli
            .port
            .clone()
            .unwrap_or_else(|| config.connection.default_port.to_string()),
        username: cli.user.clone(),
        password: SecureString::new(password),
    };
    let connection = form.validate()?;
    let timeout = Duration::from_millis(cli.timeout_ms.unwrap_or(config.connection.timeout_ms));

    if cli.simulate || config.transport.mode == TransportMode::Simulated {
        let transport = SimulatedTransport::from_config(&config.simulated);
        return run(Arc::new(transport), timeout, connection, lines).await;
    }
    run_ssh(&config, timeout, connection, lines).await
}

#[cfg(feature = "ssh")]
async fn run_ssh(
    config: &Config,
    timeout: Duration,
    connection: ConnectionConfig,
    lines: StdinLines,
) -> anyhow::Result<ExitCode> {
    let transport = mobilessh::transport::SshTransport::new(&config.terminal);
    run(Arc::new(transport), timeout, connection, lines).await
}

#[cfg(not(feature = "ssh"))]
async fn run_ssh(
    _config: &Config,
    _timeout: Duration,
    _connection: ConnectionConfig,
    _lines: StdinLines,
) -> anyhow::Result<ExitCode> {
    bail!("built without the `ssh` feature; use --simulate")
}

async fn run<T: Transport>(
    transport: Arc<T>,
    timeout: Duration,
    connection: ConnectionConfig,
    mut lines: StdinLines,
) -> anyhow::Result<ExitCode> {
    let signal = OwnerSignal::new();
    let coordinator = LifecycleCoordinator::new(signal.clone());
    let manager = ConnectionManager::new(transport, timeout);

    tokio::spawn({
        let signal = signal.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal.signal();
            }
        }
    });

    eprintln!("Connecting to {}...", connection.target());
    let session = match coordinator.connect(&manager, connection).await {
        Ok(session) => session,
        Err(ConnectError::Failed(kind)) => {
            eprintln!("{}", kind.user_message());
            return Ok(ExitCode::FAILURE);
        }
        Err(ConnectError::Cancelled) => return Ok(ExitCode::from(130)),
        Err(err) => bail!(err),
    };

    session.on_output(|chunk| {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(chunk);
        let _ = stdout.flush();
    });

    let mut stdin_open = true;
    loop {
        tokio::select! {
            reason = session.ended() => {
                eprintln!("\n{}", reason.user_message());
                return Ok(if reason.is_normal() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                });
            }
            _ = signal.wait() => {
                let _ = tokio::time::timeout(RELEASE_GRACE, session.ended()).await;
                eprintln!("\nInterrupted.");
                return Ok(ExitCode::from(130));
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if let Err(err) = session.send(&line) {
                        eprintln!("{}", err);
                    }
                }
                None => {
                    stdin_open = false;
                    coordinator.disconnect().await;
                }
            },
        }
    }
}
