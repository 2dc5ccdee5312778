//! Vigil Agent Daemon
//!
//! The agent runs on monitored hosts and keeps one outbound WebSocket
//! connection to the controller, answering control requests and reporting
//! host metrics on a timer.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil_agent::conn::Supervisor;
use vigil_agent::metrics::MetricsProvider;
use vigil_agent::AgentState;
use vigil_core::config::{self, AgentConfig};
use vigil_core::{CredentialStore, Credentials};

#[derive(Parser)]
#[command(name = "vigil-agent")]
#[command(about = "Vigil agent - connects a host to its monitoring controller")]
#[command(version)]
struct Args {
    /// Controller WebSocket endpoint
    /// Example: ws://controller.example.com:8080/ws
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Pairing key issued by the controller
    #[arg(short, long)]
    key: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the credential lock file (defaults to the platform data dir)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Mirror logs into daily files under this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config::default_config_dir().join("agent.toml"));

    let mut load_warning = None;
    let mut config = if config_path.exists() {
        match config::load_config(&config_path) {
            Ok(config) => config,
            Err(e) => {
                load_warning =
                    Some(format!("Failed to load config from {:?}: {}", config_path, e));
                AgentConfig::default()
            }
        }
    } else {
        AgentConfig::default()
    };

    // Apply command-line overrides
    if let Some(state_dir) = args.state_dir {
        config.state_dir = state_dir;
    }
    if let Some(log_dir) = args.log_dir {
        config.log_dir = Some(log_dir);
    }

    // Initialize logging
    let _guard = init_logging(&args.log_level, config.log_dir.as_deref());
    if let Some(warning) = load_warning {
        tracing::warn!("{}", warning);
    }

    tracing::info!("Vigil agent v{} starting", env!("CARGO_PKG_VERSION"));

    // Resolve credentials: lock file first, then flags, then a prompt
    let store = CredentialStore::new(&config.state_dir);
    let credentials = resolve_credentials(&store, args.endpoint, args.key)?;
    tracing::info!("Controller endpoint: {}", credentials.endpoint);

    let metrics = MetricsProvider::new();
    if let Some(ip) = metrics.local_ipv4() {
        tracing::info!("Local address: {}", ip);
    }

    let state = Arc::new(AgentState::new(config, credentials, store, metrics));

    Supervisor::new(state).run().await.context("Agent stopped")?;
    Ok(())
}

/// Set up the tracing subscriber, optionally mirroring into daily log files.
///
/// The returned guard must stay alive for the file writer to flush.
fn init_logging(log_level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
    );
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "vigil-agent.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

/// Resolve the controller endpoint and pairing key.
///
/// A saved lock file wins; without one, command-line flags fill in and
/// anything still missing is prompted for on stdin. An unreadable lock file
/// is fatal: the operator must delete it to re-run setup.
fn resolve_credentials(
    store: &CredentialStore,
    endpoint: Option<String>,
    key: Option<String>,
) -> Result<Credentials> {
    match store.load() {
        Ok(Some(credentials)) => {
            tracing::info!("Using saved credentials from {:?}", store.path());
            return Ok(credentials);
        }
        Ok(None) => {}
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "Failed to read saved credentials from {:?} (delete the file to re-pair)",
                    store.path()
                )
            });
        }
    }

    let endpoint = match endpoint {
        Some(endpoint) => endpoint,
        None => prompt("Controller WebSocket endpoint")?,
    };
    let key = match key {
        Some(key) => key,
        None => prompt("Pairing key")?,
    };

    Ok(Credentials { endpoint, key })
}

/// Read one value from stdin for first-run setup.
fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;

    let value = line.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("No value entered for {}", label);
    }
    Ok(value)
}
