//! ClawSec policy daemon.
//!
//! - Unix socket endpoint (default /tmp/clawsec_filter.sock)
//! - One JSON-RPC request per connection, inspected before it reaches the
//!   downstream service
//! - Per-agent risk scoring with permanent isolation
//! - Graceful drain on SIGINT/SIGTERM

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use clawsec_daemon::{app_state::AppState, config, PolicyDaemon};

#[derive(Debug, Parser)]
#[command(name = "clawsec-daemon", about = "Zero-trust IPC policy enforcement daemon")]
struct Cli {
    /// YAML config file; defaults apply when it does not exist.
    #[arg(long, default_value = "clawsec.yaml")]
    config: PathBuf,

    /// Override `daemon.socket_path`.
    #[arg(long)]
    socket: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut cfg = match config::load_or_default(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, path = %cli.config.display(), "config load failed");
            return ExitCode::FAILURE;
        }
    };
    if let Some(socket) = cli.socket {
        cfg.daemon.socket_path = socket;
    }
    if let Err(e) = cfg.validate() {
        tracing::error!(error = %e, "invalid config");
        return ExitCode::FAILURE;
    }

    let state = match AppState::new(cfg) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    let daemon = Arc::new(PolicyDaemon::new(state));
    match daemon.run(shutdown_signal()).await {
        Ok(()) => {
            tracing::info!("clawsec monitor stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "daemon failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
