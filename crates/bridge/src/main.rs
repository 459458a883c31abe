mod admission;
mod cli;
mod config;
mod error;
mod logging;
mod request;
mod runner;
mod server;
#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use system_utils::privilege::{PrivilegeProbe, ProcessIdentity};
use tokio::net::TcpListener;
use tracing::info;

use crate::cli::Args;
use crate::config::BridgeConfig;
use crate::logging::init_tracing;
use crate::runner::{ensure_workdir, Runner};
use crate::server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref(), args.log_to_stderr)?;

    let config = BridgeConfig::resolve(&args, |key| std::env::var(key).ok())
        .context("failed to resolve configuration")?;
    let identity = ProcessIdentity;
    info!(
        host = %config.host,
        port = config.port,
        command = ?config.command,
        workdir = %config.workdir.display(),
        model = ?config.model,
        privileged = identity.is_privileged(),
        max_timeout_ms = config.max_timeout_ms,
        kill_grace = ?config.kill_grace,
        max_concurrent = ?config.max_concurrent,
        "ask-bridge starting"
    );

    ensure_workdir(&config.workdir);
    let runner = Arc::new(Runner::new(&config, Arc::new(identity)));
    let app = build_router(AppState::new(runner, &config), config.body_limit_bytes);

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    info!(addr = %listener.local_addr()?, "ask-bridge listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;
    info!("ask-bridge stopped");
    Ok(())
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received, draining in-flight requests");
}
