//! Serve command - HTTP page that starts the scanning keyboard.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use blinkboard_adapters::{router, ProcessLauncher};
use clap::Args;
use tracing::info;

use crate::config::AppConfig;

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Arguments for the serve command
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (default 127.0.0.1:5000)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,
}

/// Resolves the listen address: CLI, then config, then the default.
fn bind_addr(args: &ServeArgs, config: &AppConfig) -> Result<SocketAddr> {
    if let Some(addr) = args.bind {
        return Ok(addr);
    }
    let raw = config.server.bind.as_deref().unwrap_or(DEFAULT_BIND);
    raw.parse()
        .with_context(|| format!("Invalid bind address '{raw}'"))
}

/// Run the launcher server until the process is killed.
pub fn run(args: &ServeArgs, config: &AppConfig) -> Result<()> {
    let addr = bind_addr(args, config)?;
    let exe = std::env::current_exe().context("Failed to locate the blinkboard executable")?;
    let launcher = Arc::new(ProcessLauncher::new(exe, vec!["run".to_string()]));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!("Launcher listening on http://{addr}");
        axum::serve(listener, router(launcher))
            .await
            .context("Launcher server failed")
    })
}
