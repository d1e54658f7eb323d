use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use executor::Orchestrator;
use language::Registry;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config;
use crate::error::{ServerError, ServerResult};
use crate::http::{AppState, create_router};

#[derive(Args)]
pub struct ServeArgs {
    /// Path to coderun.yaml config file
    #[arg(long, short, env = "CODERUN_CONFIG")]
    config: Option<PathBuf>,
    /// Address to bind (overrides config)
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (overrides config)
    #[arg(long, short)]
    port: Option<u16>,
}

/// Load config, prepare the work directory and serve until SIGINT/SIGTERM.
pub async fn run_serve(args: ServeArgs) -> ServerResult<()> {
    let mut app_config = config::load_or_default(args.config.as_deref()).await?;
    if let Some(host) = args.host {
        app_config.server.host = host;
    }
    if let Some(port) = args.port {
        app_config.server.port = port;
    }
    app_config.validate()?;

    let orchestrator = Orchestrator::new(
        Arc::new(Registry::builtin()),
        app_config.execution.executor_config(),
    );
    orchestrator.startup().await?;

    let state = AppState::new(Arc::new(orchestrator));
    for language in state.languages.iter().filter(|l| !l.available) {
        warn!(
            language = language.id,
            missing = ?language.missing,
            "toolchain not found, requests for this language will fail"
        );
    }

    let app = create_router(Arc::new(state));

    let addr = app_config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ServerError::Config(format!("bind {addr}: {e}")))?;
    info!(
        addr = %addr,
        work_dir = %app_config.execution.work_dir.display(),
        build_timeout_ms = app_config.execution.build_timeout_ms,
        run_timeout_ms = app_config.execution.run_timeout_ms,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Resolves on the first SIGINT or SIGTERM. In-flight requests finish first.
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).ok();
    let mut sigint = signal(SignalKind::interrupt()).ok();

    tokio::select! {
        _ = recv_signal(&mut sigterm) => info!("received SIGTERM, shutting down"),
        _ = recv_signal(&mut sigint) => info!("received SIGINT, shutting down"),
    }
}

async fn recv_signal(sig: &mut Option<tokio::signal::unix::Signal>) {
    match sig {
        Some(s) => {
            s.recv().await;
        }
        None => std::future::pending().await,
    }
}
