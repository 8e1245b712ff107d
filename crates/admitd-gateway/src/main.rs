//! admitd gateway binary.
//!
//! - Admission endpoint: POST /validate
//! - Ops endpoints: /health (store), /status, /readyz, /metrics
//! - Graceful shutdown on SIGINT/SIGTERM, bounded by gateway.shutdown_grace_ms

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::sync::oneshot;
use tracing_subscriber::{fmt, EnvFilter};

use admitd_core::error::{AdmitError, Result};
use admitd_gateway::{app_state::AppState, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "admitd-gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = config::config_path();
    let mut cfg = config::load_from_file(&path)?;
    cfg.apply_port_override(std::env::var("PORT").ok())?;

    let listen: SocketAddr = cfg.gateway.listen.parse().map_err(|_| {
        AdmitError::BadRequest(format!(
            "gateway.listen must be a valid SocketAddr: {}",
            cfg.gateway.listen
        ))
    })?;
    let grace = cfg.gateway.shutdown_grace();

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| AdmitError::Internal(format!("failed to bind {listen}: {e}")))?;
    tracing::info!(%listen, config = %path, version = env!("CARGO_PKG_VERSION"), "admitd-gateway starting");

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let drain_state = state.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        drain_state.set_draining();
        tracing::info!("shutdown signal received; draining");
        let _ = signalled_tx.send(());
    })
    .into_future();

    let grace_elapsed = async move {
        if signalled_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        res = server => {
            res.map_err(|e| AdmitError::Internal(format!("server failed: {e}")))?;
            tracing::info!("admitd-gateway exited");
        }
        _ = grace_elapsed => {
            tracing::warn!(?grace, "shutdown grace period elapsed; closing remaining connections");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
}
