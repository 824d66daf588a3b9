use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Resolve once SIGTERM or SIGINT arrives
///
/// Background jobs still in flight are not awaited; whatever they have not
/// written by then is lost.
#[cfg(unix)]
pub async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGTERM handler: {}", e);
            return ctrl_c().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("SIGTERM received, initiating graceful shutdown");
        }
        _ = ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() {
    ctrl_c().await;
    info!("Ctrl-C received, initiating graceful shutdown");
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
