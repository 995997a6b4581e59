use std::future::Future;
use std::io;
use tracing::{info, warn};

/// Resolves on Ctrl-C or SIGTERM. A handler that cannot be installed never
/// fires instead of triggering shutdown.
pub async fn signal() {
    let ctrl_c = wait_or_park("ctrl-c", tokio::signal::ctrl_c());

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

/// Waits for `listener`; on error logs it and parks forever.
pub async fn wait_or_park<F>(name: &str, listener: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = listener.await {
        warn!(signal = name, error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await
    }
}
