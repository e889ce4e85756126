use tokio::signal;
use tokio::sync::watch;

/// Resolves on the first Ctrl+C or SIGTERM. Used to stop `batch watch` and
/// `batch run` between polls; the batch itself keeps grading server-side.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown requested; stopping batch polling");
}

/// Spawns a task that flips the returned receiver on Ctrl+C or SIGTERM.
pub(crate) fn shutdown_receiver() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        if tx.send(true).is_err() {
            tracing::debug!("No pollers left to notify about shutdown");
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receiver_starts_not_cancelled() {
        let rx = shutdown_receiver();
        assert!(!*rx.borrow());
    }
}
