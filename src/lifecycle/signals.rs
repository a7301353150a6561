//! OS signal handling.

/// Wait for Ctrl+C. A failure to install the handler is logged and treated as a signal.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
    }
    tracing::info!("Shutdown signal received");
}
