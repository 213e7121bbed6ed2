// crates/client-records-server/src/shutdown.rs
// ============================================================================
// Module: Shutdown Signal
// Description: Resolves when the process is asked to stop.
// Dependencies: tokio, tracing
// ============================================================================

use tracing::info;
use tracing::warn;

/// Waits for SIGTERM or SIGINT (Ctrl-C elsewhere).
pub async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::SignalKind;
        use tokio::signal::unix::signal;

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("received SIGTERM"),
                    _ = sigint.recv() => info!("received SIGINT"),
                }
                return;
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!(error = %err, "signal handler registration failed; falling back to ctrl-c");
            }
        }
    }
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler failed");
    }
}
