//! Ctrl+C handling for the up command

use hubdev_core::ConfigMutator;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Exit status after an interrupt (128 + SIGINT)
pub const INTERRUPT_EXIT_CODE: i32 = 130;

/// Restore `server_config` and exit when Ctrl+C arrives.
///
/// Abort the returned handle once the pipeline has finished on its own.
pub fn restore_on_interrupt(server_config: Arc<ConfigMutator>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if restore_on(tokio::signal::ctrl_c(), &server_config).await {
            std::process::exit(INTERRUPT_EXIT_CODE);
        }
    })
}

/// Wait for `signal`, then restore `server_config`. Returns false when the
/// signal could not be listened for, in which case nothing is restored.
pub async fn restore_on<S>(signal: S, server_config: &ConfigMutator) -> bool
where
    S: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("Failed to listen for ctrl_c: {}", e);
        return false;
    }
    tracing::info!("Received Ctrl+C, cleaning up");

    match server_config.restore().await {
        Ok(true) => tracing::info!("Restored {}", server_config.path().display()),
        Ok(false) => {}
        Err(e) => tracing::error!(
            "Failed to restore {}: {}",
            server_config.path().display(),
            e
        ),
    }
    true
}
