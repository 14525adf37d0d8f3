//! OS signal handling.
//!
//! SIGINT (Ctrl-C) cancels the running command's scope so in-flight requests
//! and the confirmation poll stop promptly.

use tokio::task::JoinHandle;

use crate::lifecycle::cancel::Cancellation;

/// Spawn a task that cancels `scope` on the first Ctrl-C.
pub fn cancel_on_ctrl_c(scope: Cancellation) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, cancelling");
                scope.cancel();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unable to listen for interrupt signal");
            }
        }
    })
}
