//! # Shutdown Signal
//!
//! Shutdown is requested by sending `true` on a `tokio::sync::watch` channel.
//! Every long-running task holds a receiver and races its work against
//! [`wait_for_shutdown`].

use tokio::sync::watch;

/// Resolve once `shutdown` reads `true`
///
/// If every sender is dropped without signalling, shutdown can no longer be
/// requested and this never resolves.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
