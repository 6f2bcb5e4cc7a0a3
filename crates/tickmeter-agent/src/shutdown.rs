//! Shutdown signal shared by the agent's background tasks.

use tokio::sync::watch;

/// Resolves once the flag turns true or the sender is gone.
pub async fn requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
