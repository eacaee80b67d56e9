//! Session keeper: refreshes the fabric controller session on a fixed
//! interval, independent of the consumer loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use fabsync_apic::ApicClient;

use crate::Shutdown;

/// Granularity of the shutdown check while waiting out an interval.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Keeps the controller session alive until shutdown.
///
/// Login already happened when the shared handle was constructed, so the
/// first wait covers a full validity window; after that the session is
/// refreshed every interval. On shutdown the session is logged out and the
/// handle released.
pub async fn run_session_keeper(client: Arc<ApicClient>, interval: Duration, shutdown: Shutdown) {
    while !wait_or_shutdown(&shutdown, interval).await {
        if let Err(e) = client.refresh().await {
            warn!(error = %e, "Session refresh failed");
        }
    }

    if let Err(e) = client.logout().await {
        warn!(error = %e, "Controller logout failed");
    }
    info!("Session keeper exited");
}

/// Waits out `duration`, returning early with `true` when the shutdown
/// signal is observed.
async fn wait_or_shutdown(shutdown: &Shutdown, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        if shutdown.is_set() {
            return true;
        }
        tokio::time::sleep(SHUTDOWN_POLL.min(duration)).await;
    }
    shutdown.is_set()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_runs_to_deadline_without_signal() {
        let shutdown = Shutdown::new();
        let interrupted = wait_or_shutdown(&shutdown, Duration::from_millis(10)).await;
        assert!(!interrupted);
    }

    #[tokio::test]
    async fn test_wait_observes_shutdown_early() {
        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.signal();
        });

        let start = Instant::now();
        let interrupted = wait_or_shutdown(&shutdown, Duration::from_secs(30)).await;
        assert!(interrupted);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
