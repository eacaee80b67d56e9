//! The consumer loop: pulls batches off the event stream and reconciles
//! every message strictly in arrival order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use fabsync_apic::FabricController;
use fabsync_store::StateStore;

use crate::{EventStream, PolicySync};

/// Pause after a failed poll before trying again.
const POLL_ERROR_WAIT: Duration = Duration::from_millis(500);

/// Shared graceful-shutdown signal, checked between messages and between
/// poll cycles.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs the consumer loop until the shutdown signal is observed.
///
/// Every message in a polled batch is processed before the next poll; the
/// in-order, one-at-a-time discipline is what the handlers' set-diff logic
/// relies on. There are no retries: a message gets exactly one attempt and
/// redelivery is the stream's concern.
pub async fn run_consumer<S, C, E>(mut stream: E, sync: &PolicySync<S, C>, shutdown: &Shutdown)
where
    S: StateStore,
    C: FabricController,
    E: EventStream,
{
    info!("Waiting for messages from the event stream");

    while !shutdown.is_set() {
        let batch = match stream.poll().await {
            Ok(batch) => batch,
            Err(e) => {
                error!(error = %e, "Stream poll failed");
                tokio::time::sleep(POLL_ERROR_WAIT).await;
                continue;
            }
        };

        for raw in batch {
            sync.process_raw(&raw).await;
            if shutdown.is_set() {
                break;
            }
        }
    }

    info!("Consumer loop exited");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::stream::testing::VecEventStream;
    use fabsync_store::{MemoryStore, StateStore};

    use async_trait::async_trait;
    use fabsync_apic::{FabricResult, FilterBinding, LifecycleStatus};
    use fabsync_types::{ContractAction, ContractRole, FilterRecord};

    struct NullFabric;

    #[async_trait]
    impl fabsync_apic::FabricController for NullFabric {
        async fn push_epg(&self, _: &str, _: LifecycleStatus) -> FabricResult<()> {
            Ok(())
        }
        async fn push_filter(&self, _: &FilterRecord, _: LifecycleStatus) -> FabricResult<()> {
            Ok(())
        }
        async fn push_contract(
            &self,
            _: &str,
            _: Option<&FilterBinding>,
            _: LifecycleStatus,
        ) -> FabricResult<()> {
            Ok(())
        }
        async fn replace_contract_filter(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: ContractAction,
        ) -> FabricResult<()> {
            Ok(())
        }
        async fn attach_contract(
            &self,
            _: ContractRole,
            _: &str,
            _: &str,
            _: LifecycleStatus,
        ) -> FabricResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_shutdown_flag() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_set());
        shutdown.signal();
        assert!(shutdown.is_set());

        // Clones observe the same signal.
        let clone = shutdown.clone();
        assert!(clone.is_set());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_loop_drains_batches_then_exits_on_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let sync = PolicySync::new(Arc::clone(&store), Arc::new(NullFabric), "prod");

        let stream = VecEventStream::new(vec![
            vec![
                r#"{"uuid":"ep1","status":"create","msg_type":"ep","name":"web-01"}"#.to_string(),
                r#"{"uuid":"ep2","status":"create","msg_type":"ep","name":"web-02"}"#.to_string(),
            ],
            vec![],
        ]);

        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        // Stop the loop once it reaches the empty batch.
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.signal();
        });

        run_consumer(stream, &sync, &shutdown).await;

        assert!(store.get_endpoint("ep1").await.unwrap().is_some());
        assert!(store.get_endpoint("ep2").await.unwrap().is_some());
    }
}
