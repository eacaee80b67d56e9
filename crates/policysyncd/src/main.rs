//! policysyncd - policy synchronization daemon entry point.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use fabsync_apic::SharedController;
use fabsync_store::RedisStore;
use policysyncd::{
    run_consumer, run_session_keeper, PolicySync, RedisEventStream, Shutdown, SyncConfig,
};

/// Initializes tracing/logging subsystem
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("--- Starting policysyncd ---");

    let config = SyncConfig::from_env().context("reading configuration")?;
    let shutdown = Shutdown::new();

    // SIGINT/SIGTERM flips the shared shutdown signal.
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
                shutdown.signal();
            }
        });
    }

    // Client construction (including login) goes through the shared guard;
    // whichever task gets there first constructs, the other reuses.
    let controller = Arc::new(SharedController::new(config.controller.clone()));

    let keeper = {
        let controller = Arc::clone(&controller);
        let shutdown = shutdown.clone();
        let interval = config.session_refresh;
        tokio::spawn(async move {
            let client = match controller.get().await {
                Ok(client) => client,
                Err(e) => {
                    error!(error = %e, "Unable to log into the fabric controller");
                    shutdown.signal();
                    return;
                }
            };
            run_session_keeper(client, interval, shutdown).await;
        })
    };

    let result = run(&config, &controller, &shutdown).await;

    // Either the loop observed shutdown or startup failed; both end the
    // session keeper too.
    shutdown.signal();
    let _ = keeper.await;

    match result {
        Ok(()) => {
            info!("policysyncd exited successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "policysyncd exiting with error");
            Err(e)
        }
    }
}

/// Connects the consumer loop's dependencies and runs it. A stream or store
/// connection failure here is fatal: no messages are processed.
async fn run(
    config: &SyncConfig,
    controller: &SharedController,
    shutdown: &Shutdown,
) -> anyhow::Result<()> {
    let store = RedisStore::connect(&config.store)
        .await
        .context("connecting to state store")?;
    let stream = RedisEventStream::connect(&config.stream)
        .await
        .context("connecting to event stream")?;
    let client = controller
        .get()
        .await
        .context("logging into the fabric controller")?;

    let sync = PolicySync::new(Arc::new(store), client, config.tenant.clone());
    run_consumer(stream, &sync, shutdown).await;
    Ok(())
}
