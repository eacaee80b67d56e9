//! Event stream consumption.
//!
//! The loop is transport-agnostic behind [`EventStream`]; the shipped
//! implementation polls batches off a Redis list (the configured topic key)
//! in arrival order.

use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use crate::{Result, StreamConfig, SyncError};

/// Wait between empty poll cycles.
const POLL_IDLE_WAIT: Duration = Duration::from_millis(500);

/// A source of raw change-event messages, delivered in arrival order.
#[async_trait]
pub trait EventStream: Send {
    /// Pulls the next batch. An empty batch means no messages were
    /// available this cycle.
    async fn poll(&mut self) -> Result<Vec<String>>;
}

/// `EventStream` over a Redis list key.
pub struct RedisEventStream {
    conn: ConnectionManager,
    topic: String,
    batch_size: usize,
}

impl RedisEventStream {
    /// Connects to the stream endpoint. Failure here is a dependency
    /// startup failure and fatal for the daemon.
    pub async fn connect(config: &StreamConfig) -> Result<Self> {
        let uri = format!("redis://{}:{}/", config.host, config.port);
        let client = redis::Client::open(uri.clone())
            .map_err(|e| SyncError::Startup(format!("stream {}: {}", uri, e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| SyncError::Startup(format!("stream {}: {}", uri, e)))?;

        debug!(%uri, topic = %config.topic, "Connected to event stream");
        Ok(Self {
            conn,
            topic: config.topic.clone(),
            batch_size: config.batch_size.max(1),
        })
    }
}

#[async_trait]
impl EventStream for RedisEventStream {
    async fn poll(&mut self) -> Result<Vec<String>> {
        let count = NonZeroUsize::new(self.batch_size);
        let batch: Vec<String> = self.conn.lpop(&self.topic, count).await?;

        if batch.is_empty() {
            // Nothing pending; the poll cycle is the only place the loop
            // blocks, so pace it here.
            tokio::time::sleep(POLL_IDLE_WAIT).await;
        }
        Ok(batch)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use super::EventStream;
    use crate::Result;

    /// In-memory stream feeding pre-seeded batches, then empties forever.
    pub struct VecEventStream {
        batches: VecDeque<Vec<String>>,
    }

    impl VecEventStream {
        pub fn new(batches: Vec<Vec<String>>) -> Self {
            Self {
                batches: batches.into(),
            }
        }
    }

    #[async_trait]
    impl EventStream for VecEventStream {
        async fn poll(&mut self) -> Result<Vec<String>> {
            Ok(self.batches.pop_front().unwrap_or_default())
        }
    }
}
