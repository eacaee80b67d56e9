//! Error types for the policy synchronization daemon.

use thiserror::Error;

use fabsync_store::StoreError;
use fabsync_types::EventError;

use crate::ConfigError;

/// Result type alias for daemon operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while reconciling the event stream.
///
/// Controller-call failures are deliberately absent: the local store is the
/// source of truth and a failed controller push is logged and recorded in the
/// drift ledger rather than propagated.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Message could not be classified (unknown type/status, bad shape).
    /// The message is dropped; the loop continues.
    #[error("classification error: {0}")]
    Classify(#[from] EventError),

    /// Local state store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Event stream transport failure while polling.
    #[error("stream error: {0}")]
    Stream(#[from] redis::RedisError),

    /// Stream or store connection could not be established at startup.
    /// Fatal: the consumer loop signals shutdown without processing anything.
    #[error("dependency startup failure: {0}")]
    Startup(String),

    /// The configuration record failed validation at process init.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
