//! policysyncd - policy synchronization daemon
//!
//! Consumes an ordered stream of network-topology change events (endpoint,
//! endpoint-group, and contract lifecycle messages) and reconciles them into
//! the durable local state store and the declarative fabric controller.
//! Imperative create/update/delete events become idempotent, minimal-diff
//! controller calls; out-of-order delivery is tolerated and logged.

mod config;
mod consumer;
mod drift;
mod error;
mod session;
mod stream;
mod sync;

pub use config::{ConfigError, StreamConfig, SyncConfig};
pub use consumer::{run_consumer, Shutdown};
pub use drift::{DriftEntry, DriftLedger};
pub use error::{Result, SyncError};
pub use session::run_session_keeper;
pub use stream::{EventStream, RedisEventStream};
pub use sync::PolicySync;
