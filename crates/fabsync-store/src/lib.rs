//! fabsync-store - durable local state for the policy reconciler
//!
//! The reconciliation engine treats this store as its source of truth. The
//! interface is deliberately narrow: keyed get/insert/delete per entity type,
//! whole-set replacement primitives for the denormalized membership sets, and
//! a foreign-key lookup for endpoints. Two implementations ship: a
//! Redis-backed store for the daemon and an in-memory store for tests.

mod error;
mod memory;
mod redis_store;
mod store;
mod tables;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::{RedisStore, StoreConfig};
pub use store::StateStore;
pub use tables::{
    record_key, CONTRACT_TABLE_NAME, ENDPOINT_SYSID_MAP_NAME, ENDPOINT_TABLE_NAME,
    EPG_TABLE_NAME, FILTER_TABLE_NAME,
};
