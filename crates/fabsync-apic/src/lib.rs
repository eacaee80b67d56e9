//! fabsync-apic - client for the declarative fabric controller
//!
//! The controller owns the live network configuration as a tree of managed
//! objects. This crate issues the narrow set of object upserts/deletes the
//! reconciler needs: group containers, contracts with their subject and
//! filter attachment, filters with per-port rule entries, and group-to-
//! contract attachments. Requests carry a lifecycle status tag
//! (`created,modified` or `deleted`); HTTP 200 is the only success signal.

mod client;
mod controller;
mod error;
mod payloads;

pub use client::{ApicClient, ApicConfig};
pub use controller::{FabricController, FilterBinding, LifecycleStatus, SharedController};
pub use error::{FabricError, FabricResult};
