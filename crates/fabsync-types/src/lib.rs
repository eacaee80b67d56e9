//! fabsync-types - shared domain types for fabric policy synchronization
//!
//! Entity records held in the local state store (endpoints, endpoint groups,
//! contracts, filters) and the event envelope consumed from the change stream.

mod contract;
mod endpoint;
mod event;
mod filter;
mod group;

pub use contract::{ContractAction, ContractRecord, ContractRole, UnknownAction};
pub use endpoint::Endpoint;
pub use event::{
    ContractEvent, EndpointEvent, EventEnvelope, EventError, EventPayload, EventStatus,
    FilterEntries, GroupEvent,
};
pub use filter::FilterRecord;
pub use group::Epg;
