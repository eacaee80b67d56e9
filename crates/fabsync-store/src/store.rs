//! The `StateStore` trait - the narrow interface the reconciler depends on.

use std::collections::BTreeSet;

use async_trait::async_trait;

use fabsync_types::{ContractRecord, ContractRole, Endpoint, Epg, FilterRecord};

use crate::StoreResult;

/// Keyed storage for the four entity types plus the sys_id index.
///
/// Set updates are whole-set replacements: the caller reads the record,
/// computes the new set, and hands it back in one operation. Partial setters
/// targeting a record that does not exist are successful no-ops, keeping the
/// reconciler tolerant of reordered deletes.
#[async_trait]
pub trait StateStore: Send + Sync {
    // Endpoints

    async fn get_endpoint(&self, id: &str) -> StoreResult<Option<Endpoint>>;

    /// Foreign-key lookup through the store-owned sys_id index.
    async fn get_endpoint_by_sys_id(&self, sys_id: &str) -> StoreResult<Option<Endpoint>>;

    /// Inserts or fully replaces an endpoint record, maintaining the
    /// sys_id index.
    async fn upsert_endpoint(&self, endpoint: &Endpoint) -> StoreResult<()>;

    async fn delete_endpoint(&self, id: &str) -> StoreResult<()>;

    /// Rewrites an endpoint's group reference (empty string detaches).
    async fn set_endpoint_group(&self, id: &str, epg: &str) -> StoreResult<()>;

    // Endpoint groups

    async fn get_epg(&self, id: &str) -> StoreResult<Option<Epg>>;

    async fn upsert_epg(&self, epg: &Epg) -> StoreResult<()>;

    async fn delete_epg(&self, id: &str) -> StoreResult<()>;

    /// Atomically replaces a group's member set.
    async fn set_epg_members(&self, id: &str, members: &BTreeSet<String>) -> StoreResult<()>;

    /// Atomically replaces a group's consumed or provided contract set.
    async fn set_epg_contracts(
        &self,
        id: &str,
        role: ContractRole,
        contracts: &BTreeSet<String>,
    ) -> StoreResult<()>;

    // Contracts

    async fn get_contract(&self, id: &str) -> StoreResult<Option<ContractRecord>>;

    async fn upsert_contract(&self, contract: &ContractRecord) -> StoreResult<()>;

    async fn delete_contract(&self, id: &str) -> StoreResult<()>;

    /// Repoints a contract at a different (content-addressed) filter.
    async fn set_contract_filter(&self, id: &str, filter_name: &str) -> StoreResult<()>;

    /// Atomically replaces a contract's consumer or provider group set.
    async fn set_contract_groups(
        &self,
        id: &str,
        role: ContractRole,
        groups: &BTreeSet<String>,
    ) -> StoreResult<()>;

    // Filters

    async fn get_filter(&self, name: &str) -> StoreResult<Option<FilterRecord>>;

    /// Inserts a filter record. Filters are content-addressed and immutable,
    /// so inserting an already-present name is a no-op.
    async fn insert_filter(&self, filter: &FilterRecord) -> StoreResult<()>;
}
