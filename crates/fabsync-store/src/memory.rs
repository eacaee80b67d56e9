//! In-memory state store used by tests and local runs.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use fabsync_types::{ContractRecord, ContractRole, Endpoint, Epg, FilterRecord};

use crate::{StateStore, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    endpoints: BTreeMap<String, Endpoint>,
    epgs: BTreeMap<String, Epg>,
    contracts: BTreeMap<String, ContractRecord>,
    filters: BTreeMap<String, FilterRecord>,
    /// sys_id -> endpoint id
    sys_id_index: BTreeMap<String, String>,
}

/// A `StateStore` backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored endpoint records.
    pub fn endpoint_count(&self) -> usize {
        self.inner.read().endpoints.len()
    }

    /// Number of stored filter records.
    pub fn filter_count(&self) -> usize {
        self.inner.read().filters.len()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get_endpoint(&self, id: &str) -> StoreResult<Option<Endpoint>> {
        Ok(self.inner.read().endpoints.get(id).cloned())
    }

    async fn get_endpoint_by_sys_id(&self, sys_id: &str) -> StoreResult<Option<Endpoint>> {
        let inner = self.inner.read();
        Ok(inner
            .sys_id_index
            .get(sys_id)
            .and_then(|id| inner.endpoints.get(id))
            .cloned())
    }

    async fn upsert_endpoint(&self, endpoint: &Endpoint) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let stale_sys_id = inner
            .endpoints
            .get(&endpoint.id)
            .map(|old| old.sys_id.clone())
            .filter(|old| !old.is_empty() && *old != endpoint.sys_id);
        if let Some(old_sys_id) = stale_sys_id {
            inner.sys_id_index.remove(&old_sys_id);
        }
        if !endpoint.sys_id.is_empty() {
            inner
                .sys_id_index
                .insert(endpoint.sys_id.clone(), endpoint.id.clone());
        }
        inner
            .endpoints
            .insert(endpoint.id.clone(), endpoint.clone());
        Ok(())
    }

    async fn delete_endpoint(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if let Some(old) = inner.endpoints.remove(id) {
            if !old.sys_id.is_empty() {
                inner.sys_id_index.remove(&old.sys_id);
            }
        }
        Ok(())
    }

    async fn set_endpoint_group(&self, id: &str, epg: &str) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if let Some(ep) = inner.endpoints.get_mut(id) {
            ep.epg = epg.to_string();
        }
        Ok(())
    }

    async fn get_epg(&self, id: &str) -> StoreResult<Option<Epg>> {
        Ok(self.inner.read().epgs.get(id).cloned())
    }

    async fn upsert_epg(&self, epg: &Epg) -> StoreResult<()> {
        self.inner.write().epgs.insert(epg.id.clone(), epg.clone());
        Ok(())
    }

    async fn delete_epg(&self, id: &str) -> StoreResult<()> {
        self.inner.write().epgs.remove(id);
        Ok(())
    }

    async fn set_epg_members(&self, id: &str, members: &BTreeSet<String>) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if let Some(epg) = inner.epgs.get_mut(id) {
            epg.members = members.clone();
        }
        Ok(())
    }

    async fn set_epg_contracts(
        &self,
        id: &str,
        role: ContractRole,
        contracts: &BTreeSet<String>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if let Some(epg) = inner.epgs.get_mut(id) {
            *epg.contracts_mut(role) = contracts.clone();
        }
        Ok(())
    }

    async fn get_contract(&self, id: &str) -> StoreResult<Option<ContractRecord>> {
        Ok(self.inner.read().contracts.get(id).cloned())
    }

    async fn upsert_contract(&self, contract: &ContractRecord) -> StoreResult<()> {
        self.inner
            .write()
            .contracts
            .insert(contract.id.clone(), contract.clone());
        Ok(())
    }

    async fn delete_contract(&self, id: &str) -> StoreResult<()> {
        self.inner.write().contracts.remove(id);
        Ok(())
    }

    async fn set_contract_filter(&self, id: &str, filter_name: &str) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if let Some(contract) = inner.contracts.get_mut(id) {
            contract.filter_name = filter_name.to_string();
        }
        Ok(())
    }

    async fn set_contract_groups(
        &self,
        id: &str,
        role: ContractRole,
        groups: &BTreeSet<String>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if let Some(contract) = inner.contracts.get_mut(id) {
            *contract.groups_mut(role) = groups.clone();
        }
        Ok(())
    }

    async fn get_filter(&self, name: &str) -> StoreResult<Option<FilterRecord>> {
        Ok(self.inner.read().filters.get(name).cloned())
    }

    async fn insert_filter(&self, filter: &FilterRecord) -> StoreResult<()> {
        self.inner
            .write()
            .filters
            .entry(filter.name.clone())
            .or_insert_with(|| filter.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_endpoint_sys_id_index() {
        let store = MemoryStore::new();
        let mut ep = Endpoint::new("ep1", "web-01");
        ep.sys_id = "s1".to_string();
        store.upsert_endpoint(&ep).await.unwrap();

        let found = store.get_endpoint_by_sys_id("s1").await.unwrap().unwrap();
        assert_eq!(found.id, "ep1");

        store.delete_endpoint("ep1").await.unwrap();
        assert!(store.get_endpoint_by_sys_id("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sys_id_reindex_on_change() {
        let store = MemoryStore::new();
        let mut ep = Endpoint::new("ep1", "web-01");
        ep.sys_id = "s1".to_string();
        store.upsert_endpoint(&ep).await.unwrap();

        ep.sys_id = "s2".to_string();
        store.upsert_endpoint(&ep).await.unwrap();

        assert!(store.get_endpoint_by_sys_id("s1").await.unwrap().is_none());
        assert!(store.get_endpoint_by_sys_id("s2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_primitives_missing_record_is_noop() {
        let store = MemoryStore::new();
        let members: BTreeSet<String> = ["ep1".to_string()].into();

        store.set_epg_members("missing", &members).await.unwrap();
        store.set_endpoint_group("missing", "g1").await.unwrap();
        store
            .set_contract_groups("missing", ContractRole::Consumed, &members)
            .await
            .unwrap();
        assert!(store.get_epg("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filter_insert_is_idempotent() {
        let store = MemoryStore::new();
        let filter = FilterRecord::from_ports("prod", &[80]);
        store.insert_filter(&filter).await.unwrap();
        store.insert_filter(&filter).await.unwrap();
        assert_eq!(store.filter_count(), 1);
    }

    #[tokio::test]
    async fn test_set_epg_members_replaces_whole_set() {
        let store = MemoryStore::new();
        let mut epg = Epg::new("g1", "web");
        epg.members.insert("ep1".to_string());
        epg.members.insert("ep2".to_string());
        store.upsert_epg(&epg).await.unwrap();

        let next: BTreeSet<String> = ["ep3".to_string()].into();
        store.set_epg_members("g1", &next).await.unwrap();

        let stored = store.get_epg("g1").await.unwrap().unwrap();
        assert_eq!(stored.members, next);
    }
}
