//! Redis-backed state store.
//!
//! Records are stored as JSON values, one key per record
//! (`<TABLE>:<id>`), plus a hash maintaining the sys_id -> endpoint id
//! index. Set-replacement primitives are read-modify-write on the record;
//! the single-writer consumer loop makes that safe.

use std::collections::BTreeSet;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use fabsync_types::{ContractRecord, ContractRole, Endpoint, Epg, FilterRecord};

use crate::tables::{
    record_key, CONTRACT_TABLE_NAME, ENDPOINT_SYSID_MAP_NAME, ENDPOINT_TABLE_NAME,
    EPG_TABLE_NAME, FILTER_TABLE_NAME,
};
use crate::{StateStore, StoreError, StoreResult};

/// Connection settings for the Redis state store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Redis server hostname or IP
    pub host: String,
    /// Redis server port
    pub port: u16,
    /// Database index
    pub db: u8,
}

impl StoreConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            db: 0,
        }
    }

    fn uri(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// A `StateStore` backed by Redis.
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects to the configured Redis database. Connection failure here is
    /// a dependency startup failure and fatal for the daemon.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let uri = config.uri();
        let client = redis::Client::open(uri.clone())
            .map_err(|e| StoreError::Connection(format!("{}: {}", uri, e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connection(format!("{}: {}", uri, e)))?;

        debug!(%uri, "Connected to state store");
        Ok(Self { conn })
    }

    async fn get_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> StoreResult<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(record_key(table, id)).await?;
        raw.map(|s| serde_json::from_str(&s).map_err(StoreError::from))
            .transpose()
    }

    async fn put_record<T: Serialize>(&self, table: &str, id: &str, record: &T) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(record)?;
        let _: () = conn.set(record_key(table, id), raw).await?;
        Ok(())
    }

    async fn del_record(&self, table: &str, id: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(record_key(table, id)).await?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for RedisStore {
    async fn get_endpoint(&self, id: &str) -> StoreResult<Option<Endpoint>> {
        self.get_record(ENDPOINT_TABLE_NAME, id).await
    }

    async fn get_endpoint_by_sys_id(&self, sys_id: &str) -> StoreResult<Option<Endpoint>> {
        let mut conn = self.conn.clone();
        let id: Option<String> = conn.hget(ENDPOINT_SYSID_MAP_NAME, sys_id).await?;
        match id {
            Some(id) => self.get_endpoint(&id).await,
            None => Ok(None),
        }
    }

    async fn upsert_endpoint(&self, endpoint: &Endpoint) -> StoreResult<()> {
        let mut conn = self.conn.clone();

        // Keep the sys_id index in step with the record.
        if let Some(old) = self.get_endpoint(&endpoint.id).await? {
            if !old.sys_id.is_empty() && old.sys_id != endpoint.sys_id {
                let _: () = conn.hdel(ENDPOINT_SYSID_MAP_NAME, &old.sys_id).await?;
            }
        }
        if !endpoint.sys_id.is_empty() {
            let _: () = conn
                .hset(ENDPOINT_SYSID_MAP_NAME, &endpoint.sys_id, &endpoint.id)
                .await?;
        }

        self.put_record(ENDPOINT_TABLE_NAME, &endpoint.id, endpoint)
            .await
    }

    async fn delete_endpoint(&self, id: &str) -> StoreResult<()> {
        if let Some(old) = self.get_endpoint(id).await? {
            if !old.sys_id.is_empty() {
                let mut conn = self.conn.clone();
                let _: () = conn.hdel(ENDPOINT_SYSID_MAP_NAME, &old.sys_id).await?;
            }
        }
        self.del_record(ENDPOINT_TABLE_NAME, id).await
    }

    async fn set_endpoint_group(&self, id: &str, epg: &str) -> StoreResult<()> {
        if let Some(mut ep) = self.get_endpoint(id).await? {
            ep.epg = epg.to_string();
            self.put_record(ENDPOINT_TABLE_NAME, id, &ep).await?;
        }
        Ok(())
    }

    async fn get_epg(&self, id: &str) -> StoreResult<Option<Epg>> {
        self.get_record(EPG_TABLE_NAME, id).await
    }

    async fn upsert_epg(&self, epg: &Epg) -> StoreResult<()> {
        self.put_record(EPG_TABLE_NAME, &epg.id, epg).await
    }

    async fn delete_epg(&self, id: &str) -> StoreResult<()> {
        self.del_record(EPG_TABLE_NAME, id).await
    }

    async fn set_epg_members(&self, id: &str, members: &BTreeSet<String>) -> StoreResult<()> {
        if let Some(mut epg) = self.get_epg(id).await? {
            epg.members = members.clone();
            self.put_record(EPG_TABLE_NAME, id, &epg).await?;
        }
        Ok(())
    }

    async fn set_epg_contracts(
        &self,
        id: &str,
        role: ContractRole,
        contracts: &BTreeSet<String>,
    ) -> StoreResult<()> {
        if let Some(mut epg) = self.get_epg(id).await? {
            *epg.contracts_mut(role) = contracts.clone();
            self.put_record(EPG_TABLE_NAME, id, &epg).await?;
        }
        Ok(())
    }

    async fn get_contract(&self, id: &str) -> StoreResult<Option<ContractRecord>> {
        self.get_record(CONTRACT_TABLE_NAME, id).await
    }

    async fn upsert_contract(&self, contract: &ContractRecord) -> StoreResult<()> {
        self.put_record(CONTRACT_TABLE_NAME, &contract.id, contract)
            .await
    }

    async fn delete_contract(&self, id: &str) -> StoreResult<()> {
        self.del_record(CONTRACT_TABLE_NAME, id).await
    }

    async fn set_contract_filter(&self, id: &str, filter_name: &str) -> StoreResult<()> {
        if let Some(mut contract) = self.get_contract(id).await? {
            contract.filter_name = filter_name.to_string();
            self.put_record(CONTRACT_TABLE_NAME, id, &contract).await?;
        }
        Ok(())
    }

    async fn set_contract_groups(
        &self,
        id: &str,
        role: ContractRole,
        groups: &BTreeSet<String>,
    ) -> StoreResult<()> {
        if let Some(mut contract) = self.get_contract(id).await? {
            *contract.groups_mut(role) = groups.clone();
            self.put_record(CONTRACT_TABLE_NAME, id, &contract).await?;
        }
        Ok(())
    }

    async fn get_filter(&self, name: &str) -> StoreResult<Option<FilterRecord>> {
        self.get_record(FILTER_TABLE_NAME, name).await
    }

    async fn insert_filter(&self, filter: &FilterRecord) -> StoreResult<()> {
        // Content-addressed: an existing record under this name is already
        // identical, so the write is safe either way.
        self.put_record(FILTER_TABLE_NAME, &filter.name, filter)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_uri() {
        let config = StoreConfig::new("127.0.0.1", 6379);
        assert_eq!(config.uri(), "redis://127.0.0.1:6379/0");

        let mut config = StoreConfig::new("db.example", 6380);
        config.db = 4;
        assert_eq!(config.uri(), "redis://db.example:6380/4");
    }
}
