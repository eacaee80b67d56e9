//! The `FabricController` trait and the shared-handle construction guard.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use fabsync_types::{ContractAction, ContractRole, FilterRecord};

use crate::{ApicClient, ApicConfig, FabricResult};

/// Lifecycle status tag carried by every managed-object request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStatus {
    /// Upsert: create the object or modify it in place
    CreatedModified,
    /// Remove the object
    Deleted,
}

impl LifecycleStatus {
    /// Wire value for the `status` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::CreatedModified => "created,modified",
            LifecycleStatus::Deleted => "deleted",
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, LifecycleStatus::Deleted)
    }
}

/// A contract's filter attachment: the filter it references and the action
/// applied to matching traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBinding {
    pub filter_name: String,
    pub action: ContractAction,
}

/// The calls the reconciler issues against the fabric controller.
///
/// Implementations must be safe for concurrent request issuance once
/// constructed; construction itself is guarded by [`SharedController`].
#[async_trait]
pub trait FabricController: Send + Sync {
    /// Creates or deletes a group container object.
    async fn push_epg(&self, epg: &str, status: LifecycleStatus) -> FabricResult<()>;

    /// Creates or deletes a filter with its per-port rule entries.
    async fn push_filter(&self, filter: &FilterRecord, status: LifecycleStatus)
        -> FabricResult<()>;

    /// Creates or deletes a contract. The filter binding is attached only on
    /// upsert; deletes carry no children beyond the subject.
    async fn push_contract(
        &self,
        contract: &str,
        binding: Option<&FilterBinding>,
        status: LifecycleStatus,
    ) -> FabricResult<()>;

    /// Atomically detaches the old filter and attaches the new one within a
    /// single request against the contract's subject.
    async fn replace_contract_filter(
        &self,
        contract: &str,
        old_filter: &str,
        new_filter: &str,
        action: ContractAction,
    ) -> FabricResult<()>;

    /// Associates (or, with status `deleted`, dissociates) a group with a
    /// contract in the given role.
    async fn attach_contract(
        &self,
        role: ContractRole,
        epg: &str,
        contract: &str,
        status: LifecycleStatus,
    ) -> FabricResult<()>;
}

/// Lazily constructs the controller client exactly once and hands out shared
/// handles afterwards.
///
/// Both the consumer loop and the session keeper go through this guard; the
/// first caller performs construction and login under mutual exclusion, every
/// later caller gets the same handle.
pub struct SharedController {
    config: ApicConfig,
    cell: OnceCell<Arc<ApicClient>>,
}

impl SharedController {
    pub fn new(config: ApicConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Returns the shared client handle, constructing and logging in on
    /// first use.
    pub async fn get(&self) -> FabricResult<Arc<ApicClient>> {
        self.cell
            .get_or_try_init(|| async {
                let client = ApicClient::new(self.config.clone())?;
                client.login().await?;
                Ok(Arc::new(client))
            })
            .await
            .cloned()
    }
}
