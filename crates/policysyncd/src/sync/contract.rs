//! Contract event reconciliation - the most intricate path.
//!
//! A contract binds a content-addressed filter to consumer and provider
//! group sets. The handler resolves the filter (lookup-or-create), pushes
//! the contract object, and converges the per-role group attachments by set
//! difference so only incremental controller calls are issued.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use fabsync_apic::{FabricController, FilterBinding, LifecycleStatus};
use fabsync_store::StateStore;
use fabsync_types::{ContractAction, ContractEvent, ContractRecord, ContractRole, EventStatus};

use crate::Result;

use super::PolicySync;

impl<S: StateStore, C: FabricController> PolicySync<S, C> {
    pub(super) async fn handle_contract(
        &self,
        id: &str,
        status: EventStatus,
        ev: ContractEvent,
    ) -> Result<()> {
        match status {
            EventStatus::Create | EventStatus::Update => self.upsert_contract(id, ev).await,
            EventStatus::Delete => self.remove_contract(id, ev).await,
        }
    }

    async fn upsert_contract(&self, id: &str, ev: ContractEvent) -> Result<()> {
        let filter = ev.filter_entries.resolve(&self.tenant)?;
        let action = match ev.action.as_deref() {
            None => ContractAction::default(),
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                warn!(contract = %ev.name, %err, "Defaulting unrecognized action to deny");
                ContractAction::Deny
            }),
        };

        // Content-addressed lookup-or-create; identical rule sets converge
        // on one filter and the create happens at most once.
        if self.store.get_filter(&filter.name).await?.is_none() {
            let result = self
                .fabric
                .push_filter(&filter, LifecycleStatus::CreatedModified)
                .await;
            self.note_fabric(result, format!("create filter '{}'", filter.name));
            self.store.insert_filter(&filter).await?;
            debug!(filter = %filter.name, "Created filter");
        }

        let next_consumers: BTreeSet<String> = ev.consumer_epg.iter().cloned().collect();
        let next_providers: BTreeSet<String> = ev.provider_epg.iter().cloned().collect();

        match self.store.get_contract(id).await? {
            None => {
                let binding = FilterBinding {
                    filter_name: filter.name.clone(),
                    action,
                };
                let result = self
                    .fabric
                    .push_contract(&ev.name, Some(&binding), LifecycleStatus::CreatedModified)
                    .await;
                self.note_fabric(result, format!("create contract '{}'", ev.name));

                let record = ContractRecord {
                    id: id.to_string(),
                    name: ev.name.clone(),
                    filter_name: filter.name.clone(),
                    action,
                    consumer_epg: BTreeSet::new(),
                    provider_epg: BTreeSet::new(),
                };
                self.store.upsert_contract(&record).await?;
                debug!(id, name = %record.name, "Created contract");

                // Initial sets are 100% additions.
                let none = BTreeSet::new();
                self.apply_role_diff(
                    id,
                    &record.name,
                    ContractRole::Consumed,
                    &next_consumers,
                    &next_consumers,
                    &none,
                )
                .await?;
                self.apply_role_diff(
                    id,
                    &record.name,
                    ContractRole::Provided,
                    &next_providers,
                    &next_providers,
                    &none,
                )
                .await?;
            }
            Some(prev) => {
                // A changed rule set resolves to a new filter name; the swap
                // detaches the old and attaches the new in one request.
                if filter.name != prev.filter_name {
                    let result = self
                        .fabric
                        .replace_contract_filter(&ev.name, &prev.filter_name, &filter.name, action)
                        .await;
                    self.note_fabric(
                        result,
                        format!("change filter for contract '{}'", ev.name),
                    );
                    self.store.set_contract_filter(id, &filter.name).await?;
                    debug!(
                        contract = %ev.name,
                        filter = %filter.name,
                        "Repointed contract filter"
                    );
                }

                let added: BTreeSet<String> = next_consumers
                    .difference(&prev.consumer_epg)
                    .cloned()
                    .collect();
                let removed: BTreeSet<String> = prev
                    .consumer_epg
                    .difference(&next_consumers)
                    .cloned()
                    .collect();
                self.apply_role_diff(
                    id,
                    &prev.name,
                    ContractRole::Consumed,
                    &next_consumers,
                    &added,
                    &removed,
                )
                .await?;

                let added: BTreeSet<String> = next_providers
                    .difference(&prev.provider_epg)
                    .cloned()
                    .collect();
                let removed: BTreeSet<String> = prev
                    .provider_epg
                    .difference(&next_providers)
                    .cloned()
                    .collect();
                self.apply_role_diff(
                    id,
                    &prev.name,
                    ContractRole::Provided,
                    &next_providers,
                    &added,
                    &removed,
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Converges one role's attachments: per-group controller calls for
    /// exactly the added and removed ids, then one store operation replacing
    /// the contract's whole membership set for that role.
    async fn apply_role_diff(
        &self,
        contract_id: &str,
        contract_name: &str,
        role: ContractRole,
        target: &BTreeSet<String>,
        added: &BTreeSet<String>,
        removed: &BTreeSet<String>,
    ) -> Result<()> {
        if added.is_empty() && removed.is_empty() {
            return Ok(());
        }

        for group_id in added {
            let Some(group) = self.store.get_epg(group_id).await? else {
                warn!(
                    %group_id,
                    contract = contract_name,
                    "Contract names an unknown group; skipping attach"
                );
                continue;
            };
            let result = self
                .fabric
                .attach_contract(role, &group.name, contract_name, LifecycleStatus::CreatedModified)
                .await;
            self.note_fabric(
                result,
                format!(
                    "attach {} '{}' to contract '{}'",
                    role.party(),
                    group.name,
                    contract_name
                ),
            );

            let mut refs = group.contracts(role).clone();
            refs.insert(contract_id.to_string());
            self.store.set_epg_contracts(group_id, role, &refs).await?;
        }

        for group_id in removed {
            let Some(group) = self.store.get_epg(group_id).await? else {
                warn!(
                    %group_id,
                    contract = contract_name,
                    "Contract names an unknown group; skipping detach"
                );
                continue;
            };
            let result = self
                .fabric
                .attach_contract(role, &group.name, contract_name, LifecycleStatus::Deleted)
                .await;
            self.note_fabric(
                result,
                format!(
                    "detach {} '{}' from contract '{}'",
                    role.party(),
                    group.name,
                    contract_name
                ),
            );

            let mut refs = group.contracts(role).clone();
            refs.remove(contract_id);
            self.store.set_epg_contracts(group_id, role, &refs).await?;
        }

        // The membership-set update covers the whole batch in one store
        // operation.
        self.store
            .set_contract_groups(contract_id, role, target)
            .await?;
        Ok(())
    }

    async fn remove_contract(&self, id: &str, ev: ContractEvent) -> Result<()> {
        let record = self.store.get_contract(id).await?;
        let name = if ev.name.is_empty() {
            record.as_ref().map(|c| c.name.clone()).unwrap_or_default()
        } else {
            ev.name.clone()
        };

        let result = self
            .fabric
            .push_contract(&name, None, LifecycleStatus::Deleted)
            .await;
        self.note_fabric(result, format!("delete contract '{}'", name));

        let Some(record) = record else {
            debug!(id, "Delete for unknown contract is a no-op");
            return Ok(());
        };

        // Remove this contract from every group that still references it.
        for role in [ContractRole::Consumed, ContractRole::Provided] {
            for group_id in record.groups(role) {
                if let Some(group) = self.store.get_epg(group_id).await? {
                    let mut refs = group.contracts(role).clone();
                    if refs.remove(id) {
                        self.store.set_epg_contracts(group_id, role, &refs).await?;
                    }
                }
            }
        }

        self.store.delete_contract(id).await?;
        debug!(id, name = %record.name, "Deleted contract");
        Ok(())
    }
}
