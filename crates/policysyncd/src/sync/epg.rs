//! Group event reconciliation.
//!
//! Group existence is pushed to the controller; membership is local
//! bookkeeping. Incoming member lists carry the event source's foreign keys
//! and are resolved to internal endpoint ids before any diffing.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use fabsync_apic::{FabricController, LifecycleStatus};
use fabsync_store::StateStore;
use fabsync_types::{ContractRole, Epg, EventStatus, GroupEvent};

use crate::Result;

use super::PolicySync;

impl<S: StateStore, C: FabricController> PolicySync<S, C> {
    pub(super) async fn handle_group(
        &self,
        id: &str,
        status: EventStatus,
        ev: GroupEvent,
    ) -> Result<()> {
        match status {
            EventStatus::Create | EventStatus::Update => {
                let resolved = self.resolve_members(&ev.members).await?;

                match self.store.get_epg(id).await? {
                    None => {
                        let result = self
                            .fabric
                            .push_epg(&ev.name, LifecycleStatus::CreatedModified)
                            .await;
                        self.note_fabric(result, format!("create epg '{}'", ev.name));

                        let mut group = Epg::new(id, ev.name.clone());
                        group.members = resolved;
                        self.store.upsert_epg(&group).await?;
                        debug!(id, name = %ev.name, "Created group");
                    }
                    Some(prev) => {
                        // Groups are defined by name alone remotely, so an
                        // unchanged member set leaves nothing to do. This is
                        // what makes a replayed create a no-op.
                        if prev.members == resolved {
                            debug!(id, name = %prev.name, "Group already in sync");
                            return Ok(());
                        }
                        self.update_membership(id, &prev, resolved).await?;
                    }
                }
            }
            EventStatus::Delete => {
                let record = self.store.get_epg(id).await?;
                let name = if ev.name.is_empty() {
                    record.as_ref().map(|g| g.name.clone()).unwrap_or_default()
                } else {
                    ev.name.clone()
                };

                let result = self.fabric.push_epg(&name, LifecycleStatus::Deleted).await;
                self.note_fabric(result, format!("delete epg '{}'", name));

                let Some(group) = record else {
                    debug!(id, "Delete for unknown group is a no-op");
                    return Ok(());
                };

                // Sever the group from every contract that still lists it.
                for role in [ContractRole::Consumed, ContractRole::Provided] {
                    for contract_id in group.contracts(role) {
                        if let Some(contract) = self.store.get_contract(contract_id).await? {
                            let mut groups = contract.groups(role).clone();
                            if groups.remove(id) {
                                self.store
                                    .set_contract_groups(contract_id, role, &groups)
                                    .await?;
                            }
                        }
                    }
                }

                // Detach every member endpoint.
                for endpoint_id in &group.members {
                    self.store.set_endpoint_group(endpoint_id, "").await?;
                }

                self.store.delete_epg(id).await?;
                debug!(id, name = %group.name, "Deleted group");
            }
        }
        Ok(())
    }

    /// Resolves incoming foreign keys to internal endpoint ids. A reference
    /// to an endpoint not yet seen is dropped with a warning; membership is
    /// not retroactively repaired when the endpoint arrives later.
    async fn resolve_members(&self, members: &[String]) -> Result<BTreeSet<String>> {
        let mut resolved = BTreeSet::new();
        for sys_id in members {
            match self.store.get_endpoint_by_sys_id(sys_id).await? {
                Some(endpoint) => {
                    resolved.insert(endpoint.id);
                }
                None => {
                    warn!(%sys_id, "Group references an endpoint not yet seen; dropping member");
                }
            }
        }
        Ok(resolved)
    }

    /// Applies a membership diff: detach exactly `prev - next`, attach
    /// exactly `next - prev`, leave the intersection untouched. An endpoint
    /// attached here while referencing another group is detached there
    /// first.
    async fn update_membership(
        &self,
        id: &str,
        prev: &Epg,
        next: BTreeSet<String>,
    ) -> Result<()> {
        let added: Vec<String> = next.difference(&prev.members).cloned().collect();
        let removed: Vec<String> = prev.members.difference(&next).cloned().collect();
        debug!(
            group = %prev.name,
            added = added.len(),
            removed = removed.len(),
            "Updating group membership"
        );

        self.store.set_epg_members(id, &next).await?;

        for endpoint_id in &removed {
            self.store.set_endpoint_group(endpoint_id, "").await?;
        }

        for endpoint_id in &added {
            let Some(endpoint) = self.store.get_endpoint(endpoint_id).await? else {
                continue;
            };
            if endpoint.epg == id {
                continue;
            }
            if let Some(old_group_id) = endpoint.group() {
                if let Some(old_group) = self.store.get_epg(old_group_id).await? {
                    let mut members = old_group.members.clone();
                    if members.remove(endpoint_id) {
                        self.store.set_epg_members(old_group_id, &members).await?;
                        debug!(
                            endpoint = %endpoint_id,
                            from = %old_group.name,
                            "Detached endpoint from previous group"
                        );
                    }
                }
            }
            self.store.set_endpoint_group(endpoint_id, id).await?;
        }

        Ok(())
    }
}
