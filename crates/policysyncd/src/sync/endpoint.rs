//! Endpoint event reconciliation.
//!
//! Endpoints never generate controller calls on their own; group membership
//! is pushed remotely by the group and contract handlers. This handler keeps
//! the endpoint table and the denormalized group member sets in step.

use tracing::debug;

use fabsync_apic::FabricController;
use fabsync_store::StateStore;
use fabsync_types::{EndpointEvent, Endpoint, EventStatus};

use crate::Result;

use super::PolicySync;

impl<S: StateStore, C: FabricController> PolicySync<S, C> {
    pub(super) async fn handle_endpoint(
        &self,
        id: &str,
        status: EventStatus,
        ev: EndpointEvent,
    ) -> Result<()> {
        match status {
            EventStatus::Create | EventStatus::Update => {
                match self.store.get_endpoint(id).await? {
                    None => {
                        let endpoint = Endpoint {
                            id: id.to_string(),
                            sys_id: ev.sys_id.unwrap_or_default(),
                            name: ev.name.unwrap_or_default(),
                            epg: ev.epg.unwrap_or_default(),
                        };
                        self.store.upsert_endpoint(&endpoint).await?;
                        debug!(id, name = %endpoint.name, "Added endpoint");
                    }
                    Some(mut endpoint) => {
                        // Field-level overwrite: only fields the message
                        // carries replace the stored values.
                        if let Some(name) = ev.name {
                            endpoint.name = name;
                        }
                        if let Some(sys_id) = ev.sys_id {
                            endpoint.sys_id = sys_id;
                        }
                        if let Some(epg) = ev.epg {
                            endpoint.epg = epg;
                        }
                        self.store.upsert_endpoint(&endpoint).await?;
                        debug!(id, name = %endpoint.name, "Updated endpoint");
                    }
                }
            }
            EventStatus::Delete => {
                // Read first to discover the current group, then sever the
                // denormalized member reference.
                let Some(endpoint) = self.store.get_endpoint(id).await? else {
                    debug!(id, "Delete for unknown endpoint is a no-op");
                    return Ok(());
                };
                self.store.delete_endpoint(id).await?;
                debug!(id, name = %endpoint.name, "Deleted endpoint");

                if let Some(group_id) = endpoint.group() {
                    if let Some(group) = self.store.get_epg(group_id).await? {
                        let mut members = group.members.clone();
                        if members.remove(id) {
                            self.store.set_epg_members(group_id, &members).await?;
                            debug!(id, group = %group.name, "Removed endpoint from group");
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
