//! PolicySync - classifies incoming events and reconciles them.
//!
//! One instance owns the whole reconciliation path: it classifies each raw
//! message, dispatches to the per-type handler, and mediates between the
//! local state store (the source of truth) and the fabric controller (best
//! effort, with failures recorded in the drift ledger).

mod contract;
mod endpoint;
mod epg;

use std::sync::Arc;

use tracing::{debug, error};

use fabsync_apic::{FabricController, FabricResult};
use fabsync_store::StateStore;
use fabsync_types::{EventEnvelope, EventPayload};

use crate::{DriftLedger, Result, SyncError};

/// The reconciliation engine.
///
/// Holds no entity state of its own beyond the record read from the store
/// for the event being processed; processing is strictly one message at a
/// time, in arrival order.
pub struct PolicySync<S, C> {
    store: Arc<S>,
    fabric: Arc<C>,
    tenant: String,
    drift: DriftLedger,
}

impl<S: StateStore, C: FabricController> PolicySync<S, C> {
    pub fn new(store: Arc<S>, fabric: Arc<C>, tenant: impl Into<String>) -> Self {
        Self {
            store,
            fabric,
            tenant: tenant.into(),
            drift: DriftLedger::new(),
        }
    }

    /// The ledger of controller calls that failed while local state moved on.
    pub fn drift(&self) -> &DriftLedger {
        &self.drift
    }

    /// Classifies and reconciles one raw message. Every failure mode ends
    /// here: unclassifiable and malformed messages are dropped with an error
    /// log, store failures abort this message only. The loop always
    /// continues.
    pub async fn process_raw(&self, raw: &str) {
        let event = match EventEnvelope::parse(raw) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "Dropping unclassifiable message");
                return;
            }
        };

        let id = event.id.clone();
        let kind = event.payload.kind();
        if let Err(e) = self.process(event).await {
            match e {
                SyncError::Classify(err) => {
                    error!(%id, kind, error = %err, "Dropping malformed message")
                }
                other => error!(%id, kind, error = %other, "Failed to reconcile message"),
            }
        }
    }

    /// Reconciles one classified event.
    pub async fn process(&self, event: EventEnvelope) -> Result<()> {
        debug!(id = %event.id, kind = event.payload.kind(), "Received event");
        match event.payload {
            EventPayload::Endpoint(ev) => {
                self.handle_endpoint(&event.id, event.status, ev).await
            }
            EventPayload::Group(ev) => self.handle_group(&event.id, event.status, ev).await,
            EventPayload::Contract(ev) => self.handle_contract(&event.id, event.status, ev).await,
        }
    }

    /// Books a controller call's outcome. A failed call is logged and
    /// recorded in the drift ledger; the local store mutation it accompanied
    /// proceeds regardless.
    fn note_fabric(&self, result: FabricResult<()>, call: String) {
        if let Err(e) = result {
            tracing::warn!(%call, error = %e, "Controller call failed; local state kept as intent");
            self.drift.record(call, e.to_string());
        }
    }
}
