//! Dead-letter ledger for failed controller calls.
//!
//! The local store is the reconciler's source of truth; a failed controller
//! push is not rolled back, so local and remote state can diverge. Every
//! failure lands here so the divergence is observable instead of silent.

use parking_lot::Mutex;

/// One failed controller call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftEntry {
    /// Human-readable description of the attempted call
    pub call: String,
    /// The error the controller client returned
    pub error: String,
}

/// Accumulates failed controller calls for inspection.
#[derive(Debug, Default)]
pub struct DriftLedger {
    entries: Mutex<Vec<DriftEntry>>,
}

impl DriftLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed call.
    pub fn record(&self, call: impl Into<String>, error: impl Into<String>) {
        self.entries.lock().push(DriftEntry {
            call: call.into(),
            error: error.into(),
        });
    }

    /// Snapshot of all recorded failures, oldest first.
    pub fn entries(&self) -> Vec<DriftEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_accumulates_in_order() {
        let ledger = DriftLedger::new();
        assert!(ledger.is_empty());

        ledger.record("create epg 'web'", "status 403");
        ledger.record("create filter 'prod-80'", "status 500");

        let entries = ledger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].call, "create epg 'web'");
        assert_eq!(entries[1].error, "status 500");
    }
}
