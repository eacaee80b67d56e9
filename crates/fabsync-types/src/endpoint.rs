//! Endpoint record - a single network-attached device.

use serde::{Deserialize, Serialize};

/// A network-attached device tracked by the reconciler.
///
/// `id` is the engine's internal primary key (a uuid string). `sys_id` is the
/// event source's foreign key for the same device and is only used to resolve
/// incoming group-membership lists. `epg` holds the id of the group the
/// endpoint currently belongs to, or the empty string when detached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Internal primary key
    pub id: String,
    /// Event-source foreign key
    #[serde(default)]
    pub sys_id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Id of the owning group, empty when detached
    #[serde(default)]
    pub epg: String,
}

impl Endpoint {
    /// Creates a detached endpoint record.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the owning group id, if attached.
    pub fn group(&self) -> Option<&str> {
        if self.epg.is_empty() {
            None
        } else {
            Some(&self.epg)
        }
    }
}
