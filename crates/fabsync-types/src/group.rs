//! Endpoint group (EPG) record - a named policy container.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ContractRole;

/// A named collection of endpoints sharing policy.
///
/// Membership is denormalized: each member endpoint also carries this group's
/// id in its `epg` field, and the two views must agree once both sides have
/// processed their events. `consumed`/`provided` list the contracts this
/// group participates in, by contract id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epg {
    /// Internal primary key
    pub id: String,
    /// Display name, also the object name on the fabric controller
    pub name: String,
    /// Member endpoint ids (internal ids, not foreign keys)
    #[serde(default)]
    pub members: BTreeSet<String>,
    /// Contracts this group consumes
    #[serde(default)]
    pub consumed: BTreeSet<String>,
    /// Contracts this group provides
    #[serde(default)]
    pub provided: BTreeSet<String>,
}

impl Epg {
    /// Creates a group with no members and no contract references.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the contract-reference set for the given role.
    pub fn contracts(&self, role: ContractRole) -> &BTreeSet<String> {
        match role {
            ContractRole::Consumed => &self.consumed,
            ContractRole::Provided => &self.provided,
        }
    }

    /// Returns the mutable contract-reference set for the given role.
    pub fn contracts_mut(&mut self, role: ContractRole) -> &mut BTreeSet<String> {
        match role {
            ContractRole::Consumed => &mut self.consumed,
            ContractRole::Provided => &mut self.provided,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contracts_by_role() {
        let mut epg = Epg::new("g1", "web");
        epg.contracts_mut(ContractRole::Consumed)
            .insert("c1".to_string());
        epg.contracts_mut(ContractRole::Provided)
            .insert("c2".to_string());

        assert!(epg.contracts(ContractRole::Consumed).contains("c1"));
        assert!(epg.contracts(ContractRole::Provided).contains("c2"));
        assert!(!epg.contracts(ContractRole::Consumed).contains("c2"));
    }

    #[test]
    fn test_deserialize_missing_sets() {
        let epg: Epg = serde_json::from_str(r#"{"id":"g1","name":"web"}"#).unwrap();
        assert!(epg.members.is_empty());
        assert!(epg.consumed.is_empty());
        assert!(epg.provided.is_empty());
    }
}
