//! Contract record - a policy binding between a filter and two group sets.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Traffic action carried by a contract's filter attachment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractAction {
    /// Allow matching traffic
    Permit,
    /// Drop matching traffic (the default when the event omits an action)
    #[default]
    Deny,
}

/// Error for an action value the event source is not allowed to send.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown contract action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for ContractAction {
    type Err = UnknownAction;

    /// Case-normalizing parse: the event source sends `ALLOW`/`DENY`, the
    /// controller speaks `permit`/`deny`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" | "permit" => Ok(ContractAction::Permit),
            "deny" => Ok(ContractAction::Deny),
            _ => Err(UnknownAction(s.to_string())),
        }
    }
}

impl ContractAction {
    /// Controller-facing value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractAction::Permit => "permit",
            ContractAction::Deny => "deny",
        }
    }
}

/// Side of a contract relationship a group participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractRole {
    /// The group consumes the contract
    Consumed,
    /// The group provides the contract
    Provided,
}

impl ContractRole {
    /// Store-facing role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractRole::Consumed => "consumed",
            ContractRole::Provided => "provided",
        }
    }

    /// Controller object class for the group-to-contract attachment.
    pub fn object_class(&self) -> &'static str {
        match self {
            ContractRole::Consumed => "fvRsCons",
            ContractRole::Provided => "fvRsProv",
        }
    }

    /// Human word used in logs ("consumer"/"provider").
    pub fn party(&self) -> &'static str {
        match self {
            ContractRole::Consumed => "consumer",
            ContractRole::Provided => "provider",
        }
    }
}

/// A policy binding between a filter and two sets of groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Internal primary key
    pub id: String,
    /// Display name, also the object name on the fabric controller
    pub name: String,
    /// Content-addressed name of the filter this contract references
    pub filter_name: String,
    /// Traffic action
    #[serde(default)]
    pub action: ContractAction,
    /// Consuming group ids
    #[serde(default)]
    pub consumer_epg: BTreeSet<String>,
    /// Providing group ids
    #[serde(default)]
    pub provider_epg: BTreeSet<String>,
}

impl ContractRecord {
    /// Returns the group set for the given role.
    pub fn groups(&self, role: ContractRole) -> &BTreeSet<String> {
        match role {
            ContractRole::Consumed => &self.consumer_epg,
            ContractRole::Provided => &self.provider_epg,
        }
    }

    /// Returns the mutable group set for the given role.
    pub fn groups_mut(&mut self, role: ContractRole) -> &mut BTreeSet<String> {
        match role {
            ContractRole::Consumed => &mut self.consumer_epg,
            ContractRole::Provided => &mut self.provider_epg,
        }
    }
}
