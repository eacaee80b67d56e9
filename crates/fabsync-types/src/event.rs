//! Event envelope and payloads consumed from the change stream.
//!
//! Every message carries `uuid`, `status`, and `msg_type` plus type-specific
//! fields. Status and type are closed enums: a value outside the known set
//! fails classification instead of falling through silently.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::FilterRecord;

/// Errors raised while classifying a raw stream message.
#[derive(Debug, Error)]
pub enum EventError {
    /// Envelope or payload did not match the expected shape
    /// (includes unknown `msg_type` and unknown `status` values).
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `filter_entries` carried a string other than the "ANY" sentinel.
    #[error("unsupported filter_entries sentinel '{0}'")]
    BadFilterEntries(String),
}

/// Lifecycle status of the entity named by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Create,
    Update,
    Delete,
}

impl EventStatus {
    /// True for create and update, which share the upsert path.
    pub fn is_upsert(&self) -> bool {
        matches!(self, EventStatus::Create | EventStatus::Update)
    }
}

/// Endpoint lifecycle payload. All fields are optional: create/update merges
/// whatever the message carries into the stored record field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EndpointEvent {
    #[serde(default)]
    pub name: Option<String>,
    /// Event-source foreign key for this device
    #[serde(default)]
    pub sys_id: Option<String>,
    /// Group reference, by internal group id
    #[serde(default)]
    pub epg: Option<String>,
}

/// Group lifecycle payload. `members` lists event-source foreign keys, not
/// internal endpoint ids; the reconciler resolves them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GroupEvent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Port match rules carried by a contract event: either a concrete port list
/// or the "ANY" sentinel (also the default when the field is omitted).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FilterEntries {
    Ports(Vec<u16>),
    Sentinel(String),
}

impl Default for FilterEntries {
    fn default() -> Self {
        FilterEntries::Sentinel("ANY".to_string())
    }
}

impl FilterEntries {
    /// Resolves the rules into a content-addressed filter record for the
    /// tenant. A sentinel string other than "ANY" is rejected.
    pub fn resolve(&self, tenant: &str) -> Result<FilterRecord, EventError> {
        match self {
            FilterEntries::Sentinel(s) if s.eq_ignore_ascii_case("any") => {
                Ok(FilterRecord::any(tenant))
            }
            FilterEntries::Sentinel(s) => Err(EventError::BadFilterEntries(s.clone())),
            FilterEntries::Ports(ports) => Ok(FilterRecord::from_ports(tenant, ports)),
        }
    }
}

/// Contract lifecycle payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContractEvent {
    #[serde(default)]
    pub name: String,
    /// Consuming group ids; a bare string is accepted as a one-element list
    #[serde(default, deserialize_with = "string_or_seq")]
    pub consumer_epg: Vec<String>,
    /// Providing group ids; a bare string is accepted as a one-element list
    #[serde(default, deserialize_with = "string_or_seq")]
    pub provider_epg: Vec<String>,
    #[serde(default)]
    pub filter_entries: FilterEntries,
    /// Raw action value ("ALLOW"/"DENY"); normalized by the handler
    #[serde(default)]
    pub action: Option<String>,
}

/// Type-specific payload, dispatched on the `msg_type` envelope field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "msg_type")]
pub enum EventPayload {
    #[serde(rename = "ep")]
    Endpoint(EndpointEvent),
    #[serde(rename = "epg")]
    Group(GroupEvent),
    #[serde(rename = "contract")]
    Contract(ContractEvent),
}

impl EventPayload {
    /// Payload kind for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::Endpoint(_) => "endpoint",
            EventPayload::Group(_) => "group",
            EventPayload::Contract(_) => "contract",
        }
    }
}

/// A classified stream message: entity id, lifecycle status, typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Entity id (the message's `uuid` field)
    pub id: String,
    pub status: EventStatus,
    pub payload: EventPayload,
}

impl EventEnvelope {
    /// Classifies a raw JSON message. Unknown `msg_type` or `status` values
    /// and missing required envelope fields are classification errors.
    pub fn parse(raw: &str) -> Result<Self, EventError> {
        #[derive(Deserialize)]
        struct Raw {
            uuid: String,
            status: EventStatus,
            #[serde(flatten)]
            payload: EventPayload,
        }

        let raw: Raw = serde_json::from_str(raw)?;
        Ok(Self {
            id: raw.uuid,
            status: raw.status,
            payload: raw.payload,
        })
    }
}

/// Accepts either a bare string or a list of strings. The event source sends
/// a single group id for one-party contracts.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_endpoint_event() {
        let env = EventEnvelope::parse(
            r#"{"uuid":"ep1","status":"create","msg_type":"ep","name":"web-01","sys_id":"s1"}"#,
        )
        .unwrap();

        assert_eq!(env.id, "ep1");
        assert_eq!(env.status, EventStatus::Create);
        match env.payload {
            EventPayload::Endpoint(ep) => {
                assert_eq!(ep.name.as_deref(), Some("web-01"));
                assert_eq!(ep.sys_id.as_deref(), Some("s1"));
                assert_eq!(ep.epg, None);
            }
            other => panic!("wrong payload: {:?}", other),
        }
    }

    #[test]
    fn test_parse_group_event_defaults_members() {
        let env = EventEnvelope::parse(
            r#"{"uuid":"g1","status":"create","msg_type":"epg","name":"web"}"#,
        )
        .unwrap();
        match env.payload {
            EventPayload::Group(g) => {
                assert_eq!(g.name, "web");
                assert!(g.members.is_empty());
            }
            other => panic!("wrong payload: {:?}", other),
        }
    }

    #[test]
    fn test_parse_contract_event_full() {
        let env = EventEnvelope::parse(
            r#"{"uuid":"c1","status":"create","msg_type":"contract","name":"allow-web",
                "consumer_epg":["g1"],"provider_epg":["g1"],
                "filter_entries":[80,443],"action":"ALLOW"}"#,
        )
        .unwrap();
        match env.payload {
            EventPayload::Contract(c) => {
                assert_eq!(c.consumer_epg, vec!["g1".to_string()]);
                assert_eq!(c.provider_epg, vec!["g1".to_string()]);
                assert_eq!(c.filter_entries, FilterEntries::Ports(vec![80, 443]));
                assert_eq!(c.action.as_deref(), Some("ALLOW"));
            }
            other => panic!("wrong payload: {:?}", other),
        }
    }

    #[test]
    fn test_single_string_epg_coerces_to_list() {
        let env = EventEnvelope::parse(
            r#"{"uuid":"c1","status":"update","msg_type":"contract","name":"n",
                "consumer_epg":"g1","provider_epg":"g2"}"#,
        )
        .unwrap();
        match env.payload {
            EventPayload::Contract(c) => {
                assert_eq!(c.consumer_epg, vec!["g1".to_string()]);
                assert_eq!(c.provider_epg, vec!["g2".to_string()]);
            }
            other => panic!("wrong payload: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_msg_type_is_error() {
        let err = EventEnvelope::parse(r#"{"uuid":"x","status":"create","msg_type":"vm"}"#);
        assert!(matches!(err, Err(EventError::Malformed(_))));
    }

    #[test]
    fn test_unknown_status_is_error() {
        let err = EventEnvelope::parse(
            r#"{"uuid":"x","status":"upsert","msg_type":"ep","name":"n"}"#,
        );
        assert!(matches!(err, Err(EventError::Malformed(_))));
    }

    #[test]
    fn test_filter_entries_sentinel_resolution() {
        assert_eq!(
            FilterEntries::Sentinel("ANY".to_string())
                .resolve("prod")
                .unwrap(),
            FilterRecord::any("prod")
        );
        assert_eq!(
            FilterEntries::default().resolve("prod").unwrap(),
            FilterRecord::any("prod")
        );
        assert!(matches!(
            FilterEntries::Sentinel("ALL".to_string()).resolve("prod"),
            Err(EventError::BadFilterEntries(_))
        ));
    }

    #[test]
    fn test_filter_entries_ports_resolution() {
        let f = FilterEntries::Ports(vec![443, 80]).resolve("prod").unwrap();
        assert_eq!(f.name, "prod-80-443");
        assert_eq!(f.entries, vec![80, 443]);
    }

    #[test]
    fn test_status_is_upsert() {
        assert!(EventStatus::Create.is_upsert());
        assert!(EventStatus::Update.is_upsert());
        assert!(!EventStatus::Delete.is_upsert());
    }
}
