//! Managed-object request paths and attribute trees.
//!
//! Every request body is a nested tree keyed by the target object's class
//! name; the `status` attribute carries the lifecycle tag. Filters nest their
//! rule entries as `children`.

use serde_json::{json, Value};

use fabsync_types::{ContractAction, ContractRole, FilterRecord};

use crate::{FilterBinding, LifecycleStatus};

/// Fixed name of the one subject object nested under every contract.
pub(crate) const SUBJECT_NAME: &str = "contract-subject";

/// Path to a group object under the tenant's application profile.
pub(crate) fn epg_path(tenant: &str, ap: &str, epg: &str) -> String {
    format!("/api/node/mo/uni/tn-{}/ap-{}/epg-{}.json", tenant, ap, epg)
}

/// Path to a contract object under the tenant.
pub(crate) fn contract_path(tenant: &str, contract: &str) -> String {
    format!("/api/node/mo/uni/tn-{}/brc-{}.json", tenant, contract)
}

/// Path to a contract's subject, the attachment point for filter swaps.
pub(crate) fn subject_path(tenant: &str, contract: &str) -> String {
    format!(
        "/api/node/mo/uni/tn-{}/brc-{}/subj-{}.json",
        tenant, contract, SUBJECT_NAME
    )
}

/// Path to a filter object under the tenant.
pub(crate) fn filter_path(tenant: &str, filter: &str) -> String {
    format!("/api/node/mo/uni/tn-{}/flt-{}.json", tenant, filter)
}

/// Group container object (`fvAEPg`).
pub(crate) fn epg_payload(epg: &str, status: LifecycleStatus) -> Value {
    json!({
        "fvAEPg": {
            "attributes": {
                "name": epg,
                "status": status.as_str(),
            }
        }
    })
}

/// Contract object (`vzBrCP`) with its nested subject. The filter attachment
/// child is included only when the contract is not being deleted.
pub(crate) fn contract_payload(
    contract: &str,
    binding: Option<&FilterBinding>,
    status: LifecycleStatus,
) -> Value {
    let mut subject = json!({
        "vzSubj": {
            "attributes": {
                "name": SUBJECT_NAME,
                "status": status.as_str(),
            }
        }
    });

    if let Some(binding) = binding.filter(|_| !status.is_deleted()) {
        subject["vzSubj"]["children"] = json!([filter_attachment(
            &binding.filter_name,
            binding.action,
            status
        )]);
    }

    json!({
        "vzBrCP": {
            "attributes": {
                "name": contract,
                "status": status.as_str(),
            },
            "children": [subject]
        }
    })
}

/// Subject update swapping one filter attachment for another in a single
/// request: the old attachment carries status `deleted`, the new one
/// `created,modified`.
pub(crate) fn filter_swap_payload(
    old_filter: &str,
    new_filter: &str,
    action: ContractAction,
) -> Value {
    json!({
        "vzSubj": {
            "attributes": {
                "name": SUBJECT_NAME,
                "status": LifecycleStatus::CreatedModified.as_str(),
            },
            "children": [
                filter_attachment(old_filter, action, LifecycleStatus::Deleted),
                filter_attachment(new_filter, action, LifecycleStatus::CreatedModified),
            ]
        }
    })
}

fn filter_attachment(filter: &str, action: ContractAction, status: LifecycleStatus) -> Value {
    json!({
        "vzRsSubjFiltAtt": {
            "attributes": {
                "status": status.as_str(),
                "tnVzFilterName": filter,
                "directives": "none",
                "action": action.as_str(),
            }
        }
    })
}

/// Filter object (`vzFilter`) with one rule entry per protocol/port pair,
/// or the single wildcard entry for the "any traffic" sentinel.
pub(crate) fn filter_payload(filter: &FilterRecord, status: LifecycleStatus) -> Value {
    let entries: Vec<Value> = if filter.is_any() {
        vec![json!({
            "vzEntry": {
                "attributes": {
                    "name": "any",
                    "status": status.as_str(),
                }
            }
        })]
    } else {
        filter
            .entries
            .iter()
            .flat_map(|port| {
                ["tcp", "udp"].into_iter().map(move |prot| {
                    json!({
                        "vzEntry": {
                            "attributes": {
                                "name": format!("{}_{}", prot, port),
                                "etherT": "ip",
                                "prot": prot,
                                "dFromPort": port,
                                "dToPort": port,
                                "status": status.as_str(),
                            }
                        }
                    })
                })
            })
            .collect()
    };

    json!({
        "vzFilter": {
            "attributes": {
                "name": filter.name,
                "status": status.as_str(),
            },
            "children": entries
        }
    })
}

/// Group-to-contract attachment (`fvRsCons`/`fvRsProv`), posted against the
/// group's own path.
pub(crate) fn contract_attach_payload(
    role: ContractRole,
    contract: &str,
    status: LifecycleStatus,
) -> Value {
    let body = json!({
        "attributes": {
            "tnVzBrCPName": contract,
            "status": status.as_str(),
        }
    });
    let mut root = serde_json::Map::new();
    root.insert(role.object_class().to_string(), body);
    Value::Object(root)
}
