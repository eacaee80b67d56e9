//! Filter record - a content-addressed set of traffic match rules.

use serde::{Deserialize, Serialize};

/// Name suffix for the "match any traffic" sentinel filter.
const ANY_SUFFIX: &str = "any";

/// A named, immutable set of port match rules, or the "any traffic" sentinel.
///
/// Identity is content-addressed: the name is derived from the tenant and the
/// sorted, deduplicated port list, so two contracts with the same rule set
/// resolve to the same filter and a changed rule set yields a new filter
/// rather than an in-place mutation. Empty `entries` means "match any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRecord {
    /// Content-addressed name (`<tenant>-any` or `<tenant>-<p1>-<p2>-...`)
    pub name: String,
    /// Owning tenant
    pub tenant: String,
    /// Sorted destination ports; each port matches one TCP and one UDP rule
    #[serde(default)]
    pub entries: Vec<u16>,
}

impl FilterRecord {
    /// The "match any traffic" sentinel for a tenant.
    pub fn any(tenant: impl Into<String>) -> Self {
        let tenant = tenant.into();
        Self {
            name: format!("{}-{}", tenant, ANY_SUFFIX),
            tenant,
            entries: Vec::new(),
        }
    }

    /// Builds the record for a concrete port list. Ports are sorted and
    /// deduplicated before the name is derived so that rule-set identity is
    /// order-insensitive. An empty list degenerates to the sentinel.
    pub fn from_ports(tenant: impl Into<String>, ports: &[u16]) -> Self {
        let mut entries: Vec<u16> = ports.to_vec();
        entries.sort_unstable();
        entries.dedup();
        if entries.is_empty() {
            return Self::any(tenant);
        }

        let tenant = tenant.into();
        let name = std::iter::once(tenant.clone())
            .chain(entries.iter().map(u16::to_string))
            .collect::<Vec<_>>()
            .join("-");
        Self {
            name,
            tenant,
            entries,
        }
    }

    /// True for the "match any traffic" sentinel.
    pub fn is_any(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_sentinel_name() {
        let f = FilterRecord::any("prod");
        assert_eq!(f.name, "prod-any");
        assert!(f.is_any());
    }

    #[test]
    fn test_name_is_order_insensitive() {
        let a = FilterRecord::from_ports("prod", &[443, 80]);
        let b = FilterRecord::from_ports("prod", &[80, 443]);
        assert_eq!(a, b);
        assert_eq!(a.name, "prod-80-443");
    }

    #[test]
    fn test_duplicate_ports_collapse() {
        let f = FilterRecord::from_ports("prod", &[80, 80, 443]);
        assert_eq!(f.entries, vec![80, 443]);
        assert_eq!(f.name, "prod-80-443");
    }

    #[test]
    fn test_empty_port_list_is_sentinel() {
        let f = FilterRecord::from_ports("prod", &[]);
        assert_eq!(f, FilterRecord::any("prod"));
    }
}
