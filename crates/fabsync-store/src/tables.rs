//! Table name constants for the state store.

/// Endpoint records, keyed by internal id
pub const ENDPOINT_TABLE_NAME: &str = "ENDPOINT_TABLE";

/// Endpoint group records, keyed by internal id
pub const EPG_TABLE_NAME: &str = "EPG_TABLE";

/// Contract records, keyed by internal id
pub const CONTRACT_TABLE_NAME: &str = "CONTRACT_TABLE";

/// Filter records, keyed by content-addressed name
pub const FILTER_TABLE_NAME: &str = "FILTER_TABLE";

/// Foreign-key index: event-source sys_id -> internal endpoint id.
/// Owned by the store; the mapping is never inferred anywhere else.
pub const ENDPOINT_SYSID_MAP_NAME: &str = "ENDPOINT_SYSID_MAP";

/// Builds the record key for a table entry.
pub fn record_key(table: &str, id: &str) -> String {
    format!("{}:{}", table, id)
}
