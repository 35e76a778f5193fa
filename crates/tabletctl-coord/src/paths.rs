//! Node-path helpers for the coordination-service layout (spec §6).
//!
//! Every path is rooted under the cluster's configured root (e.g.
//! `/tabletctl`); these helpers just build the suffix so callers never
//! hand-format a path string.

use tabletctl_types::Endpoint;

pub const TABLE_INDEX_NODE: &str = "table_index_node";
pub const TERM_NODE: &str = "term_node";
pub const OP_INDEX_NODE: &str = "op_index_node";
pub const AUTO_FAILOVER_NODE: &str = "auto_failover_node";
pub const AUTO_RECOVER_TABLE_NODE: &str = "auto_recover_table_node";
pub const TABLE_CHANGED_NOTIFY_NODE: &str = "table_changed_notify_node";
pub const TABLETS_DIR: &str = "tablets";
pub const BLOB_SERVERS_DIR: &str = "blob_servers";
pub const TABLE_DATA_DIR: &str = "table_data";
pub const OP_DATA_DIR: &str = "op_data";
pub const OP_SYNC_DIR: &str = "op_sync";
pub const ZONE_DATA_DIR: &str = "zone_data";
pub const OFFLINE_ENDPOINT_LOCK_DIR: &str = "offline_endpoint_lock";
pub const LEADER_LOCK_NODE: &str = "leader_lock";

pub fn table_data_path(table: &str) -> String {
    format!("{TABLE_DATA_DIR}/{table}")
}

pub fn op_data_path(op_id: u64) -> String {
    format!("{OP_DATA_DIR}/{op_id}")
}

pub fn op_sync_path(op_id: u64) -> String {
    format!("{OP_SYNC_DIR}/{op_id}")
}

pub fn zone_data_path(zone: &str) -> String {
    format!("{ZONE_DATA_DIR}/{zone}")
}

pub fn tablet_path(endpoint: &Endpoint) -> String {
    format!("{TABLETS_DIR}/{}", endpoint.as_str())
}

pub fn blob_server_path(endpoint: &Endpoint) -> String {
    format!("{BLOB_SERVERS_DIR}/{}", endpoint.as_str())
}

pub fn offline_endpoint_lock_path(endpoint: &Endpoint) -> String {
    format!("{OFFLINE_ENDPOINT_LOCK_DIR}/{}", endpoint.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_builders_are_stable() {
        assert_eq!(table_data_path("t"), "table_data/t");
        assert_eq!(op_data_path(7), "op_data/7");
        assert_eq!(
            tablet_path(&Endpoint::new("10.0.0.1:9527")),
            "tablets/10.0.0.1:9527"
        );
    }
}
