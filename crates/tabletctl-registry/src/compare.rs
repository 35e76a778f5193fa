//! `CompareTableInfo`: decides whether a local and a peer cluster's view
//! of a table agree well enough to skip synchronization.

use tabletctl_types::TableInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCompareResult {
    InSync,
    /// The peer does not have this table at all.
    MissingOnPeer,
    /// The peer has the table but its schema or partition count differs.
    Diverged,
}

/// Compares a locally owned `TableInfo` against the peer's reported
/// copy. Partition replica placement is intentionally excluded from the
/// comparison — each cluster places replicas over its own tablet fleet
/// independently; only schema-affecting fields must agree.
pub fn compare_table_info(local: &TableInfo, remote: Option<&TableInfo>) -> TableCompareResult {
    let Some(remote) = remote else {
        return TableCompareResult::MissingOnPeer;
    };

    let schema_matches = local.columns == remote.columns
        && local.ttl == remote.ttl
        && local.partition_count == remote.partition_count
        && local.indexes == remote.indexes;

    if schema_matches {
        TableCompareResult::InSync
    } else {
        TableCompareResult::Diverged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletctl_types::{ColumnDesc, ColumnType, StorageMode, TtlConfig};

    fn table(name: &str, partitions: u32) -> TableInfo {
        TableInfo {
            name: name.to_string(),
            columns: vec![ColumnDesc {
                name: "id".into(),
                column_type: ColumnType::Int64,
                nullable: false,
                is_timestamp: false,
            }],
            ttl: TtlConfig::None,
            partition_count: partitions,
            replica_factor: 1,
            storage_mode: StorageMode::Memory,
            indexes: vec![],
            partitions: vec![],
            version: 0,
        }
    }

    #[test]
    fn missing_on_peer_when_remote_absent() {
        assert_eq!(
            compare_table_info(&table("t", 1), None),
            TableCompareResult::MissingOnPeer
        );
    }

    #[test]
    fn in_sync_when_schema_matches() {
        let local = table("t", 2);
        let remote = table("t", 2);
        assert_eq!(
            compare_table_info(&local, Some(&remote)),
            TableCompareResult::InSync
        );
    }

    #[test]
    fn diverged_when_partition_count_differs() {
        let local = table("t", 2);
        let remote = table("t", 4);
        assert_eq!(
            compare_table_info(&local, Some(&remote)),
            TableCompareResult::Diverged
        );
    }
}
