//! Catalog entities: tablets, tables, partitions, and replicas.
//!
//! Mirrors `spec.md` §3 DATA MODEL. These are the types the Catalog Store
//! (`tabletctl-catalog`) mirrors in memory and persists through the
//! coordination-service client (`tabletctl-coord`).

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::ids::{Endpoint, Pid, Term};

/// Liveness state of a tablet or blob server, as observed by the
/// membership watcher (C2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Liveness {
    Healthy,
    Offline,
}

/// A data-plane server hosting partition replicas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tablet {
    pub endpoint: Endpoint,
    pub state: Liveness,
    /// Nanoseconds since Unix epoch when this tablet was first observed.
    pub first_seen_nanos: u64,
}

impl Tablet {
    pub fn new_online(endpoint: Endpoint, now_nanos: u64) -> Self {
        Self {
            endpoint,
            state: Liveness::Healthy,
            first_seen_nanos: now_nanos,
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.state, Liveness::Healthy)
    }
}

/// A blob-object-store server; identical shape to [`Tablet`], serving
/// large-object partitions (spec.md §3).
pub type BlobServer = Tablet;

/// Returns nanoseconds since the Unix epoch. Centralized so callers don't
/// sprinkle `SystemTime::now()` unwraps through the catalog.
pub fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before Unix epoch")
        .as_nanos() as u64
}

/// Storage backend a table's partitions are served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageMode {
    Memory,
    Disk,
    Blob,
}

/// A scalar column type. Kept intentionally small — schema evolution and
/// type-checking belong to the (out-of-scope) query planner; the name
/// server only needs enough typing to validate DDL and route TTL logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Bool,
    Int32,
    Int64,
    Float,
    Double,
    String,
    Timestamp,
    Blob,
}

/// TTL policy for a table, keyed off the designated timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TtlConfig {
    /// No expiry.
    None,
    /// Rows older than `ttl_minutes` relative to wall-clock are expired.
    /// Requires exactly one timestamp column (spec.md §4.3 CheckTableMeta).
    Absolute { ttl_minutes: u64 },
    /// Keep only the latest `max_versions` per key, independent of wall
    /// clock.
    Latest { max_versions: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDesc {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    /// True if this column is the table's designated timestamp column.
    pub is_timestamp: bool,
}

/// A named, ordered secondary index over a subset of a table's columns.
///
/// Grounded on `FillColumnKey`/column-key resolution in the original
/// `NameServerImpl::CreateTableInfo` — index descriptors are resolved and
/// validated against the schema at table-creation/field-add time, not
/// deferred to the tablet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub column_names: Vec<String>,
}

/// A single replica of a partition, hosted on one tablet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replica {
    pub endpoint: Endpoint,
    pub is_leader: bool,
    pub is_alive: bool,
    /// Last log offset reported by the tablet for this replica.
    pub offset: u64,
}

impl Replica {
    pub fn new_follower(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            is_leader: false,
            is_alive: true,
            offset: 0,
        }
    }

    pub fn new_leader(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            is_leader: true,
            is_alive: true,
            offset: 0,
        }
    }
}

/// A shard of a table (spec GLOSSARY: "Partition").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub pid: Pid,
    pub term: Term,
    pub replicas: Vec<Replica>,
}

impl Partition {
    pub fn new(pid: Pid, replicas: Vec<Replica>) -> Self {
        Self {
            pid,
            term: Term::ZERO,
            replicas,
        }
    }

    /// The replica currently serving as leader, if any (I2: at most one).
    pub fn leader(&self) -> Option<&Replica> {
        self.replicas.iter().find(|r| r.is_leader && r.is_alive)
    }

    pub fn replica(&self, endpoint: &Endpoint) -> Option<&Replica> {
        self.replicas.iter().find(|r| &r.endpoint == endpoint)
    }

    pub fn replica_mut(&mut self, endpoint: &Endpoint) -> Option<&mut Replica> {
        self.replicas.iter_mut().find(|r| &r.endpoint == endpoint)
    }

    /// Returns true iff invariant I2 holds: at most one alive leader.
    pub fn at_most_one_live_leader(&self) -> bool {
        self.replicas
            .iter()
            .filter(|r| r.is_leader && r.is_alive)
            .count()
            <= 1
    }
}

/// Table metadata: schema, partitioning, and replication factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnDesc>,
    pub ttl: TtlConfig,
    /// Number of partitions `P`.
    pub partition_count: u32,
    /// Replication factor `R`.
    pub replica_factor: u32,
    pub storage_mode: StorageMode,
    pub indexes: Vec<IndexDescriptor>,
    pub partitions: Vec<Partition>,
    /// Optimistic-concurrency version, bumped on every persisted write
    /// (`UpdateTableInfo` in spec.md §4.3).
    pub version: u64,
}

impl TableInfo {
    /// Total replica record count the catalog expects for this table
    /// (invariant I1: `P * R` replica records).
    pub fn expected_replica_count(&self) -> usize {
        self.partition_count as usize * self.replica_factor as usize
    }

    pub fn actual_replica_count(&self) -> usize {
        self.partitions.iter().map(|p| p.replicas.len()).sum()
    }

    pub fn timestamp_column(&self) -> Option<&ColumnDesc> {
        self.columns.iter().find(|c| c.is_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replica(endpoint: &str, leader: bool, alive: bool) -> Replica {
        Replica {
            endpoint: Endpoint::new(endpoint),
            is_leader: leader,
            is_alive: alive,
            offset: 0,
        }
    }

    #[test]
    fn partition_leader_requires_alive_and_leader_flags() {
        let p = Partition::new(
            Pid::new(0),
            vec![replica("a", true, false), replica("b", false, true)],
        );
        assert!(p.leader().is_none());
        assert!(p.at_most_one_live_leader());
    }

    #[test]
    fn partition_detects_dual_leader_violation() {
        let p = Partition::new(
            Pid::new(0),
            vec![replica("a", true, true), replica("b", true, true)],
        );
        assert!(!p.at_most_one_live_leader());
    }

    #[test]
    fn table_expected_replica_count_is_p_times_r() {
        let table = TableInfo {
            name: "t".into(),
            columns: vec![],
            ttl: TtlConfig::None,
            partition_count: 4,
            replica_factor: 3,
            storage_mode: StorageMode::Memory,
            indexes: vec![],
            partitions: vec![],
            version: 0,
        };
        assert_eq!(table.expected_replica_count(), 12);
    }
}
