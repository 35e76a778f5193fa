//! Replica-cluster registry types (spec.md §4.4): peer clusters this
//! name server replicates to or from.

use serde::{Deserialize, Serialize};

use crate::ids::Term;

/// Health of a peer cluster as last observed by `CheckClusterInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterHealth {
    Healthy,
    Unhealthy,
}

/// Identity of a coordination-service zone, read from `zone_data/<zone>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub zone_name: String,
    pub replica_cluster_role: ReplicaClusterRole,
}

/// Role this name server plays with respect to a given zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplicaClusterRole {
    Leader,
    Follower,
}

/// A registered peer cluster (spec.md §4.4): alias, ensemble address, and
/// last-known health/term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub alias: String,
    pub zk_endpoints: String,
    pub zk_root_path: String,
    pub health: ClusterHealth,
    /// Fencing term supplied by the peer's `term_node`, bumped on every
    /// `AddReplicaClusterByNs`/`RemoveReplicaClusterByNs` handshake.
    pub term: Term,
    /// Tables this cluster is the source of truth for, as of the last
    /// `CheckClusterInfo` refresh.
    pub last_known_tables: Vec<String>,
}

impl ClusterInfo {
    pub fn new(alias: impl Into<String>, zk_endpoints: impl Into<String>, zk_root_path: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            zk_endpoints: zk_endpoints.into(),
            zk_root_path: zk_root_path.into(),
            health: ClusterHealth::Healthy,
            term: Term::ZERO,
            last_known_tables: Vec::new(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.health, ClusterHealth::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cluster_starts_healthy_at_term_zero() {
        let c = ClusterInfo::new("dr", "zk1:2181,zk2:2181", "/tabletctl");
        assert!(c.is_healthy());
        assert_eq!(c.term, Term::ZERO);
    }
}
