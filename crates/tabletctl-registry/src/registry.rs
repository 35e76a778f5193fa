//! `ClusterRegistry` (C4): peer replica clusters, their handshake
//! fencing terms, and the periodic health/sync comparison.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use tabletctl_catalog::CatalogStore;
use tabletctl_coord::CoordBackend;
use tabletctl_types::{ClusterHealth, ClusterInfo, Term};

use crate::compare::{compare_table_info, TableCompareResult};
use crate::error::{RegistryError, Result};
use crate::ns_client::NsClient;

struct ClusterEntry {
    info: ClusterInfo,
    ns_client: Arc<dyn NsClient>,
}

/// Outcome of a `CheckClusterInfo` refresh against one peer cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSyncOutcome {
    pub alias: String,
    /// Tables that diverged or are missing on the peer and should get a
    /// `SyncTable` OP (only when local is the source of truth).
    pub tables_needing_sync: Vec<String>,
    pub health: ClusterHealth,
}

/// Registry of peer clusters this name server replicates to or from.
pub struct ClusterRegistry {
    entries: Mutex<HashMap<String, ClusterEntry>>,
}

impl ClusterRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// `AddReplicaClusterByNs`: registers a peer cluster with a fencing
    /// term supplied by the peer's `term_node`. Rejects a handshake
    /// whose term does not exceed any term already recorded for this
    /// alias (stale retried handshake).
    pub fn add_replica_cluster_by_ns(
        &self,
        alias: impl Into<String>,
        zk_endpoints: impl Into<String>,
        zk_root_path: impl Into<String>,
        handshake_term: Term,
        ns_client: Arc<dyn NsClient>,
    ) -> Result<()> {
        let alias = alias.into();
        let mut entries = self.entries.lock().expect("registry lock poisoned");

        if let Some(existing) = entries.get(&alias) {
            if handshake_term <= existing.info.term {
                return Err(RegistryError::StaleTerm {
                    alias,
                    handshake: handshake_term.as_u64(),
                    registry: existing.info.term.as_u64(),
                });
            }
        }

        let mut info = ClusterInfo::new(alias.clone(), zk_endpoints, zk_root_path);
        info.term = handshake_term;
        entries.insert(alias.clone(), ClusterEntry { info, ns_client });
        info!(%alias, term = %handshake_term, "registered replica cluster");
        Ok(())
    }

    /// `RemoveReplicaClusterByNs`: tears down a peer cluster registration.
    /// Rejects a handshake whose term is not newer than the registered
    /// one, same fencing discipline as add.
    pub fn remove_replica_cluster_by_ns(&self, alias: &str, handshake_term: Term) -> Result<()> {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        let existing = entries
            .get(alias)
            .ok_or_else(|| RegistryError::AliasMissing(alias.to_string()))?;
        if handshake_term <= existing.info.term {
            return Err(RegistryError::StaleTerm {
                alias: alias.to_string(),
                handshake: handshake_term.as_u64(),
                registry: existing.info.term.as_u64(),
            });
        }
        entries.remove(alias);
        info!(%alias, "removed replica cluster");
        Ok(())
    }

    pub fn get(&self, alias: &str) -> Option<ClusterInfo> {
        self.entries
            .lock()
            .expect("registry lock poisoned")
            .get(alias)
            .map(|e| e.info.clone())
    }

    pub fn list(&self) -> Vec<ClusterInfo> {
        self.entries
            .lock()
            .expect("registry lock poisoned")
            .values()
            .map(|e| e.info.clone())
            .collect()
    }

    /// `CheckClusterInfo`: pulls the peer's table list and compares each
    /// locally owned table against it, marking the cluster healthy or
    /// unhealthy based on RPC reachability and collecting tables that
    /// need a `SyncTable` OP.
    pub fn refresh_and_compare<B: CoordBackend>(
        &self,
        alias: &str,
        catalog: &CatalogStore<B>,
    ) -> Result<ClusterSyncOutcome> {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        let entry = entries
            .get_mut(alias)
            .ok_or_else(|| RegistryError::AliasMissing(alias.to_string()))?;

        match entry.ns_client.list_tables() {
            Ok(remote_tables) => {
                entry.info.health = ClusterHealth::Healthy;
                entry.info.last_known_tables = remote_tables.iter().map(|t| t.name.clone()).collect();

                let remote_by_name: HashMap<_, _> =
                    remote_tables.iter().map(|t| (t.name.as_str(), t)).collect();

                let tables_needing_sync = catalog
                    .list_tables()
                    .into_iter()
                    .filter(|local| {
                        !matches!(
                            compare_table_info(local, remote_by_name.get(local.name.as_str()).copied()),
                            TableCompareResult::InSync
                        )
                    })
                    .map(|t| t.name)
                    .collect();

                Ok(ClusterSyncOutcome {
                    alias: alias.to_string(),
                    tables_needing_sync,
                    health: ClusterHealth::Healthy,
                })
            }
            Err(message) => {
                entry.info.health = ClusterHealth::Unhealthy;
                warn!(%alias, error = %message, "replica cluster unreachable");
                Ok(ClusterSyncOutcome {
                    alias: alias.to_string(),
                    tables_needing_sync: Vec::new(),
                    health: ClusterHealth::Unhealthy,
                })
            }
        }
    }
}

impl Default for ClusterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ns_client::TaskStatusSummary;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tabletctl_coord::MemoryBackend;
    use tabletctl_types::OpId;

    struct FakeNsClient {
        tables: Vec<tabletctl_types::TableInfo>,
        healthy: AtomicBool,
    }

    impl NsClient for FakeNsClient {
        fn list_tables(&self) -> std::result::Result<Vec<tabletctl_types::TableInfo>, String> {
            if self.healthy.load(Ordering::SeqCst) {
                Ok(self.tables.clone())
            } else {
                Err("connection refused".to_string())
            }
        }

        fn create_table_remote(&self, _table: &tabletctl_types::TableInfo) -> std::result::Result<(), String> {
            Ok(())
        }

        fn drop_table_remote(&self, _table: &str) -> std::result::Result<(), String> {
            Ok(())
        }

        fn sync_table(&self, _table: &str) -> std::result::Result<(), String> {
            Ok(())
        }

        fn get_task_status(&self, op_id: OpId) -> std::result::Result<TaskStatusSummary, String> {
            Ok(TaskStatusSummary {
                op_id,
                done: true,
                failed: false,
            })
        }

        fn delete_op_task(&self, _op_id: OpId) -> std::result::Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn add_then_remove_requires_strictly_increasing_term() {
        let registry = ClusterRegistry::new();
        let client = Arc::new(FakeNsClient {
            tables: vec![],
            healthy: AtomicBool::new(true),
        });
        registry
            .add_replica_cluster_by_ns("dr", "zk1:2181", "/tabletctl", Term::new(1), client.clone())
            .unwrap();

        let err = registry
            .remove_replica_cluster_by_ns("dr", Term::new(1))
            .unwrap_err();
        assert!(matches!(err, RegistryError::StaleTerm { .. }));

        registry
            .remove_replica_cluster_by_ns("dr", Term::new(2))
            .unwrap();
        assert!(registry.get("dr").is_none());
    }

    #[test]
    fn refresh_marks_cluster_unhealthy_on_rpc_failure() {
        let registry = ClusterRegistry::new();
        let catalog = CatalogStore::new(Arc::new(MemoryBackend::new()), 1);
        let client = Arc::new(FakeNsClient {
            tables: vec![],
            healthy: AtomicBool::new(false),
        });
        registry
            .add_replica_cluster_by_ns("dr", "zk1:2181", "/tabletctl", Term::new(1), client)
            .unwrap();

        let outcome = registry.refresh_and_compare("dr", &catalog).unwrap();
        assert_eq!(outcome.health, ClusterHealth::Unhealthy);
    }
}
