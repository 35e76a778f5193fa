//! `CatalogStore` (C3): the exclusive owner of in-memory table and
//! tablet records, mirroring every mutation through the coordination
//! service before it becomes visible in memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{info, warn};

use tabletctl_coord::backend::{CoordBackend, NodeKind};
use tabletctl_coord::paths::table_data_path;
use tabletctl_types::{Endpoint, IndexDescriptor, Liveness, Replica, TableInfo, Tablet};

use crate::error::{CatalogError, Result};
use crate::placement::assign_partitions;
use crate::validate::{resolve_column_keys, validate_table_meta};

/// In-memory mirror plus coordination-backed persistence for tables and
/// tablets. Owns the process-wide placement RNG so partition assignment
/// is deterministic for a fixed seed across a single process lifetime.
pub struct CatalogStore<B: CoordBackend> {
    backend: Arc<B>,
    tables: Mutex<HashMap<String, TableInfo>>,
    tablets: Mutex<HashMap<Endpoint, Tablet>>,
    placement_rng: Mutex<SmallRng>,
}

impl<B: CoordBackend> CatalogStore<B> {
    pub fn new(backend: Arc<B>, placement_seed: u64) -> Self {
        Self {
            backend,
            tables: Mutex::new(HashMap::new()),
            tablets: Mutex::new(HashMap::new()),
            placement_rng: Mutex::new(SmallRng::seed_from_u64(placement_seed)),
        }
    }

    pub fn get_table(&self, name: &str) -> Option<TableInfo> {
        self.tables.lock().expect("catalog lock poisoned").get(name).cloned()
    }

    pub fn list_tables(&self) -> Vec<TableInfo> {
        self.tables
            .lock()
            .expect("catalog lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn list_tablets(&self) -> Vec<Tablet> {
        self.tablets
            .lock()
            .expect("catalog lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn upsert_tablet(&self, tablet: Tablet) {
        self.tablets
            .lock()
            .expect("catalog lock poisoned")
            .insert(tablet.endpoint.clone(), tablet);
    }

    pub fn mark_tablet_offline(&self, endpoint: &Endpoint) {
        if let Some(tablet) = self.tablets.lock().expect("catalog lock poisoned").get_mut(endpoint) {
            tablet.state = Liveness::Offline;
        }
    }

    fn live_tablet_endpoints(&self) -> Vec<Endpoint> {
        self.tablets
            .lock()
            .expect("catalog lock poisoned")
            .values()
            .filter(|t| t.is_alive())
            .map(|t| t.endpoint.clone())
            .collect()
    }

    /// Validates schema, assigns partition placement if unset, persists
    /// to the coordination service, then mirrors in memory. Fails
    /// without side effects if the name exists, schema is invalid, or
    /// replica factor exceeds the live tablet count (spec §8 boundary
    /// behavior).
    pub fn create_table(&self, mut table: TableInfo) -> Result<TableInfo> {
        if self.tables.lock().expect("catalog lock poisoned").contains_key(&table.name) {
            return Err(CatalogError::TableExists(table.name));
        }

        let violations = validate_table_meta(&table);
        if !violations.is_empty() {
            return Err(CatalogError::SchemaInvalid(violations));
        }

        let live = self.live_tablet_endpoints();
        if table.replica_factor as usize > live.len() || live.is_empty() {
            return Err(CatalogError::ReplicaFactorExceedsLiveTablets {
                requested: table.replica_factor,
                live: live.len(),
            });
        }

        if table.partitions.is_empty() {
            let mut rng = self.placement_rng.lock().expect("rng lock poisoned");
            table.partitions =
                assign_partitions(&live, table.partition_count, table.replica_factor, &mut *rng);
        }
        table.version = 0;

        let encoded = postcard::to_allocvec(&table).expect("TableInfo always encodes");
        self.backend
            .create(&table_data_path(&table.name), encoded, NodeKind::Persistent)?;

        self.tables
            .lock()
            .expect("catalog lock poisoned")
            .insert(table.name.clone(), table.clone());
        info!(table = %table.name, partitions = table.partition_count, "created table");
        Ok(table)
    }

    /// Optimistic update: reads the current record, applies `mutator`,
    /// and writes back with the version it read. Returns
    /// `CatalogError::Conflict` if another writer advanced the version
    /// first.
    pub fn update_table_info(
        &self,
        name: &str,
        mutator: impl FnOnce(&mut TableInfo),
    ) -> Result<TableInfo> {
        let mut tables = self.tables.lock().expect("catalog lock poisoned");
        let current = tables
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))?;

        let expected_version = current.version;
        let mut updated = current;
        mutator(&mut updated);
        updated.version = expected_version + 1;

        let encoded = postcard::to_allocvec(&updated).expect("TableInfo always encodes");
        match self
            .backend
            .set(&table_data_path(name), encoded, Some(expected_version))
        {
            Ok(_) => {
                tables.insert(name.to_string(), updated.clone());
                Ok(updated)
            }
            Err(tabletctl_coord::CoordError::VersionConflict { expected, actual, .. }) => {
                Err(CatalogError::Conflict {
                    table: name.to_string(),
                    expected,
                    actual,
                })
            }
            Err(other) => Err(CatalogError::from(other)),
        }
    }

    pub fn delete_table(&self, name: &str) -> Result<()> {
        let mut tables = self.tables.lock().expect("catalog lock poisoned");
        if !tables.contains_key(name) {
            return Err(CatalogError::TableNotFound(name.to_string()));
        }
        match self.backend.delete(&table_data_path(name)) {
            Ok(()) | Err(tabletctl_coord::CoordError::NodeMissing(_)) => {}
            Err(other) => return Err(CatalogError::from(other)),
        }
        tables.remove(name);
        info!(table = %name, "dropped table");
        Ok(())
    }

    pub fn add_table_field(
        &self,
        name: &str,
        column: tabletctl_types::ColumnDesc,
    ) -> Result<TableInfo> {
        self.update_table_info(name, |table| table.columns.push(column))
    }

    pub fn add_index(&self, name: &str, index: IndexDescriptor) -> Result<TableInfo> {
        let table = self
            .tables
            .lock()
            .expect("catalog lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))?;

        let violations = resolve_column_keys(&table, vec![index.clone()]);
        if !violations.is_empty() {
            return Err(CatalogError::SchemaInvalid(violations));
        }

        self.update_table_info(name, |table| table.indexes.push(index))
    }

    pub fn update_partition_status(
        &self,
        table: &str,
        pid: tabletctl_types::Pid,
        endpoint: &Endpoint,
        is_leader: bool,
        is_alive: bool,
    ) -> Result<TableInfo> {
        self.update_table_info(table, |info| {
            if let Some(partition) = info.partitions.iter_mut().find(|p| p.pid == pid) {
                if is_leader {
                    for replica in &mut partition.replicas {
                        replica.is_leader = replica.endpoint == *endpoint;
                    }
                }
                if let Some(replica) = partition.replica_mut(endpoint) {
                    replica.is_alive = is_alive;
                    if !is_leader {
                        replica.is_leader = false;
                    }
                } else {
                    warn!(%table, %pid, endpoint = %endpoint, "update_partition_status on unknown replica");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletctl_coord::memory::MemoryBackend;
    use tabletctl_types::{now_nanos, ColumnType, StorageMode, TtlConfig};

    fn store() -> CatalogStore<MemoryBackend> {
        CatalogStore::new(Arc::new(MemoryBackend::new()), 1)
    }

    fn three_tablets(catalog: &CatalogStore<MemoryBackend>) {
        for name in ["a:9527", "b:9527", "c:9527"] {
            catalog.upsert_tablet(Tablet::new_online(Endpoint::new(name), now_nanos()));
        }
    }

    fn table_info(name: &str, partitions: u32, replicas: u32) -> TableInfo {
        TableInfo {
            name: name.to_string(),
            columns: vec![tabletctl_types::ColumnDesc {
                name: "id".into(),
                column_type: ColumnType::Int64,
                nullable: false,
                is_timestamp: false,
            }],
            ttl: TtlConfig::None,
            partition_count: partitions,
            replica_factor: replicas,
            storage_mode: StorageMode::Memory,
            indexes: vec![],
            partitions: vec![],
            version: 0,
        }
    }

    #[test]
    fn create_table_persists_and_mirrors() {
        let catalog = store();
        three_tablets(&catalog);
        let created = catalog.create_table(table_info("t", 2, 2)).unwrap();
        assert_eq!(created.partitions.len(), 2);
        assert_eq!(catalog.get_table("t").unwrap().name, "t");
    }

    #[test]
    fn create_table_twice_fails_with_table_exists() {
        let catalog = store();
        three_tablets(&catalog);
        catalog.create_table(table_info("t", 1, 1)).unwrap();
        let err = catalog.create_table(table_info("t", 1, 1)).unwrap_err();
        assert!(matches!(err, CatalogError::TableExists(_)));
    }

    #[test]
    fn create_table_missing_fails_with_table_not_found_not_exists() {
        let catalog = store();
        let err = catalog.delete_table("nope").unwrap_err();
        assert!(matches!(err, CatalogError::TableNotFound(_)));
    }

    #[test]
    fn replica_factor_above_live_tablets_is_rejected_without_side_effects() {
        let catalog = store();
        three_tablets(&catalog);
        let err = catalog.create_table(table_info("t", 1, 5)).unwrap_err();
        assert!(matches!(err, CatalogError::ReplicaFactorExceedsLiveTablets { .. }));
        assert!(catalog.get_table("t").is_none());
    }

    #[test]
    fn update_table_info_detects_version_conflict() {
        let catalog = store();
        three_tablets(&catalog);
        catalog.create_table(table_info("t", 1, 1)).unwrap();

        // Simulate a stale in-hand copy by writing out-of-band first.
        catalog.update_table_info("t", |t| t.version += 0).unwrap();
        let stale_result = catalog.backend.set(
            &tabletctl_coord::paths::table_data_path("t"),
            postcard::to_allocvec(&catalog.get_table("t").unwrap()).unwrap(),
            Some(999),
        );
        assert!(stale_result.is_err());
    }

    #[test]
    fn add_index_over_unknown_column_is_rejected() {
        let catalog = store();
        three_tablets(&catalog);
        catalog.create_table(table_info("t", 1, 1)).unwrap();
        let err = catalog
            .add_index(
                "t",
                IndexDescriptor {
                    name: "idx".into(),
                    column_names: vec!["missing".into()],
                },
            )
            .unwrap_err();
        assert!(matches!(err, CatalogError::SchemaInvalid(_)));
    }
}
