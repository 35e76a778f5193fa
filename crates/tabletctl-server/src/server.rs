//! `NameServer`: wires C1 (coordination client) through C7 (reconciler)
//! into one daemon object, and carries the lifecycle (acquire lock, run,
//! stand down) the binary and integration tests both drive.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use tabletctl_catalog::CatalogStore;
use tabletctl_config::NameServerConfig;
use tabletctl_coord::{CoordBackend, CoordClient};
use tabletctl_reconciler::{Reconciler, ReconcilerIntervals};
use tabletctl_registry::ClusterRegistry;
use tabletctl_scheduler::{FakeTabletClient, OpScheduler, TabletClient};

/// Fixed seed for deterministic replica placement shuffling
/// (`assign_partitions`). A production deployment would likely derive
/// this from the coordination-service session id; this repo has no such
/// session, so a constant keeps placement reproducible across restarts.
const PLACEMENT_SEED: u64 = 0x5EED_5EED;

/// Periodic jobs not covered by `NameServerConfig`'s tunables get a
/// fixed cadence; they observe scheduler/catalog state that changes
/// about this often in practice.
const UPDATE_TABLE_STATUS_INTERVAL: Duration = Duration::from_secs(10);
const DISTRIBUTE_TABLET_MODE_INTERVAL: Duration = Duration::from_secs(30);

/// One name-server process: the coordination client, the catalog, the
/// replica-cluster registry, the OP scheduler, and the reconciler that
/// only acts while this process holds the lock.
pub struct NameServer<B: CoordBackend + 'static> {
    pub(crate) coord: Arc<CoordClient<B>>,
    pub(crate) catalog: Arc<CatalogStore<B>>,
    pub(crate) registry: Arc<ClusterRegistry>,
    pub(crate) scheduler: Arc<OpScheduler<B>>,
    reconciler: Arc<Reconciler<B>>,
    intervals: ReconcilerIntervals,
}

impl<B: CoordBackend + 'static> NameServer<B> {
    /// Builds every component and wires the lock's `OnLocked`/`OnLostLock`
    /// callbacks to the reconciler, but does not yet attempt to acquire
    /// the lock. The tablet-facing RPC transport is out of scope for
    /// this repository (spec Non-goals); `FakeTabletClient` stands in so
    /// the scheduler has something to dispatch tasks against.
    pub fn new(backend: Arc<B>, holder_id: impl Into<String>, config: &NameServerConfig) -> Arc<Self> {
        Self::with_tablet_client(backend, holder_id, config, Arc::new(FakeTabletClient::new()))
    }

    pub fn with_tablet_client(
        backend: Arc<B>,
        holder_id: impl Into<String>,
        config: &NameServerConfig,
        tablet_client: Arc<dyn TabletClient>,
    ) -> Arc<Self> {
        let coord = Arc::new(CoordClient::new(
            backend,
            holder_id,
            tabletctl_coord::paths::LEADER_LOCK_NODE,
        ));
        let catalog = Arc::new(CatalogStore::new(Arc::clone(coord.backend()), PLACEMENT_SEED));
        let registry = Arc::new(ClusterRegistry::new());
        let scheduler = OpScheduler::new(
            Arc::clone(coord.backend()),
            Arc::clone(&catalog),
            tablet_client,
            config.scheduler.task_concurrency as usize,
            config.scheduler.task_concurrency_for_replica_cluster as usize,
        );
        let reconciler = Reconciler::new(
            Arc::clone(coord.backend()),
            Arc::clone(&catalog),
            Arc::clone(&registry),
            Arc::clone(&scheduler),
        );

        let intervals = ReconcilerIntervals {
            check_zk_client: Duration::from_secs(config.coordination.keep_alive_check_interval_secs.max(1)),
            update_table_status: UPDATE_TABLE_STATUS_INTERVAL,
            sched_make_snapshot: Duration::from_secs(config.reconciler.snapshot_interval_secs.max(1)),
            delete_done_op: Duration::from_secs(60),
            check_cluster_info: Duration::from_secs(config.reconciler.cluster_check_interval_secs.max(1)),
            distribute_tablet_mode: DISTRIBUTE_TABLET_MODE_INTERVAL,
            done_op_retention: Duration::from_secs(config.reconciler.done_op_retention_secs),
        };

        let server = Arc::new(Self {
            coord,
            catalog,
            registry,
            scheduler,
            reconciler,
            intervals,
        });

        let on_locked_reconciler = Arc::clone(&server.reconciler);
        let on_locked_intervals = server.intervals;
        server.coord.on_locked(move |term| {
            info!(%term, "became active name server");
            on_locked_reconciler.on_locked(on_locked_intervals);
        });

        let on_lost_lock_reconciler = Arc::clone(&server.reconciler);
        server.coord.on_lost_lock(move || {
            on_lost_lock_reconciler.on_lost_lock();
        });

        server
    }

    /// Attempts to become the active name server and starts the
    /// keep-alive thread that re-contends for the lock on session loss.
    pub fn start(self: &Arc<Self>) {
        if let Err(error) = self.coord.try_acquire() {
            tracing::warn!(%error, "initial lock acquisition attempt failed");
        }
        self.coord.start_keep_alive(Duration::from_secs(self.intervals.check_zk_client.as_secs().max(1)));
    }

    /// Stops the keep-alive thread and releases the lock if held,
    /// firing `OnLostLock` (which stops every periodic job) in the
    /// process.
    pub fn shutdown(&self) {
        self.coord.stop_keep_alive();
        self.coord.release();
        info!("name server shut down");
    }

    pub fn is_leader(&self) -> bool {
        self.coord.is_leader()
    }

    pub fn coord_session_alive(&self) -> bool {
        self.coord.backend().is_session_alive()
    }

    pub fn catalog(&self) -> &Arc<CatalogStore<B>> {
        &self.catalog
    }

    pub fn registry(&self) -> &Arc<ClusterRegistry> {
        &self.registry
    }

    pub fn scheduler(&self) -> &Arc<OpScheduler<B>> {
        &self.scheduler
    }
}
