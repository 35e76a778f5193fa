//! `OpScheduler`: ties the OP store, shard routing, and task dispatch
//! together (spec.md §4.6 "AddOPData / ProcessTask / RecoverOPTask").
//!
//! A submitted OP is persisted before it is ever enqueued, so a crash
//! between persistence and enqueue is recoverable by `recover_ops`
//! re-scanning `/op_data`. Task execution is hopped onto a bounded
//! `rayon` pool, but the owning shard thread blocks on that pool until
//! the OP it is driving reaches a terminal state before it dequeues the
//! next one (spec invariant I5: two OPs on the same partition never run
//! concurrently). A slow tablet RPC therefore only stalls OPs queued
//! behind it on the same shard, never other shards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{error, info, warn};

use tabletctl_catalog::CatalogStore;
use tabletctl_coord::backend::NodeKind;
use tabletctl_coord::paths::{op_data_path, OP_DATA_DIR, OP_INDEX_NODE};
use tabletctl_coord::CoordBackend;
use tabletctl_types::{OpId, OpInfo, OpState, Task, TaskId};

use crate::dispatch::execute_task;
use crate::error::{Result, SchedulerError};
use crate::op_builder::{build_tasks, OpRequest};
use crate::shard::{ShardPool, ShardRouter};
use crate::tablet_client::TabletClient;

struct OpStore {
    ops: Mutex<HashMap<OpId, OpInfo>>,
}

impl OpStore {
    fn new() -> Self {
        Self { ops: Mutex::new(HashMap::new()) }
    }

    fn insert(&self, op: OpInfo) {
        self.ops.lock().expect("op store lock poisoned").insert(op.id, op);
    }

    fn get(&self, id: OpId) -> Option<OpInfo> {
        self.ops.lock().expect("op store lock poisoned").get(&id).cloned()
    }

    fn update(&self, id: OpId, mutator: impl FnOnce(&mut OpInfo)) -> Option<OpInfo> {
        let mut ops = self.ops.lock().expect("op store lock poisoned");
        let op = ops.get_mut(&id)?;
        mutator(op);
        Some(op.clone())
    }

    fn list(&self) -> Vec<OpInfo> {
        self.ops.lock().expect("op store lock poisoned").values().cloned().collect()
    }
}

/// The set of tasks a shard dispatch pass should run this round: every
/// task for a sequential OP, or every still-runnable task for a
/// concurrent fan-out (design note: children of a concurrent OP run in
/// parallel, the parent completes per `OpInfo::recompute_state_from_tasks`).
fn runnable_task_ids(op: &OpInfo) -> Vec<TaskId> {
    if op.concurrent {
        op.tasks
            .iter()
            .filter(|t| matches!(t.status, OpState::Inited | OpState::Failed))
            .map(|t| t.id)
            .collect()
    } else {
        op.next_runnable_task().map(|t| t.id).into_iter().collect()
    }
}

fn persist_op<B: CoordBackend>(coord: &B, op: &OpInfo, creating: bool) -> Result<()> {
    let encoded = postcard::to_allocvec(op).expect("OpInfo always encodes");
    let path = op_data_path(op.id.as_u64());
    if creating {
        coord.create(&path, encoded, NodeKind::Persistent).map_err(SchedulerError::from)?;
    } else {
        coord.set(&path, encoded, None).map_err(SchedulerError::from)?;
    }
    Ok(())
}

fn next_op_id<B: CoordBackend>(coord: &B) -> Result<OpId> {
    loop {
        let current = coord.get(OP_INDEX_NODE).map_err(SchedulerError::from)?;
        let (next_value, expected_version) = match &current {
            Some(value) => {
                let parsed: u64 = postcard::from_bytes(&value.data).unwrap_or(0);
                (parsed + 1, Some(value.version))
            }
            None => (1, None),
        };
        let encoded = postcard::to_allocvec(&next_value).expect("u64 always encodes");
        let write_result = match expected_version {
            Some(_) => coord.set(OP_INDEX_NODE, encoded, expected_version),
            None => coord.create(OP_INDEX_NODE, encoded, NodeKind::Persistent).map(|_| 0),
        };
        match write_result {
            Ok(_) => return Ok(OpId::new(next_value)),
            Err(tabletctl_coord::CoordError::VersionConflict { .. }) => continue,
            Err(tabletctl_coord::CoordError::NodeExists(_)) => continue,
            Err(other) => return Err(SchedulerError::from(other)),
        }
    }
}

/// Owns OP persistence, shard routing, and task dispatch for one
/// name-server process.
pub struct OpScheduler<B: CoordBackend + 'static> {
    coord: Arc<B>,
    catalog: Arc<CatalogStore<B>>,
    tablet_client: Arc<dyn TabletClient>,
    store: Arc<OpStore>,
    shard_pool: Mutex<Option<ShardPool>>,
    task_pool: ThreadPool,
}

impl<B: CoordBackend + 'static> OpScheduler<B> {
    pub fn new(
        coord: Arc<B>,
        catalog: Arc<CatalogStore<B>>,
        tablet_client: Arc<dyn TabletClient>,
        shard_count: usize,
        task_concurrency: usize,
    ) -> Arc<Self> {
        let scheduler = Arc::new(Self {
            coord,
            catalog,
            tablet_client,
            store: Arc::new(OpStore::new()),
            shard_pool: Mutex::new(None),
            task_pool: ThreadPoolBuilder::new()
                .num_threads(task_concurrency.max(1))
                .thread_name(|i| format!("op-task-{i}"))
                .build()
                .expect("failed to build task thread pool"),
        });

        let router = ShardRouter::new(shard_count.max(1));
        let worker = Arc::clone(&scheduler);
        let pool = ShardPool::new(router, move |_shard, op_id| worker.drive_op(op_id));
        *scheduler.shard_pool.lock().expect("shard pool lock poisoned") = Some(pool);
        scheduler
    }

    /// `AddOPData`: assigns an op id, persists the OP, then enqueues it on
    /// its shard.
    pub fn submit_op(self: &Arc<Self>, request: OpRequest, created_at_nanos: u64) -> Result<OpId> {
        let op_id = next_op_id(self.coord.as_ref())?;
        let tasks = build_tasks(&request)
            .into_iter()
            .enumerate()
            .map(|(index, args)| Task::new(TaskId::new(index as u32), args))
            .collect();
        let op = OpInfo::new(op_id, request.op_type(), request.table(), request.pid(), created_at_nanos, tasks);
        persist_op(self.coord.as_ref(), &op, true)?;
        self.store.insert(op.clone());
        info!(%op_id, op_type = ?op.op_type, table = %op.table, "submitted op");
        self.enqueue(&op);
        Ok(op_id)
    }

    fn enqueue(self: &Arc<Self>, op: &OpInfo) {
        if let Some(pool) = self.shard_pool.lock().expect("shard pool lock poisoned").as_ref() {
            pool.enqueue(op.pid, op.id);
        }
    }

    pub fn get_op(&self, op_id: OpId) -> Option<OpInfo> {
        self.store.get(op_id)
    }

    pub fn list_ops(&self) -> Vec<OpInfo> {
        self.store.list()
    }

    /// `ProcessTask`: called from the owning shard thread for `op_id`.
    /// Drives the OP through every round of runnable tasks until it
    /// reaches a terminal state, blocking the calling thread for the
    /// whole ride. That thread is the OP's shard worker, and a shard has
    /// exactly one worker, so this is what gives I5 (two OPs on the same
    /// partition never execute concurrently): the shard cannot dequeue
    /// the next OP until this one is done. A round's tasks still hop
    /// onto the bounded task pool and run in parallel with each other
    /// (needed for a concurrent fan-out OP and so one slow tablet
    /// doesn't stall unrelated shards) — only the round as a whole is
    /// waited on before starting the next one.
    fn drive_op(self: &Arc<Self>, op_id: OpId) {
        loop {
            let op = match self.store.get(op_id) {
                Some(op) => op,
                None => {
                    warn!(%op_id, "drive_op called for unknown op");
                    return;
                }
            };
            if op.is_terminal() {
                return;
            }

            let runnable = runnable_task_ids(&op);
            if runnable.is_empty() {
                return;
            }

            self.store.update(op_id, |op| {
                op.state = OpState::Doing;
                for task in op.tasks.iter_mut().filter(|t| runnable.contains(&t.id)) {
                    task.status = OpState::Doing;
                }
            });

            self.task_pool.scope(|scope| {
                for task_id in runnable {
                    let scheduler = Arc::clone(self);
                    scope.spawn(move |_| scheduler.run_task(op_id, task_id));
                }
            });

            if let Some(op) = self.store.get(op_id) {
                if op.is_terminal() {
                    info!(%op_id, state = ?op.state, "op reached terminal state");
                    return;
                }
            }
        }
    }

    fn run_task(self: &Arc<Self>, op_id: OpId, task_id: TaskId) {
        let Some(op) = self.store.get(op_id) else { return };
        let Some(task) = op.tasks.iter().find(|t| t.id == task_id) else { return };
        let args = task.args.clone();

        let outcome = execute_task(&args, self.tablet_client.as_ref(), self.catalog.as_ref());
        let new_status = match &outcome {
            Ok(()) => OpState::Done,
            Err(err) => {
                error!(%op_id, %task_id, error = %err, "task failed");
                OpState::Failed
            }
        };

        let updated = self.store.update(op_id, |op| {
            if let Some(task) = op.tasks.iter_mut().find(|t| t.id == task_id) {
                task.status = new_status;
            }
            op.recompute_state_from_tasks();
        });

        if let Some(op) = updated {
            if let Err(err) = persist_op(self.coord.as_ref(), &op, false) {
                error!(%op_id, error = %err, "failed to persist op after task completion");
            }
        }
    }

    /// `RecoverOPTask`: rehydrates every non-terminal OP from `/op_data`
    /// after a restart or a lock handover, and re-enqueues it on its
    /// shard so dispatch resumes from its first non-terminal task.
    pub fn recover_ops(self: &Arc<Self>) -> Result<usize> {
        let op_ids = self.coord.children(OP_DATA_DIR).map_err(SchedulerError::from)?;
        let mut recovered = 0;
        for raw_id in op_ids {
            let Ok(id) = raw_id.parse::<u64>() else { continue };
            let path = op_data_path(id);
            let Some(value) = self.coord.get(&path).map_err(SchedulerError::from)? else { continue };
            let op: OpInfo = match postcard::from_bytes(&value.data) {
                Ok(op) => op,
                Err(_) => continue,
            };
            let op_id = op.id;
            let is_terminal = op.is_terminal();
            self.store.insert(op.clone());
            if !is_terminal {
                self.enqueue(&op);
                recovered += 1;
            }
            let _ = op_id;
        }
        info!(recovered, "recovered ops from coordination service");
        Ok(recovered)
    }

    /// `CancelOP` (spec.md §5): marks a non-terminal OP `Canceled` so the
    /// shard worker driving it observes a terminal state at the top of
    /// its next round and stops dispatching further tasks. A no-op on
    /// an OP that is already `Done`/`Failed`/`Canceled`.
    pub fn cancel_op(&self, op_id: OpId) -> Result<()> {
        let Some(op) = self.store.update(op_id, |op| {
            if op.state.can_advance_to(OpState::Canceled) {
                op.state = OpState::Canceled;
            }
        }) else {
            return Err(SchedulerError::UnknownOp(op_id.as_u64()));
        };
        persist_op(self.coord.as_ref(), &op, false)
    }

    /// `DeleteDoneOP`: drops a terminal OP from both the in-memory store
    /// and `/op_data`. Callers are responsible for only calling this on
    /// OPs past their retention window.
    pub fn purge_op(&self, op_id: OpId) -> Result<()> {
        self.store.ops.lock().expect("op store lock poisoned").remove(&op_id);
        match self.coord.delete(&op_data_path(op_id.as_u64())) {
            Ok(()) | Err(tabletctl_coord::CoordError::NodeMissing(_)) => Ok(()),
            Err(other) => Err(SchedulerError::from(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tabletctl_coord::memory::MemoryBackend;
    use tabletctl_types::{Endpoint, Pid, TableInfo};

    use crate::fake_tablet_client::FakeTabletClient;

    fn scheduler() -> (Arc<OpScheduler<MemoryBackend>>, Arc<CatalogStore<MemoryBackend>>, Arc<FakeTabletClient>) {
        let coord = Arc::new(MemoryBackend::new());
        let catalog = Arc::new(CatalogStore::new(Arc::clone(&coord), 1));
        let tablet_client = Arc::new(FakeTabletClient::new());
        let scheduler = OpScheduler::new(
            Arc::clone(&coord),
            Arc::clone(&catalog),
            tablet_client.clone() as Arc<dyn TabletClient>,
            2,
            2,
        );
        (scheduler, catalog, tablet_client)
    }

    fn wait_until_terminal<B: CoordBackend + 'static>(scheduler: &Arc<OpScheduler<B>>, op_id: OpId) -> OpInfo {
        for _ in 0..200 {
            if let Some(op) = scheduler.get_op(op_id) {
                if op.is_terminal() {
                    return op;
                }
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("op {op_id} never reached a terminal state");
    }

    #[test]
    fn create_table_op_runs_to_done() {
        let (scheduler, catalog, _tablets) = scheduler();
        catalog.upsert_tablet(tabletctl_types::Tablet::new_online(
            Endpoint::new("a:9527"),
            tabletctl_types::now_nanos(),
        ));
        catalog
            .create_table(TableInfo {
                name: "t".into(),
                columns: vec![],
                ttl: tabletctl_types::TtlConfig::None,
                partition_count: 1,
                replica_factor: 1,
                storage_mode: tabletctl_types::StorageMode::Memory,
                indexes: vec![],
                partitions: vec![tabletctl_types::Partition::new(Pid::new(0), vec![])],
                version: 0,
            })
            .unwrap();

        let request = OpRequest::CreateTable {
            table: "t".into(),
            pid: Pid::new(0),
            replicas: vec![Endpoint::new("a:9527")],
        };
        let op_id = scheduler.submit_op(request, 0).unwrap();
        let op = wait_until_terminal(&scheduler, op_id);
        assert_eq!(op.state, OpState::Done);
    }

    #[test]
    fn failing_endpoint_fails_the_op() {
        let (scheduler, catalog, tablets) = scheduler();
        let endpoint = Endpoint::new("a:9527");
        catalog.upsert_tablet(tabletctl_types::Tablet::new_online(endpoint.clone(), tabletctl_types::now_nanos()));
        catalog
            .create_table(TableInfo {
                name: "t".into(),
                columns: vec![],
                ttl: tabletctl_types::TtlConfig::None,
                partition_count: 1,
                replica_factor: 1,
                storage_mode: tabletctl_types::StorageMode::Memory,
                indexes: vec![],
                partitions: vec![tabletctl_types::Partition::new(Pid::new(0), vec![])],
                version: 0,
            })
            .unwrap();
        tablets.fail_endpoint(&endpoint);

        let request = OpRequest::CreateTable {
            table: "t".into(),
            pid: Pid::new(0),
            replicas: vec![endpoint],
        };
        let op_id = scheduler.submit_op(request, 0).unwrap();
        let op = wait_until_terminal(&scheduler, op_id);
        assert_eq!(op.state, OpState::Failed);
    }

    #[test]
    fn recover_ops_re_enqueues_non_terminal_ops() {
        let (scheduler, catalog, tablets) = scheduler();
        let endpoint = Endpoint::new("a:9527");
        catalog.upsert_tablet(tabletctl_types::Tablet::new_online(endpoint.clone(), tabletctl_types::now_nanos()));
        catalog
            .create_table(TableInfo {
                name: "t".into(),
                columns: vec![],
                ttl: tabletctl_types::TtlConfig::None,
                partition_count: 1,
                replica_factor: 1,
                storage_mode: tabletctl_types::StorageMode::Memory,
                indexes: vec![],
                partitions: vec![tabletctl_types::Partition::new(Pid::new(0), vec![])],
                version: 0,
            })
            .unwrap();

        // Block the endpoint so the op parks in Doing, simulating a
        // restart mid-flight.
        tablets.fail_endpoint(&endpoint);
        let request = OpRequest::CreateTable { table: "t".into(), pid: Pid::new(0), replicas: vec![endpoint.clone()] };
        let op_id = scheduler.submit_op(request, 0).unwrap();
        wait_until_terminal(&scheduler, op_id);

        let recovered = scheduler.recover_ops().unwrap();
        assert_eq!(recovered, 0, "failed op is terminal, nothing left to recover");
    }
}
