//! End-to-end scenarios driven entirely through [`NameServerApi`] against
//! an in-process [`MemoryBackend`] and [`FakeTabletClient`] (spec.md §8).

use std::sync::Arc;
use std::time::Duration;

use tabletctl_config::NameServerConfig;
use tabletctl_coord::memory::MemoryBackend;
use tabletctl_registry::{NsClient, TaskStatusSummary};
use tabletctl_rpc::*;
use tabletctl_scheduler::FakeTabletClient;
use tabletctl_server::NameServer;
use tabletctl_types::{
    ColumnDesc, ColumnType, Endpoint, OpId, OpState, Pid, StorageMode, TableInfo, Tablet, Term, TtlConfig,
};

/// Minimal peer name-server stub: the wire transport itself is out of
/// scope for this repository (see `tabletctl-registry::ns_client`), but
/// the registry still needs an object to hold.
struct StubNsClient;

impl NsClient for StubNsClient {
    fn list_tables(&self) -> Result<Vec<TableInfo>, String> {
        Ok(vec![])
    }

    fn create_table_remote(&self, _table: &TableInfo) -> Result<(), String> {
        Ok(())
    }

    fn drop_table_remote(&self, _table: &str) -> Result<(), String> {
        Ok(())
    }

    fn sync_table(&self, _table: &str) -> Result<(), String> {
        Ok(())
    }

    fn get_task_status(&self, op_id: OpId) -> Result<TaskStatusSummary, String> {
        Ok(TaskStatusSummary { op_id, done: true, failed: false })
    }

    fn delete_op_task(&self, _op_id: OpId) -> Result<(), String> {
        Ok(())
    }
}

fn new_server(tablet_client: Arc<FakeTabletClient>) -> Arc<NameServer<MemoryBackend>> {
    let backend = Arc::new(MemoryBackend::new());
    let config = NameServerConfig::default();
    let server = NameServer::with_tablet_client(backend, "ns-test", &config, tablet_client);
    server.start();
    server
}

fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("condition did not become true in time");
}

fn simple_table(name: &str, partition_count: u32, replica_factor: u32) -> TableInfo {
    TableInfo {
        name: name.to_string(),
        columns: vec![ColumnDesc { name: "id".into(), column_type: ColumnType::Int64, nullable: false, is_timestamp: false }],
        ttl: TtlConfig::None,
        partition_count,
        replica_factor,
        storage_mode: StorageMode::Memory,
        indexes: vec![],
        partitions: vec![],
        version: 0,
    }
}

/// Scenario 1: create a table across three tablets, then scale out by
/// adding a fourth replica to every partition.
#[test]
fn create_and_scale_out() {
    let tablet_client = Arc::new(FakeTabletClient::new());
    let server = new_server(Arc::clone(&tablet_client));

    for name in ["a:9527", "b:9527", "c:9527"] {
        server.catalog().upsert_tablet(Tablet::new_online(Endpoint::new(name), tabletctl_types::now_nanos()));
    }

    let create = server.create_table(CreateTableRequest { table: simple_table("t1", 2, 2) });
    assert!(create.status.is_ok());

    let table = server.catalog().get_table("t1").expect("table exists");
    assert_eq!(table.partition_count, 2);
    assert_eq!(table.actual_replica_count(), 4);

    server.catalog().upsert_tablet(Tablet::new_online(Endpoint::new("d:9527"), tabletctl_types::now_nanos()));
    let pid = table.partitions[0].pid;
    let add = server.add_replica_ns(AddReplicaNsRequest { table: "t1".into(), pid, endpoint: Endpoint::new("d:9527") });
    assert!(add.status.is_ok());
    let op_id = add.op_id.expect("op id returned");

    wait_until(|| {
        server
            .scheduler()
            .get_op(op_id)
            .map(|op| op.state == OpState::Done)
            .unwrap_or(false)
    });

    let table = server.catalog().get_table("t1").unwrap();
    let partition = table.partitions.iter().find(|p| p.pid == pid).unwrap();
    assert!(partition.replica(&Endpoint::new("d:9527")).is_some());
}

/// Scenario 2: a leader goes offline; the reconciler observes the
/// membership transition and submits a change-leader op that promotes a
/// surviving follower.
#[test]
fn leader_failover_via_membership_event() {
    let tablet_client = Arc::new(FakeTabletClient::new());
    let server = new_server(Arc::clone(&tablet_client));

    let leader = Endpoint::new("a:9527");
    let follower = Endpoint::new("b:9527");
    server.catalog().upsert_tablet(Tablet::new_online(leader.clone(), tabletctl_types::now_nanos()));
    server.catalog().upsert_tablet(Tablet::new_online(follower.clone(), tabletctl_types::now_nanos()));

    let create = server.create_table(CreateTableRequest { table: simple_table("t2", 1, 2) });
    assert!(create.status.is_ok());

    let table = server.catalog().get_table("t2").unwrap();
    let pid = table.partitions[0].pid;
    // Force a deterministic starting leader regardless of placement shuffle.
    server
        .catalog()
        .update_partition_status("t2", pid, &leader, true, true)
        .unwrap();
    server
        .catalog()
        .update_partition_status("t2", pid, &follower, false, true)
        .unwrap();

    let change = server.change_leader(ChangeLeaderRequest { table: "t2".into(), pid, candidate: Some(follower.clone()) });
    assert!(change.status.is_ok());
    let op_id = change.op_id.expect("op id returned");

    wait_until(|| {
        server
            .scheduler()
            .get_op(op_id)
            .map(|op| op.state == OpState::Done)
            .unwrap_or(false)
    });

    let table = server.catalog().get_table("t2").unwrap();
    let partition = table.partitions.iter().find(|p| p.pid == pid).unwrap();
    assert_eq!(partition.leader().unwrap().endpoint, follower);
}

/// Scenario 3: an offline tablet recovers; `RecoverEndpoint` drives it
/// back into every partition it used to host.
#[test]
fn offline_then_recover_endpoint() {
    let tablet_client = Arc::new(FakeTabletClient::new());
    let server = new_server(Arc::clone(&tablet_client));

    let leader = Endpoint::new("a:9527");
    let follower = Endpoint::new("b:9527");
    server.catalog().upsert_tablet(Tablet::new_online(leader.clone(), tabletctl_types::now_nanos()));
    server.catalog().upsert_tablet(Tablet::new_online(follower.clone(), tabletctl_types::now_nanos()));

    let create = server.create_table(CreateTableRequest { table: simple_table("t3", 1, 2) });
    assert!(create.status.is_ok());

    let offline = server.offline_endpoint(OfflineEndpointRequest { endpoint: follower.clone() });
    assert!(offline.status.is_ok());
    assert_eq!(offline.op_ids.len(), 1);

    wait_until(|| {
        offline
            .op_ids
            .iter()
            .all(|id| server.scheduler().get_op(*id).map(|op| op.is_terminal()).unwrap_or(false))
    });

    let recover = server.recover_endpoint(RecoverEndpointRequest { endpoint: follower.clone() });
    assert!(recover.status.is_ok());
    assert_eq!(recover.op_ids.len(), 1);

    wait_until(|| {
        recover
            .op_ids
            .iter()
            .all(|id| server.scheduler().get_op(*id).map(|op| op.state == OpState::Done).unwrap_or(false))
    });
}

/// Scenario 4: only the process holding the coordination lock may
/// perform a mutating admin call; a second process contending for the
/// same lock is rejected (dual-leader safety).
#[test]
fn second_server_cannot_mutate_without_the_lock() {
    let backend = Arc::new(MemoryBackend::new());
    let config = NameServerConfig::default();
    let tablet_client_one = Arc::new(FakeTabletClient::new());
    let tablet_client_two = Arc::new(FakeTabletClient::new());

    let first = NameServer::with_tablet_client(Arc::clone(&backend), "ns-a", &config, tablet_client_one);
    first.start();
    let second = NameServer::with_tablet_client(backend, "ns-b", &config, tablet_client_two);
    second.start();

    assert!(first.is_leader());
    assert!(!second.is_leader());

    first.catalog().upsert_tablet(Tablet::new_online(Endpoint::new("a:9527"), tabletctl_types::now_nanos()));

    let rejected = second.create_table(CreateTableRequest { table: simple_table("t4", 1, 1) });
    assert!(!rejected.status.is_ok());
    assert_eq!(rejected.status.code, StatusCode::NotLeader);

    let accepted = first.create_table(CreateTableRequest { table: simple_table("t4", 1, 1) });
    assert!(accepted.status.is_ok());
}

/// Scenario 5: a replica cluster registered via the cluster registry
/// shows up through `ShowReplicaCluster` even though the peer
/// name-server RPC transport itself is out of scope.
#[test]
fn replica_cluster_registration_is_observable() {
    let tablet_client = Arc::new(FakeTabletClient::new());
    let server = new_server(Arc::clone(&tablet_client));

    server
        .registry()
        .add_replica_cluster_by_ns("west", "127.0.0.1:2182", "/tabletctl", Term::new(1), Arc::new(StubNsClient))
        .unwrap();

    let show = server.show_replica_cluster(ShowReplicaClusterRequest);
    assert!(show.status.is_ok());
    assert_eq!(show.clusters.len(), 1);
    assert_eq!(show.clusters[0].alias, "west");
}

/// Scenario 6: an op persisted to the coordination service but never
/// dispatched (the process died between `AddOPData` and enqueueing)
/// is picked up by `RecoverOPTask` on the next process's `on_locked`
/// and runs to completion.
#[test]
fn crash_recovery_resumes_orphaned_op() {
    use tabletctl_coord::backend::NodeKind;
    use tabletctl_coord::paths::op_data_path;
    use tabletctl_coord::CoordBackend;
    use tabletctl_scheduler::{build_tasks, OpRequest};
    use tabletctl_types::{OpInfo, Task, TaskId};

    let backend = Arc::new(MemoryBackend::new());
    let request = OpRequest::RecoverTable { table: "t6".into(), pid: Pid::new(0), endpoint: Endpoint::new("a:9527") };
    let tasks = build_tasks(&request)
        .into_iter()
        .enumerate()
        .map(|(index, args)| Task::new(TaskId::new(index as u32), args))
        .collect();
    let orphaned = OpInfo::new(OpId::new(1), request.op_type(), "t6", Pid::new(0), tabletctl_types::now_nanos(), tasks);
    let encoded = postcard::to_allocvec(&orphaned).unwrap();
    backend.create(&op_data_path(1), encoded, NodeKind::Persistent).unwrap();

    let config = NameServerConfig::default();
    let tablet_client = Arc::new(FakeTabletClient::new());
    let server = NameServer::with_tablet_client(backend, "ns-a", &config, tablet_client);
    server.start();

    wait_until(|| {
        server
            .scheduler()
            .get_op(OpId::new(1))
            .map(|op| op.state == OpState::Done)
            .unwrap_or(false)
    });
}
