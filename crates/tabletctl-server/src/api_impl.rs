//! Binds [`NameServerApi`] to one [`NameServer`] instance: every mutating
//! call is rejected with `StatusCode::NotLeader` unless this process
//! holds the coordination lock (spec.md §4.8).

use tabletctl_coord::CoordBackend;
use tabletctl_rpc::*;
use tabletctl_scheduler::OpRequest;
use tabletctl_types::now_nanos;

use crate::server::NameServer;

impl<B: CoordBackend + 'static> NameServerApi for NameServer<B> {
    fn create_table(&self, request: CreateTableRequest) -> CreateTableResponse {
        if !self.is_leader() {
            return CreateTableResponse { status: Status::not_leader() };
        }
        let created = match self.catalog().create_table(request.table) {
            Ok(table) => table,
            Err(error) => return CreateTableResponse { status: Status::from(error) },
        };
        for partition in &created.partitions {
            let replicas = partition.replicas.iter().map(|r| r.endpoint.clone()).collect();
            let op = OpRequest::CreateTable { table: created.name.clone(), pid: partition.pid, replicas };
            if let Err(error) = self.scheduler().submit_op(op, now_nanos()) {
                return CreateTableResponse { status: Status::from(error) };
            }
        }
        CreateTableResponse { status: Status::ok() }
    }

    fn drop_table(&self, request: DropTableRequest) -> DropTableResponse {
        if !self.is_leader() {
            return DropTableResponse { status: Status::not_leader() };
        }
        match self.catalog().delete_table(&request.table) {
            Ok(()) => DropTableResponse { status: Status::ok() },
            Err(error) => DropTableResponse { status: Status::from(error) },
        }
    }

    fn add_replica_ns(&self, request: AddReplicaNsRequest) -> AddReplicaNsResponse {
        if !self.is_leader() {
            return AddReplicaNsResponse { status: Status::not_leader(), op_id: None };
        }
        let Some(table) = self.catalog().get_table(&request.table) else {
            return AddReplicaNsResponse { status: Status::table_not_found(request.table), op_id: None };
        };
        let Some(partition) = table.partitions.iter().find(|p| p.pid == request.pid) else {
            return AddReplicaNsResponse { status: Status::bad_request("unknown partition"), op_id: None };
        };
        let Some(leader) = partition.leader() else {
            return AddReplicaNsResponse { status: Status::internal("partition has no leader"), op_id: None };
        };
        let op = OpRequest::AddReplica {
            table: request.table,
            pid: request.pid,
            leader: leader.endpoint.clone(),
            follower: request.endpoint,
        };
        match self.scheduler().submit_op(op, now_nanos()) {
            Ok(op_id) => AddReplicaNsResponse { status: Status::ok(), op_id: Some(op_id) },
            Err(error) => AddReplicaNsResponse { status: Status::from(error), op_id: None },
        }
    }

    fn del_replica_ns(&self, request: DelReplicaNsRequest) -> DelReplicaNsResponse {
        if !self.is_leader() {
            return DelReplicaNsResponse { status: Status::not_leader(), op_id: None };
        }
        let op = OpRequest::DelReplica { table: request.table, pid: request.pid, endpoint: request.endpoint };
        match self.scheduler().submit_op(op, now_nanos()) {
            Ok(op_id) => DelReplicaNsResponse { status: Status::ok(), op_id: Some(op_id) },
            Err(error) => DelReplicaNsResponse { status: Status::from(error), op_id: None },
        }
    }

    fn change_leader(&self, request: ChangeLeaderRequest) -> ChangeLeaderResponse {
        if !self.is_leader() {
            return ChangeLeaderResponse { status: Status::not_leader(), op_id: None };
        }
        let Some(table) = self.catalog().get_table(&request.table) else {
            return ChangeLeaderResponse { status: Status::table_not_found(request.table), op_id: None };
        };
        let Some(partition) = table.partitions.iter().find(|p| p.pid == request.pid) else {
            return ChangeLeaderResponse { status: Status::bad_request("unknown partition"), op_id: None };
        };
        let candidates: Vec<_> = partition.replicas.iter().map(|r| r.endpoint.clone()).collect();
        let new_leader = match request.candidate.or_else(|| candidates.first().cloned()) {
            Some(endpoint) => endpoint,
            None => return ChangeLeaderResponse { status: Status::bad_request("partition has no replicas"), op_id: None },
        };
        let op = OpRequest::ChangeLeader { table: request.table, pid: request.pid, candidates, new_leader };
        match self.scheduler().submit_op(op, now_nanos()) {
            Ok(op_id) => ChangeLeaderResponse { status: Status::ok(), op_id: Some(op_id) },
            Err(error) => ChangeLeaderResponse { status: Status::from(error), op_id: None },
        }
    }

    fn migrate(&self, request: MigrateRequest) -> MigrateResponse {
        if !self.is_leader() {
            return MigrateResponse { status: Status::not_leader(), op_id: None };
        }
        let Some(table) = self.catalog().get_table(&request.table) else {
            return MigrateResponse { status: Status::table_not_found(request.table), op_id: None };
        };
        let Some(partition) = table.partitions.iter().find(|p| p.pid == request.pid) else {
            return MigrateResponse { status: Status::bad_request("unknown partition"), op_id: None };
        };
        let Some(leader) = partition.leader() else {
            return MigrateResponse { status: Status::internal("partition has no leader"), op_id: None };
        };
        let op = OpRequest::Migrate {
            table: request.table,
            pid: request.pid,
            from: request.from,
            to: request.to,
            leader: leader.endpoint.clone(),
        };
        match self.scheduler().submit_op(op, now_nanos()) {
            Ok(op_id) => MigrateResponse { status: Status::ok(), op_id: Some(op_id) },
            Err(error) => MigrateResponse { status: Status::from(error), op_id: None },
        }
    }

    fn offline_endpoint(&self, request: OfflineEndpointRequest) -> OfflineEndpointResponse {
        if !self.is_leader() {
            return OfflineEndpointResponse { status: Status::not_leader(), op_ids: vec![] };
        }
        self.catalog().mark_tablet_offline(&request.endpoint);
        let mut op_ids = Vec::new();
        for table in self.catalog().list_tables() {
            for partition in &table.partitions {
                if partition.replica(&request.endpoint).is_some() {
                    let op = OpRequest::OfflineReplica {
                        table: table.name.clone(),
                        pid: partition.pid,
                        endpoint: request.endpoint.clone(),
                    };
                    if let Ok(op_id) = self.scheduler().submit_op(op, now_nanos()) {
                        op_ids.push(op_id);
                    }
                }
            }
        }
        OfflineEndpointResponse { status: Status::ok(), op_ids }
    }

    fn recover_endpoint(&self, request: RecoverEndpointRequest) -> RecoverEndpointResponse {
        if !self.is_leader() {
            return RecoverEndpointResponse { status: Status::not_leader(), op_ids: vec![] };
        }
        let mut op_ids = Vec::new();
        for table in self.catalog().list_tables() {
            for partition in &table.partitions {
                if partition.replica(&request.endpoint).is_some() {
                    let op = OpRequest::RecoverTable {
                        table: table.name.clone(),
                        pid: partition.pid,
                        endpoint: request.endpoint.clone(),
                    };
                    if let Ok(op_id) = self.scheduler().submit_op(op, now_nanos()) {
                        op_ids.push(op_id);
                    }
                }
            }
        }
        RecoverEndpointResponse { status: Status::ok(), op_ids }
    }

    fn recover_table(&self, request: RecoverTableRequest) -> RecoverTableResponse {
        if !self.is_leader() {
            return RecoverTableResponse { status: Status::not_leader(), op_id: None };
        }
        let op = OpRequest::RecoverTable { table: request.table, pid: request.pid, endpoint: request.endpoint };
        match self.scheduler().submit_op(op, now_nanos()) {
            Ok(op_id) => RecoverTableResponse { status: Status::ok(), op_id: Some(op_id) },
            Err(error) => RecoverTableResponse { status: Status::from(error), op_id: None },
        }
    }

    fn make_snapshot_ns(&self, request: MakeSnapshotNsRequest) -> MakeSnapshotNsResponse {
        if !self.is_leader() {
            return MakeSnapshotNsResponse { status: Status::not_leader(), op_id: None };
        }
        let Some(table) = self.catalog().get_table(&request.table) else {
            return MakeSnapshotNsResponse { status: Status::table_not_found(request.table), op_id: None };
        };
        let Some(partition) = table.partitions.iter().find(|p| p.pid == request.pid) else {
            return MakeSnapshotNsResponse { status: Status::bad_request("unknown partition"), op_id: None };
        };
        let Some(leader) = partition.leader() else {
            return MakeSnapshotNsResponse { status: Status::internal("partition has no leader"), op_id: None };
        };
        let op = OpRequest::MakeSnapshot { table: request.table, pid: request.pid, endpoint: leader.endpoint.clone() };
        match self.scheduler().submit_op(op, now_nanos()) {
            Ok(op_id) => MakeSnapshotNsResponse { status: Status::ok(), op_id: Some(op_id) },
            Err(error) => MakeSnapshotNsResponse { status: Status::from(error), op_id: None },
        }
    }

    fn show_table(&self, request: ShowTableRequest) -> ShowTableResponse {
        let tables = match request.table {
            Some(name) => self.catalog().get_table(&name).into_iter().collect(),
            None => self.catalog().list_tables(),
        };
        ShowTableResponse { status: Status::ok(), tables }
    }

    fn show_tablet(&self, _request: ShowTabletRequest) -> ShowTabletResponse {
        let tablets = self
            .catalog()
            .list_tablets()
            .into_iter()
            .map(|t| TabletSummary { endpoint: t.endpoint, state: t.state })
            .collect();
        ShowTabletResponse { status: Status::ok(), tablets }
    }

    fn show_op_status(&self, request: ShowOpStatusRequest) -> ShowOpStatusResponse {
        let ops = self
            .scheduler()
            .list_ops()
            .into_iter()
            .filter(|op| request.table.as_deref().is_none_or(|t| t == op.table))
            .map(|op| {
                let last_failed_task = op
                    .tasks
                    .iter()
                    .find(|t| t.status == tabletctl_types::OpState::Failed)
                    .map(|t| format!("{:?}", t.task_type()));
                OpStatusSummary { op_id: op.id, table: op.table, pid: op.pid, state: op.state, last_failed_task }
            })
            .collect();
        ShowOpStatusResponse { status: Status::ok(), ops }
    }

    fn conf_set(&self, _request: ConfSetRequest) -> ConfSetResponse {
        ConfSetResponse { status: Status::internal("live config mutation is not supported; restart with an updated config file") }
    }

    fn conf_get(&self, _request: ConfGetRequest) -> ConfGetResponse {
        ConfGetResponse { status: Status::internal("config introspection is not exposed over this surface"), value: None }
    }

    fn connect_zk(&self, _request: ConnectZkRequest) -> ConnectZkResponse {
        // The coordination backend is wired up at construction time
        // (spec §6 ConnectZK/DisConnectZK are session-lifecycle no-ops
        // against the in-process backend); reports session liveness.
        if self.coord_session_alive() {
            ConnectZkResponse { status: Status::ok() }
        } else {
            ConnectZkResponse { status: Status::zk_error("coordination session is not alive") }
        }
    }

    fn disconnect_zk(&self, _request: DisconnectZkRequest) -> DisconnectZkResponse {
        DisconnectZkResponse { status: Status::ok() }
    }

    fn set_table_partition(&self, request: SetTablePartitionRequest) -> SetTablePartitionResponse {
        if !self.is_leader() {
            return SetTablePartitionResponse { status: Status::not_leader() };
        }
        match self.catalog().update_table_info(&request.table, |t| t.partition_count = request.partition_count) {
            Ok(_) => SetTablePartitionResponse { status: Status::ok() },
            Err(error) => SetTablePartitionResponse { status: Status::from(error) },
        }
    }

    fn get_table_partition(&self, request: GetTablePartitionRequest) -> GetTablePartitionResponse {
        match self.catalog().get_table(&request.table) {
            Some(table) => GetTablePartitionResponse { status: Status::ok(), partition_count: table.partition_count },
            None => GetTablePartitionResponse { status: Status::table_not_found(request.table), partition_count: 0 },
        }
    }

    fn update_table_alive_status(&self, request: UpdateTableAliveStatusRequest) -> UpdateTableAliveStatusResponse {
        if !self.is_leader() {
            return UpdateTableAliveStatusResponse { status: Status::not_leader() };
        }
        match self.catalog().update_partition_status(&request.table, request.pid, &request.endpoint, false, request.is_alive) {
            Ok(_) => UpdateTableAliveStatusResponse { status: Status::ok() },
            Err(error) => UpdateTableAliveStatusResponse { status: Status::from(error) },
        }
    }

    fn cancel_op(&self, request: CancelOpRequest) -> CancelOpResponse {
        if !self.is_leader() {
            return CancelOpResponse { status: Status::not_leader() };
        }
        match self.scheduler().cancel_op(request.op_id) {
            Ok(()) => CancelOpResponse { status: Status::ok() },
            Err(error) => CancelOpResponse { status: Status::from(error) },
        }
    }

    fn add_replica_cluster(&self, _request: AddReplicaClusterRequest) -> AddReplicaClusterResponse {
        AddReplicaClusterResponse {
            status: Status::internal("peer name-server RPC transport is out of scope for this repository"),
        }
    }

    fn show_replica_cluster(&self, _request: ShowReplicaClusterRequest) -> ShowReplicaClusterResponse {
        let clusters = self
            .registry()
            .list()
            .into_iter()
            .map(|c| ReplicaClusterSummary { alias: c.alias, healthy: c.is_healthy(), term: c.term.as_u64() })
            .collect();
        ShowReplicaClusterResponse { status: Status::ok(), clusters }
    }

    fn remove_replica_cluster(&self, request: RemoveReplicaClusterRequest) -> RemoveReplicaClusterResponse {
        if !self.is_leader() {
            return RemoveReplicaClusterResponse { status: Status::not_leader() };
        }
        match self.registry().remove_replica_cluster_by_ns(&request.alias, tabletctl_types::Term::ZERO) {
            Ok(()) => RemoveReplicaClusterResponse { status: Status::ok() },
            Err(error) => RemoveReplicaClusterResponse { status: Status::from(error) },
        }
    }

    fn switch_mode(&self, _request: SwitchModeRequest) -> SwitchModeResponse {
        SwitchModeResponse { status: Status::internal("leader/follower cluster mode switching is not implemented") }
    }

    fn sync_table(&self, request: SyncTableRequest) -> SyncTableResponse {
        if !self.is_leader() {
            return SyncTableResponse { status: Status::not_leader(), op_id: None };
        }
        let op = OpRequest::SyncTable {
            table: request.table,
            pid: tabletctl_types::Pid::new(0),
            cluster_alias: request.cluster_alias,
        };
        match self.scheduler().submit_op(op, now_nanos()) {
            Ok(op_id) => SyncTableResponse { status: Status::ok(), op_id: Some(op_id) },
            Err(error) => SyncTableResponse { status: Status::from(error), op_id: None },
        }
    }

    fn delete_index(&self, request: DeleteIndexRequest) -> DeleteIndexResponse {
        if !self.is_leader() {
            return DeleteIndexResponse { status: Status::not_leader() };
        }
        match self.catalog().update_table_info(&request.table, |t| t.indexes.retain(|i| i.name != request.index_name)) {
            Ok(_) => DeleteIndexResponse { status: Status::ok() },
            Err(error) => DeleteIndexResponse { status: Status::from(error) },
        }
    }

    fn add_index(&self, request: AddIndexRequest) -> AddIndexResponse {
        if !self.is_leader() {
            return AddIndexResponse { status: Status::not_leader(), op_id: None };
        }
        let Some(table) = self.catalog().get_table(&request.table) else {
            return AddIndexResponse { status: Status::table_not_found(request.table), op_id: None };
        };
        if let Err(error) = self.catalog().add_index(&request.table, request.index.clone()) {
            return AddIndexResponse { status: Status::from(error), op_id: None };
        }
        let endpoints = table.partitions.iter().filter_map(|p| p.leader().map(|r| r.endpoint.clone())).collect();
        let op = OpRequest::AddIndex {
            table: request.table,
            pid: tabletctl_types::Pid::new(0),
            endpoints,
            index_name: request.index.name,
        };
        match self.scheduler().submit_op(op, now_nanos()) {
            Ok(op_id) => AddIndexResponse { status: Status::ok(), op_id: Some(op_id) },
            Err(error) => AddIndexResponse { status: Status::from(error), op_id: None },
        }
    }

    fn add_table_field(&self, request: AddTableFieldRequest) -> AddTableFieldResponse {
        if !self.is_leader() {
            return AddTableFieldResponse { status: Status::not_leader() };
        }
        match self.catalog().add_table_field(&request.table, request.column) {
            Ok(_) => AddTableFieldResponse { status: Status::ok() },
            Err(error) => AddTableFieldResponse { status: Status::from(error) },
        }
    }

    fn update_ttl(&self, request: UpdateTtlRequest) -> UpdateTtlResponse {
        if !self.is_leader() {
            return UpdateTtlResponse { status: Status::not_leader() };
        }
        match self.catalog().update_table_info(&request.table, |t| t.ttl = request.ttl) {
            Ok(_) => UpdateTtlResponse { status: Status::ok() },
            Err(error) => UpdateTtlResponse { status: Status::from(error) },
        }
    }

    fn load_table(&self, request: LoadTableRequest) -> LoadTableResponse {
        if !self.is_leader() {
            return LoadTableResponse { status: Status::not_leader() };
        }
        let op = OpRequest::ReLoadTable { table: request.table, pid: request.pid, endpoint: request.endpoint };
        match self.scheduler().submit_op(op, now_nanos()) {
            Ok(_) => LoadTableResponse { status: Status::ok() },
            Err(error) => LoadTableResponse { status: Status::from(error) },
        }
    }
}
