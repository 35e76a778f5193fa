//! The admin RPC surface (C8, spec.md §4.8): one method per operation in
//! the bank. Implementors decide the transport; `tabletctl-server` binds
//! these directly to C3–C7 in-process, `tabletctl-cli` calls them as a
//! thin client.

use crate::requests::*;

pub trait NameServerApi {
    fn create_table(&self, request: CreateTableRequest) -> CreateTableResponse;
    fn drop_table(&self, request: DropTableRequest) -> DropTableResponse;
    fn add_replica_ns(&self, request: AddReplicaNsRequest) -> AddReplicaNsResponse;
    fn del_replica_ns(&self, request: DelReplicaNsRequest) -> DelReplicaNsResponse;
    fn change_leader(&self, request: ChangeLeaderRequest) -> ChangeLeaderResponse;
    fn migrate(&self, request: MigrateRequest) -> MigrateResponse;
    fn offline_endpoint(&self, request: OfflineEndpointRequest) -> OfflineEndpointResponse;
    fn recover_endpoint(&self, request: RecoverEndpointRequest) -> RecoverEndpointResponse;
    fn recover_table(&self, request: RecoverTableRequest) -> RecoverTableResponse;
    fn make_snapshot_ns(&self, request: MakeSnapshotNsRequest) -> MakeSnapshotNsResponse;
    fn show_table(&self, request: ShowTableRequest) -> ShowTableResponse;
    fn show_tablet(&self, request: ShowTabletRequest) -> ShowTabletResponse;
    fn show_op_status(&self, request: ShowOpStatusRequest) -> ShowOpStatusResponse;
    fn conf_set(&self, request: ConfSetRequest) -> ConfSetResponse;
    fn conf_get(&self, request: ConfGetRequest) -> ConfGetResponse;
    fn connect_zk(&self, request: ConnectZkRequest) -> ConnectZkResponse;
    fn disconnect_zk(&self, request: DisconnectZkRequest) -> DisconnectZkResponse;
    fn set_table_partition(&self, request: SetTablePartitionRequest) -> SetTablePartitionResponse;
    fn get_table_partition(&self, request: GetTablePartitionRequest) -> GetTablePartitionResponse;
    fn update_table_alive_status(
        &self,
        request: UpdateTableAliveStatusRequest,
    ) -> UpdateTableAliveStatusResponse;
    fn cancel_op(&self, request: CancelOpRequest) -> CancelOpResponse;
    fn add_replica_cluster(&self, request: AddReplicaClusterRequest) -> AddReplicaClusterResponse;
    fn show_replica_cluster(&self, request: ShowReplicaClusterRequest) -> ShowReplicaClusterResponse;
    fn remove_replica_cluster(
        &self,
        request: RemoveReplicaClusterRequest,
    ) -> RemoveReplicaClusterResponse;
    fn switch_mode(&self, request: SwitchModeRequest) -> SwitchModeResponse;
    fn sync_table(&self, request: SyncTableRequest) -> SyncTableResponse;
    fn delete_index(&self, request: DeleteIndexRequest) -> DeleteIndexResponse;
    fn add_index(&self, request: AddIndexRequest) -> AddIndexResponse;
    fn add_table_field(&self, request: AddTableFieldRequest) -> AddTableFieldResponse;
    fn update_ttl(&self, request: UpdateTtlRequest) -> UpdateTtlResponse;
    fn load_table(&self, request: LoadTableRequest) -> LoadTableResponse;
}
