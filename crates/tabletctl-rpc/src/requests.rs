//! Request/response structs for the admin operation bank (spec.md §4.8).
//! Each pair is a plain data carrier; wiring them to behavior is
//! [`crate::api::NameServerApi`].

use serde::{Deserialize, Serialize};

use tabletctl_types::{
    ColumnDesc, Endpoint, IndexDescriptor, Liveness, OpId, OpState, Pid, TableInfo, TtlConfig,
};

use crate::status::Status;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTableRequest {
    pub table: TableInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTableResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropTableRequest {
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropTableResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddReplicaNsRequest {
    pub table: String,
    pub pid: Pid,
    pub endpoint: Endpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddReplicaNsResponse {
    pub status: Status,
    pub op_id: Option<OpId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelReplicaNsRequest {
    pub table: String,
    pub pid: Pid,
    pub endpoint: Endpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelReplicaNsResponse {
    pub status: Status,
    pub op_id: Option<OpId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLeaderRequest {
    pub table: String,
    pub pid: Pid,
    /// Operator-supplied candidate preference; empty means let the
    /// scheduler pick from every alive replica.
    pub candidate: Option<Endpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLeaderResponse {
    pub status: Status,
    pub op_id: Option<OpId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateRequest {
    pub table: String,
    pub pid: Pid,
    pub from: Endpoint,
    pub to: Endpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateResponse {
    pub status: Status,
    pub op_id: Option<OpId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineEndpointRequest {
    pub endpoint: Endpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineEndpointResponse {
    pub status: Status,
    pub op_ids: Vec<OpId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverEndpointRequest {
    pub endpoint: Endpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverEndpointResponse {
    pub status: Status,
    pub op_ids: Vec<OpId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverTableRequest {
    pub table: String,
    pub pid: Pid,
    pub endpoint: Endpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverTableResponse {
    pub status: Status,
    pub op_id: Option<OpId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeSnapshotNsRequest {
    pub table: String,
    pub pid: Pid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeSnapshotNsResponse {
    pub status: Status,
    pub op_id: Option<OpId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowTableRequest {
    /// `None` lists every table.
    pub table: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowTableResponse {
    pub status: Status,
    pub tables: Vec<TableInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowTabletRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabletSummary {
    pub endpoint: Endpoint,
    pub state: Liveness,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowTabletResponse {
    pub status: Status,
    pub tablets: Vec<TabletSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowOpStatusRequest {
    /// `None` lists every OP still in the done/in-flight window.
    pub table: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpStatusSummary {
    pub op_id: OpId,
    pub table: String,
    pub pid: Pid,
    pub state: OpState,
    /// Type name and status of the last task that failed, if any.
    pub last_failed_task: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowOpStatusResponse {
    pub status: Status,
    pub ops: Vec<OpStatusSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfSetRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfSetResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfGetRequest {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfGetResponse {
    pub status: Status,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectZkRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectZkResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectZkRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectZkResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTablePartitionRequest {
    pub table: String,
    pub partition_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTablePartitionResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTablePartitionRequest {
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTablePartitionResponse {
    pub status: Status,
    pub partition_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTableAliveStatusRequest {
    pub table: String,
    pub pid: Pid,
    pub endpoint: Endpoint,
    pub is_alive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTableAliveStatusResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOpRequest {
    pub op_id: OpId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOpResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddReplicaClusterRequest {
    pub alias: String,
    pub zk_endpoints: String,
    pub zk_root_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddReplicaClusterResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowReplicaClusterRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaClusterSummary {
    pub alias: String,
    pub healthy: bool,
    pub term: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowReplicaClusterResponse {
    pub status: Status,
    pub clusters: Vec<ReplicaClusterSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveReplicaClusterRequest {
    pub alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveReplicaClusterResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterMode {
    Leader,
    Follower,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchModeRequest {
    pub mode: ClusterMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchModeResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncTableRequest {
    pub table: String,
    pub cluster_alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncTableResponse {
    pub status: Status,
    pub op_id: Option<OpId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteIndexRequest {
    pub table: String,
    pub index_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteIndexResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddIndexRequest {
    pub table: String,
    pub index: IndexDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddIndexResponse {
    pub status: Status,
    pub op_id: Option<OpId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTableFieldRequest {
    pub table: String,
    pub column: ColumnDesc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTableFieldResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTtlRequest {
    pub table: String,
    pub ttl: TtlConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTtlResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTableRequest {
    pub table: String,
    pub pid: Pid,
    pub endpoint: Endpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTableResponse {
    pub status: Status,
}
