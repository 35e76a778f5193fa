//! `CreateXxxOPTask`: deterministic task-list construction per
//! [`OpType`]. Each constructor turns an [`OpRequest`] into the ordered
//! `Vec<TaskArgs>` the scheduler will execute; `RecoverOPTask`
//! rehydrates the same list from a persisted OP body and overlays
//! persisted per-task statuses (see `runtime::recover_op`).

use tabletctl_types::{Endpoint, OpType, Pid, TaskArgs, Term};

/// Parameters for one OP submission, one variant per [`OpType`]. This is
/// the "OP body" spec.md refers to: everything `build_tasks` needs to
/// materialize the task list without any further lookups.
#[derive(Debug, Clone, PartialEq)]
pub enum OpRequest {
    CreateTable {
        table: String,
        pid: Pid,
        replicas: Vec<Endpoint>,
    },
    DropTable {
        table: String,
        pid: Pid,
        replicas: Vec<Endpoint>,
    },
    AddReplica {
        table: String,
        pid: Pid,
        leader: Endpoint,
        follower: Endpoint,
    },
    DelReplica {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
    },
    ChangeLeader {
        table: String,
        pid: Pid,
        candidates: Vec<Endpoint>,
        new_leader: Endpoint,
    },
    OfflineReplica {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
    },
    RecoverTable {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
    },
    Migrate {
        table: String,
        pid: Pid,
        from: Endpoint,
        to: Endpoint,
        leader: Endpoint,
    },
    MakeSnapshot {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
    },
    ReAddReplicaSimplify {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
        leader: Endpoint,
    },
    ReAddReplicaNoSend {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
        leader: Endpoint,
    },
    ReAddReplicaWithDrop {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
        leader: Endpoint,
    },
    ReLoadTable {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
    },
    UpdatePartitionStatus {
        table: String,
        pid: Pid,
        endpoint: Endpoint,
        is_leader: bool,
        is_alive: bool,
    },
    AddIndex {
        table: String,
        pid: Pid,
        endpoints: Vec<Endpoint>,
        index_name: String,
    },
    SyncTable {
        table: String,
        pid: Pid,
        cluster_alias: String,
    },
    CreateTableRemote {
        table: String,
        cluster_alias: String,
    },
    DropTableRemote {
        table: String,
        cluster_alias: String,
    },
    AddReplicaRemote {
        table: String,
        pid: Pid,
        cluster_alias: String,
        leader: Endpoint,
        follower: Endpoint,
        term: Term,
    },
    AddReplicaRemoteSimplify {
        table: String,
        pid: Pid,
        cluster_alias: String,
        leader: Endpoint,
        follower: Endpoint,
        term: Term,
    },
    DelReplicaRemote {
        table: String,
        pid: Pid,
        cluster_alias: String,
        endpoint: Endpoint,
    },
}

impl OpRequest {
    pub fn op_type(&self) -> OpType {
        match self {
            OpRequest::CreateTable { .. } => OpType::CreateTable,
            OpRequest::DropTable { .. } => OpType::DropTable,
            OpRequest::AddReplica { .. } => OpType::AddReplica,
            OpRequest::DelReplica { .. } => OpType::DelReplica,
            OpRequest::ChangeLeader { .. } => OpType::ChangeLeader,
            OpRequest::OfflineReplica { .. } => OpType::OfflineReplica,
            OpRequest::RecoverTable { .. } => OpType::RecoverTable,
            OpRequest::Migrate { .. } => OpType::Migrate,
            OpRequest::MakeSnapshot { .. } => OpType::MakeSnapshot,
            OpRequest::ReAddReplicaSimplify { .. } => OpType::ReAddReplicaSimplify,
            OpRequest::ReAddReplicaNoSend { .. } => OpType::ReAddReplicaNoSend,
            OpRequest::ReAddReplicaWithDrop { .. } => OpType::ReAddReplicaWithDrop,
            OpRequest::ReLoadTable { .. } => OpType::ReLoadTable,
            OpRequest::UpdatePartitionStatus { .. } => OpType::UpdatePartitionStatus,
            OpRequest::AddIndex { .. } => OpType::AddIndex,
            OpRequest::SyncTable { .. } => OpType::SyncTable,
            OpRequest::CreateTableRemote { .. } => OpType::CreateTableRemote,
            OpRequest::DropTableRemote { .. } => OpType::DropTableRemote,
            OpRequest::AddReplicaRemote { .. } => OpType::AddReplicaRemote,
            OpRequest::AddReplicaRemoteSimplify { .. } => OpType::AddReplicaRemoteSimplify,
            OpRequest::DelReplicaRemote { .. } => OpType::DelReplicaRemote,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            OpRequest::CreateTable { table, .. }
            | OpRequest::DropTable { table, .. }
            | OpRequest::AddReplica { table, .. }
            | OpRequest::DelReplica { table, .. }
            | OpRequest::ChangeLeader { table, .. }
            | OpRequest::OfflineReplica { table, .. }
            | OpRequest::RecoverTable { table, .. }
            | OpRequest::Migrate { table, .. }
            | OpRequest::MakeSnapshot { table, .. }
            | OpRequest::ReAddReplicaSimplify { table, .. }
            | OpRequest::ReAddReplicaNoSend { table, .. }
            | OpRequest::ReAddReplicaWithDrop { table, .. }
            | OpRequest::ReLoadTable { table, .. }
            | OpRequest::UpdatePartitionStatus { table, .. }
            | OpRequest::AddIndex { table, .. }
            | OpRequest::SyncTable { table, .. }
            | OpRequest::CreateTableRemote { table, .. }
            | OpRequest::DropTableRemote { table, .. }
            | OpRequest::AddReplicaRemote { table, .. }
            | OpRequest::AddReplicaRemoteSimplify { table, .. }
            | OpRequest::DelReplicaRemote { table, .. } => table,
        }
    }

    pub fn pid(&self) -> Pid {
        match self {
            OpRequest::CreateTableRemote { .. } | OpRequest::DropTableRemote { .. } => Pid::INVALID,
            OpRequest::CreateTable { pid, .. }
            | OpRequest::DropTable { pid, .. }
            | OpRequest::AddReplica { pid, .. }
            | OpRequest::DelReplica { pid, .. }
            | OpRequest::ChangeLeader { pid, .. }
            | OpRequest::OfflineReplica { pid, .. }
            | OpRequest::RecoverTable { pid, .. }
            | OpRequest::Migrate { pid, .. }
            | OpRequest::MakeSnapshot { pid, .. }
            | OpRequest::ReAddReplicaSimplify { pid, .. }
            | OpRequest::ReAddReplicaNoSend { pid, .. }
            | OpRequest::ReAddReplicaWithDrop { pid, .. }
            | OpRequest::ReLoadTable { pid, .. }
            | OpRequest::UpdatePartitionStatus { pid, .. }
            | OpRequest::AddIndex { pid, .. }
            | OpRequest::SyncTable { pid, .. }
            | OpRequest::AddReplicaRemote { pid, .. }
            | OpRequest::AddReplicaRemoteSimplify { pid, .. }
            | OpRequest::DelReplicaRemote { pid, .. } => *pid,
        }
    }
}

/// Materializes the ordered task list for an OP body. Deterministic:
/// calling this twice with the same request produces the same list,
/// which is what lets `RecoverOPTask` rebuild it purely from the
/// persisted `OpRequest` plus overlaid per-task statuses.
pub fn build_tasks(request: &OpRequest) -> Vec<TaskArgs> {
    match request.clone() {
        OpRequest::CreateTable { table, pid, replicas } => replicas
            .into_iter()
            .flat_map(|endpoint| {
                [
                    TaskArgs::LoadTable {
                        endpoint: endpoint.clone(),
                        table: table.clone(),
                        pid,
                    },
                    TaskArgs::AddTableInfo {
                        table: table.clone(),
                        pid,
                        endpoint,
                    },
                ]
            })
            .collect(),

        OpRequest::DropTable { table, pid, replicas } => replicas
            .into_iter()
            .flat_map(|endpoint| {
                [
                    TaskArgs::DropTable {
                        endpoint: endpoint.clone(),
                        table: table.clone(),
                        pid,
                    },
                    TaskArgs::DelTableInfo {
                        table: table.clone(),
                        pid,
                        endpoint,
                    },
                ]
            })
            .collect(),

        OpRequest::AddReplica { table, pid, leader, follower } => vec![
            TaskArgs::AddReplica {
                leader,
                follower: follower.clone(),
                table: table.clone(),
                pid,
            },
            TaskArgs::AddTableInfo { table, pid, endpoint: follower },
        ],

        OpRequest::DelReplica { table, pid, endpoint } => vec![
            TaskArgs::DelReplica { endpoint: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::DelTableInfo { table, pid, endpoint },
        ],

        OpRequest::ChangeLeader { table, pid, candidates, new_leader } => vec![
            TaskArgs::SelectLeader { table: table.clone(), pid, candidates },
            TaskArgs::ChangeLeader { table: table.clone(), pid, new_leader: new_leader.clone() },
            TaskArgs::UpdateLeaderInfo { table, pid, new_leader },
        ],

        OpRequest::OfflineReplica { table, pid, endpoint } => vec![TaskArgs::UpdatePartitionStatus {
            table,
            pid,
            endpoint,
            is_leader: false,
            is_alive: false,
        }],

        OpRequest::RecoverTable { table, pid, endpoint } => vec![
            TaskArgs::RecoverTable { table: table.clone(), pid, endpoint: endpoint.clone() },
            TaskArgs::UpdatePartitionStatus {
                table,
                pid,
                endpoint,
                is_leader: false,
                is_alive: true,
            },
        ],

        OpRequest::Migrate { table, pid, from, to, leader } => vec![
            TaskArgs::AddReplica { leader: leader.clone(), follower: to.clone(), table: table.clone(), pid },
            TaskArgs::AddTableInfo { table: table.clone(), pid, endpoint: to },
            TaskArgs::DelReplica { endpoint: from.clone(), table: table.clone(), pid },
            TaskArgs::DelTableInfo { table, pid, endpoint: from },
        ],

        OpRequest::MakeSnapshot { table, pid, endpoint } => vec![
            TaskArgs::PauseSnapshot { endpoint: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::MakeSnapshot { endpoint: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::RecoverSnapshot { endpoint, table, pid },
        ],

        OpRequest::ReAddReplicaSimplify { table, pid, endpoint, leader } => vec![
            TaskArgs::AddReplica { leader, follower: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::UpdatePartitionStatus {
                table,
                pid,
                endpoint,
                is_leader: false,
                is_alive: true,
            },
        ],

        OpRequest::ReAddReplicaNoSend { table, pid, endpoint, leader } => vec![
            TaskArgs::SendSnapshot { from: leader.clone(), to: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::LoadTable { endpoint: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::AddReplica { leader, follower: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::UpdatePartitionStatus {
                table,
                pid,
                endpoint,
                is_leader: false,
                is_alive: true,
            },
        ],

        OpRequest::ReAddReplicaWithDrop { table, pid, endpoint, leader } => vec![
            TaskArgs::DropTable { endpoint: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::SendSnapshot { from: leader.clone(), to: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::LoadTable { endpoint: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::AddReplica { leader, follower: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::UpdatePartitionStatus {
                table,
                pid,
                endpoint,
                is_leader: false,
                is_alive: true,
            },
        ],

        OpRequest::ReLoadTable { table, pid, endpoint } => vec![TaskArgs::LoadTable { endpoint, table, pid }],

        OpRequest::UpdatePartitionStatus { table, pid, endpoint, is_leader, is_alive } => {
            vec![TaskArgs::UpdatePartitionStatus { table, pid, endpoint, is_leader, is_alive }]
        }

        OpRequest::AddIndex { table, pid, endpoints, index_name } => endpoints
            .into_iter()
            .map(|endpoint| TaskArgs::AddIndexToTablet {
                endpoint,
                table: table.clone(),
                pid,
                index_name: index_name.clone(),
            })
            .collect(),

        OpRequest::SyncTable { table, pid, cluster_alias } => {
            vec![TaskArgs::TableSync { cluster_alias, table, pid }]
        }

        OpRequest::CreateTableRemote { table, cluster_alias } => {
            vec![TaskArgs::CreateTableRemote { cluster_alias, table }]
        }

        OpRequest::DropTableRemote { table, cluster_alias } => {
            vec![TaskArgs::DropTableRemote { cluster_alias, table }]
        }

        OpRequest::AddReplicaRemote { table, pid, cluster_alias, leader, follower, term } => vec![
            TaskArgs::AddReplicaNsRemote { cluster_alias: cluster_alias.clone(), table: table.clone(), pid, term },
            TaskArgs::AddReplicaRemote { cluster_alias, leader, follower, table, pid },
        ],

        OpRequest::AddReplicaRemoteSimplify { table, pid, cluster_alias, leader, follower, term } => vec![
            TaskArgs::AddReplicaNsRemote { cluster_alias: cluster_alias.clone(), table: table.clone(), pid, term },
            TaskArgs::AddReplicaRemote { cluster_alias, leader, follower, table, pid },
        ],

        OpRequest::DelReplicaRemote { table, pid, cluster_alias, endpoint } => vec![
            TaskArgs::DelReplica { endpoint: endpoint.clone(), table: table.clone(), pid },
            TaskArgs::DelTableInfo { table: table.clone(), pid, endpoint },
            TaskArgs::TableSync { cluster_alias, table, pid },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_table_builds_load_then_add_table_info_per_replica() {
        let request = OpRequest::CreateTable {
            table: "t".into(),
            pid: Pid::new(0),
            replicas: vec![Endpoint::new("a:9527"), Endpoint::new("b:9527")],
        };
        let tasks = build_tasks(&request);
        assert_eq!(tasks.len(), 4);
        assert!(matches!(tasks[0], TaskArgs::LoadTable { .. }));
        assert!(matches!(tasks[1], TaskArgs::AddTableInfo { .. }));
    }

    #[test]
    fn change_leader_is_select_then_change_then_update() {
        let request = OpRequest::ChangeLeader {
            table: "t".into(),
            pid: Pid::new(0),
            candidates: vec![Endpoint::new("a:9527")],
            new_leader: Endpoint::new("a:9527"),
        };
        let tasks = build_tasks(&request);
        assert!(matches!(tasks[0], TaskArgs::SelectLeader { .. }));
        assert!(matches!(tasks[1], TaskArgs::ChangeLeader { .. }));
        assert!(matches!(tasks[2], TaskArgs::UpdateLeaderInfo { .. }));
    }

    #[test]
    fn build_tasks_is_deterministic() {
        let request = OpRequest::MakeSnapshot {
            table: "t".into(),
            pid: Pid::new(1),
            endpoint: Endpoint::new("a:9527"),
        };
        assert_eq!(build_tasks(&request), build_tasks(&request));
    }
}
