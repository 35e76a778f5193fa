//! Task execution: a single `match` on [`TaskArgs`] rather than a
//! captured callback graph (design note: "function-dispatch table, not
//! deep callback graph"). Each arm either calls through
//! [`TabletClient`]/[`NsClient`]-shaped collaborators or mutates the
//! catalog directly.

use tabletctl_catalog::CatalogStore;
use tabletctl_coord::CoordBackend;
use tabletctl_types::{Replica, TaskArgs};
use tracing::warn;

use crate::error::{Result, SchedulerError};
use crate::tablet_client::TabletClient;

fn rpc_err(endpoint: &tabletctl_types::Endpoint) -> impl Fn(String) -> SchedulerError + '_ {
    move |message| SchedulerError::TabletRpc {
        endpoint: endpoint.as_str().to_string(),
        message,
    }
}

/// Executes one task's side effect. Re-entrant at the call site: the
/// tablet side is expected to de-dupe on (op_id, task_id), so retrying a
/// task whose tablet-side effect already landed is expected to succeed.
pub fn execute_task<B: CoordBackend>(
    args: &TaskArgs,
    tablet_client: &dyn TabletClient,
    catalog: &CatalogStore<B>,
) -> Result<()> {
    match args {
        TaskArgs::MakeSnapshot { endpoint, table, pid } => tablet_client
            .make_snapshot(endpoint, table, *pid)
            .map_err(rpc_err(endpoint)),
        TaskArgs::PauseSnapshot { endpoint, table, pid } => tablet_client
            .pause_snapshot(endpoint, table, *pid)
            .map_err(rpc_err(endpoint)),
        TaskArgs::RecoverSnapshot { endpoint, table, pid } => tablet_client
            .recover_snapshot(endpoint, table, *pid)
            .map_err(rpc_err(endpoint)),
        TaskArgs::SendSnapshot { from, to, table, pid } => tablet_client
            .send_snapshot(from, to, table, *pid)
            .map_err(rpc_err(from)),
        TaskArgs::LoadTable { endpoint, table, pid } => tablet_client
            .load_table(endpoint, table, *pid)
            .map_err(rpc_err(endpoint)),
        TaskArgs::LoadTableRemote { endpoint, table, pid, .. } => tablet_client
            .load_table(endpoint, table, *pid)
            .map_err(rpc_err(endpoint)),
        TaskArgs::AddReplica { leader, follower, table, pid } => tablet_client
            .add_replica(leader, follower, table, *pid)
            .map_err(rpc_err(leader)),
        TaskArgs::AddReplicaRemote { leader, follower, table, pid, .. } => tablet_client
            .add_replica(leader, follower, table, *pid)
            .map_err(rpc_err(leader)),
        TaskArgs::AddReplicaNsRemote { table, pid, .. } => {
            warn!(%table, %pid, "AddReplicaNSRemote requires a peer-name-server handshake; handled by the registry, not the tablet path");
            Ok(())
        }
        TaskArgs::AddTableInfo { table, pid, endpoint } => {
            catalog
                .update_table_info(table, |info| {
                    if let Some(partition) = info.partitions.iter_mut().find(|p| p.pid == *pid) {
                        if partition.replica(endpoint).is_none() {
                            partition.replicas.push(Replica::new_follower(endpoint.clone()));
                        }
                    }
                })
                .map_err(SchedulerError::from)?;
            Ok(())
        }
        TaskArgs::DelReplica { endpoint, table, pid } => tablet_client
            .del_replica(endpoint, table, *pid)
            .map_err(rpc_err(endpoint)),
        TaskArgs::DelTableInfo { table, pid, endpoint } => {
            catalog
                .update_table_info(table, |info| {
                    if let Some(partition) = info.partitions.iter_mut().find(|p| p.pid == *pid) {
                        partition.replicas.retain(|r| &r.endpoint != endpoint);
                    }
                })
                .map_err(SchedulerError::from)?;
            Ok(())
        }
        TaskArgs::UpdateTableInfo { table, expected_version: _ } => {
            catalog.update_table_info(table, |_| {}).map_err(SchedulerError::from)?;
            Ok(())
        }
        TaskArgs::UpdatePartitionStatus { table, pid, endpoint, is_leader, is_alive } => {
            catalog
                .update_partition_status(table, *pid, endpoint, *is_leader, *is_alive)
                .map_err(SchedulerError::from)?;
            Ok(())
        }
        TaskArgs::SelectLeader { table, pid, candidates } => {
            for candidate in candidates {
                tablet_client
                    .get_table_status(candidate, table, *pid)
                    .map_err(rpc_err(candidate))?;
            }
            Ok(())
        }
        TaskArgs::ChangeLeader { table, pid, new_leader } => tablet_client
            .change_role(new_leader, table, *pid, true)
            .map_err(rpc_err(new_leader)),
        TaskArgs::UpdateLeaderInfo { table, pid, new_leader } => {
            catalog
                .update_table_info(table, |info| {
                    if let Some(partition) = info.partitions.iter_mut().find(|p| p.pid == *pid) {
                        partition.term = partition.term.next();
                        for replica in &mut partition.replicas {
                            replica.is_leader = replica.endpoint == *new_leader;
                        }
                    }
                })
                .map_err(SchedulerError::from)?;
            Ok(())
        }
        TaskArgs::CheckBinlogSyncProgress { endpoint, table, pid, follower, max_lag_offset } => tablet_client
            .check_binlog_sync_progress(endpoint, table, *pid, follower, *max_lag_offset)
            .map_err(rpc_err(endpoint)),
        TaskArgs::DropTable { endpoint, table, pid } => tablet_client
            .drop_table(endpoint, table, *pid)
            .map_err(rpc_err(endpoint)),
        TaskArgs::RecoverTable { table, pid, endpoint } => tablet_client
            .load_table(endpoint, table, *pid)
            .map_err(rpc_err(endpoint)),
        TaskArgs::CreateTableRemote { table, .. } | TaskArgs::DropTableRemote { table, .. } => {
            warn!(%table, "remote table lifecycle task requires the peer-name-server RPC path, not the tablet path");
            Ok(())
        }
        TaskArgs::DumpIndexData { endpoint, table, pid, index_name } => tablet_client
            .dump_index_data(endpoint, table, *pid, index_name)
            .map_err(rpc_err(endpoint)),
        TaskArgs::SendIndexData { from, to, table, pid } => tablet_client
            .send_index_data(from, to, table, *pid)
            .map_err(rpc_err(from)),
        TaskArgs::LoadIndexData { endpoint, table, pid, index_name } => tablet_client
            .load_index_data(endpoint, table, *pid, index_name)
            .map_err(rpc_err(endpoint)),
        TaskArgs::ExtractIndexData { endpoint, table, pid, index_name } => tablet_client
            .extract_index_data(endpoint, table, *pid, index_name)
            .map_err(rpc_err(endpoint)),
        TaskArgs::AddIndexToTablet { endpoint, table, pid, index_name } => tablet_client
            .add_index(endpoint, table, *pid, index_name)
            .map_err(rpc_err(endpoint)),
        TaskArgs::TableSync { table, pid, .. } => {
            warn!(%table, %pid, "TableSync requires the peer-name-server RPC path, not the tablet path");
            Ok(())
        }
    }
}
