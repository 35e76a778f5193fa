//! Replica placement and failover subcommands.

use std::sync::Arc;

use anyhow::Result;

use tabletctl_coord::memory::MemoryBackend;
use tabletctl_rpc::*;
use tabletctl_server::NameServer;
use tabletctl_types::Pid;

use super::table::{report, report_with_op};

type Server = Arc<NameServer<MemoryBackend>>;

pub fn add(server: &Server, table: String, pid: u32, endpoint: String) -> Result<()> {
    let response = server.add_replica_ns(AddReplicaNsRequest { table, pid: Pid::new(pid), endpoint: endpoint.into() });
    report_with_op(&response.status, response.op_id)
}

pub fn del(server: &Server, table: String, pid: u32, endpoint: String) -> Result<()> {
    let response = server.del_replica_ns(DelReplicaNsRequest { table, pid: Pid::new(pid), endpoint: endpoint.into() });
    report_with_op(&response.status, response.op_id)
}

pub fn change_leader(server: &Server, table: String, pid: u32, candidate: Option<String>) -> Result<()> {
    let response = server.change_leader(ChangeLeaderRequest {
        table,
        pid: Pid::new(pid),
        candidate: candidate.map(Into::into),
    });
    report_with_op(&response.status, response.op_id)
}

pub fn migrate(server: &Server, table: String, pid: u32, from: String, to: String) -> Result<()> {
    let response = server.migrate(MigrateRequest { table, pid: Pid::new(pid), from: from.into(), to: to.into() });
    report_with_op(&response.status, response.op_id)
}

pub fn offline_endpoint(server: &Server, endpoint: String) -> Result<()> {
    let response = server.offline_endpoint(OfflineEndpointRequest { endpoint: endpoint.into() });
    if !response.status.is_ok() {
        return report(&response.status);
    }
    print_op_ids(&response.op_ids);
    Ok(())
}

pub fn recover_endpoint(server: &Server, endpoint: String) -> Result<()> {
    let response = server.recover_endpoint(RecoverEndpointRequest { endpoint: endpoint.into() });
    if !response.status.is_ok() {
        return report(&response.status);
    }
    print_op_ids(&response.op_ids);
    Ok(())
}

pub fn recover_table(server: &Server, table: String, pid: u32, endpoint: String) -> Result<()> {
    let response =
        server.recover_table(RecoverTableRequest { table, pid: Pid::new(pid), endpoint: endpoint.into() });
    report_with_op(&response.status, response.op_id)
}

pub fn update_alive_status(server: &Server, table: String, pid: u32, endpoint: String, alive: bool) -> Result<()> {
    let response = server.update_table_alive_status(UpdateTableAliveStatusRequest {
        table,
        pid: Pid::new(pid),
        endpoint: endpoint.into(),
        is_alive: alive,
    });
    report(&response.status)
}

fn print_op_ids(op_ids: &[tabletctl_types::OpId]) {
    if op_ids.is_empty() {
        println!("ok (no ops submitted)");
        return;
    }
    for op_id in op_ids {
        println!("{op_id}");
    }
}
