//! Replica-cluster registry subcommands.

use std::sync::Arc;

use anyhow::Result;

use tabletctl_coord::memory::MemoryBackend;
use tabletctl_rpc::*;
use tabletctl_server::NameServer;

use super::table::report;
use crate::table as render;

type Server = Arc<NameServer<MemoryBackend>>;

pub fn add(server: &Server, alias: String, zk_endpoints: String, zk_root_path: String) -> Result<()> {
    let response = server.add_replica_cluster(AddReplicaClusterRequest { alias, zk_endpoints, zk_root_path });
    report(&response.status)
}

pub fn show(server: &Server) -> Result<()> {
    let response = server.show_replica_cluster(ShowReplicaClusterRequest);
    if !response.status.is_ok() {
        return report(&response.status);
    }
    println!("{}", render::clusters(&response.clusters));
    Ok(())
}

pub fn remove(server: &Server, alias: String) -> Result<()> {
    let response = server.remove_replica_cluster(RemoveReplicaClusterRequest { alias });
    report(&response.status)
}

pub fn switch_mode(server: &Server, mode: ClusterMode) -> Result<()> {
    let response = server.switch_mode(SwitchModeRequest { mode });
    report(&response.status)
}
