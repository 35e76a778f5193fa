//! Coordination-service session subcommands.

use std::sync::Arc;

use anyhow::Result;

use tabletctl_coord::memory::MemoryBackend;
use tabletctl_rpc::*;
use tabletctl_server::NameServer;

use super::table::report;

type Server = Arc<NameServer<MemoryBackend>>;

pub fn connect(server: &Server) -> Result<()> {
    let response = server.connect_zk(ConnectZkRequest);
    report(&response.status)
}

pub fn disconnect(server: &Server) -> Result<()> {
    let response = server.disconnect_zk(DisconnectZkRequest);
    report(&response.status)
}
