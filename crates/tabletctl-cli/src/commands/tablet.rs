//! Tablet listing subcommand.

use std::sync::Arc;

use anyhow::Result;

use tabletctl_coord::memory::MemoryBackend;
use tabletctl_rpc::*;
use tabletctl_server::NameServer;

use super::table::report;
use crate::table as render;

type Server = Arc<NameServer<MemoryBackend>>;

pub fn show(server: &Server) -> Result<()> {
    let response = server.show_tablet(ShowTabletRequest);
    if !response.status.is_ok() {
        return report(&response.status);
    }
    println!("{}", render::tablets(&response.tablets));
    Ok(())
}
