//! OP-lifecycle subcommands.

use std::sync::Arc;

use anyhow::Result;

use tabletctl_coord::memory::MemoryBackend;
use tabletctl_rpc::*;
use tabletctl_server::NameServer;
use tabletctl_types::{OpId, Pid};

use super::table::{report, report_with_op};
use crate::table as render;

type Server = Arc<NameServer<MemoryBackend>>;

pub fn make_snapshot(server: &Server, table: String, pid: u32) -> Result<()> {
    let response = server.make_snapshot_ns(MakeSnapshotNsRequest { table, pid: Pid::new(pid) });
    report_with_op(&response.status, response.op_id)
}

pub fn show_status(server: &Server, table: Option<String>) -> Result<()> {
    let response = server.show_op_status(ShowOpStatusRequest { table });
    if !response.status.is_ok() {
        return report(&response.status);
    }
    println!("{}", render::ops(&response.ops));
    Ok(())
}

pub fn cancel(server: &Server, op_id: u64) -> Result<()> {
    let response = server.cancel_op(CancelOpRequest { op_id: OpId::new(op_id) });
    report(&response.status)
}
