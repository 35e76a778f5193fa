//! `TabletClient` / `BsClient`: tablet-facing RPCs the scheduler invokes
//! while executing a task. The tablet/blob-server process itself is
//! external; this crate only defines the call surface and, for tests, an
//! in-memory double that can be scripted to fail specific calls.

use tabletctl_types::{Endpoint, Pid};

/// Offsets and term reported by `GetTableStatus`, used by
/// `CheckBinlogSyncProgress` and replica-recovery OP selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStatus {
    pub term: u64,
    pub offset: u64,
}

/// Tablet-facing RPCs consumed by the scheduler (spec §6). Each method
/// corresponds 1:1 to a task primitive; the tablet side is expected to
/// de-dupe on (op_id, task_id) so a retried call after a crash is a
/// no-op success.
pub trait TabletClient: Send + Sync {
    fn load_table(&self, endpoint: &Endpoint, table: &str, pid: Pid) -> Result<(), String>;
    fn drop_table(&self, endpoint: &Endpoint, table: &str, pid: Pid) -> Result<(), String>;
    fn make_snapshot(&self, endpoint: &Endpoint, table: &str, pid: Pid) -> Result<(), String>;
    fn pause_snapshot(&self, endpoint: &Endpoint, table: &str, pid: Pid) -> Result<(), String>;
    fn recover_snapshot(&self, endpoint: &Endpoint, table: &str, pid: Pid) -> Result<(), String>;
    fn send_snapshot(
        &self,
        from: &Endpoint,
        to: &Endpoint,
        table: &str,
        pid: Pid,
    ) -> Result<(), String>;
    fn add_replica(
        &self,
        leader: &Endpoint,
        follower: &Endpoint,
        table: &str,
        pid: Pid,
    ) -> Result<(), String>;
    fn del_replica(&self, endpoint: &Endpoint, table: &str, pid: Pid) -> Result<(), String>;
    /// `ChangeRole`: flips the tablet-local leader/follower flag.
    fn change_role(&self, endpoint: &Endpoint, table: &str, pid: Pid, leader: bool) -> Result<(), String>;
    fn get_table_status(&self, endpoint: &Endpoint, table: &str, pid: Pid) -> Result<TableStatus, String>;
    fn update_ttl(&self, endpoint: &Endpoint, table: &str, pid: Pid) -> Result<(), String>;
    fn dump_index_data(
        &self,
        endpoint: &Endpoint,
        table: &str,
        pid: Pid,
        index_name: &str,
    ) -> Result<(), String>;
    fn send_index_data(
        &self,
        from: &Endpoint,
        to: &Endpoint,
        table: &str,
        pid: Pid,
    ) -> Result<(), String>;
    fn load_index_data(
        &self,
        endpoint: &Endpoint,
        table: &str,
        pid: Pid,
        index_name: &str,
    ) -> Result<(), String>;
    fn extract_index_data(
        &self,
        endpoint: &Endpoint,
        table: &str,
        pid: Pid,
        index_name: &str,
    ) -> Result<(), String>;
    fn add_index(
        &self,
        endpoint: &Endpoint,
        table: &str,
        pid: Pid,
        index_name: &str,
    ) -> Result<(), String>;
    fn check_binlog_sync_progress(
        &self,
        endpoint: &Endpoint,
        table: &str,
        pid: Pid,
        follower: &Endpoint,
        max_lag_offset: u64,
    ) -> Result<(), String>;
}
